use crate::audio_api::{AmplitudeProgram, FrequencyProgram, SynthEvent, Waveform};

// One sounding SynthEvent: an oscillator shaped by its amplitude program.
// Lives for exactly `length` frames and then switches itself off.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub track: usize,
    pub active: bool,
    waveform: Waveform,
    frequency: FrequencyProgram,
    amplitude: AmplitudeProgram,
    phase: f32,   // 0.0 .. 1.0, one oscillator cycle
    elapsed: u64, // frames rendered so far
    length: u64,  // total frames this voice sounds for
}

impl Voice {
    pub const fn silent() -> Self {
        Self {
            track: 0,
            active: false,
            waveform: Waveform::Sine,
            frequency: FrequencyProgram::Constant(0.0),
            amplitude: AmplitudeProgram { level: 0.0, floor: 0.0, decay: 0.0 },
            phase: 0.0,
            elapsed: 0,
            length: 0,
        }
    }

    pub fn from_event(event: &SynthEvent, sample_rate: f64) -> Self {
        let length = (event.duration.max(0.0) * sample_rate).round() as u64;
        Self {
            track: event.track,
            active: length > 0,
            waveform: event.waveform,
            frequency: event.frequency,
            amplitude: event.amplitude,
            phase: 0.0,
            elapsed: 0,
            length,
        }
    }

    /// Render one sample and move on. Returns silence once the voice is done.
    pub fn next_sample(&mut self, sample_rate: f64) -> f32 {
        if !self.active {
            return 0.0;
        }
        let t = self.elapsed as f64 / sample_rate;
        let freq = self.frequency.value_at(t);
        let gain = self.amplitude.value_at(t);
        let out = self.waveform.sample(self.phase) * gain;

        self.phase += (freq as f64 / sample_rate) as f32;
        self.phase -= self.phase.floor();

        self.elapsed += 1;
        if self.elapsed >= self.length {
            self.active = false;
        }
        out
    }

    pub fn remaining_frames(&self) -> u64 {
        self.length.saturating_sub(self.elapsed)
    }
}
