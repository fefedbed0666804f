// Everything that crosses from the sequencer thread to the audio thread goes
// through here. Once a SynthEvent is handed to a ClockSource it is fire and
// forget: nothing on this side can retract it.

use thiserror::Error;

use crate::audio::ramp;

pub use crate::audio::StereoFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// One sample of the waveform at `phase`, where a full cycle is `0.0..1.0`.
    pub fn sample(self, phase: f32) -> f32 {
        let p = phase - phase.floor();
        match self {
            Waveform::Sine => (std::f32::consts::TAU * p).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                if p < 0.5 { 1.0 } else { -1.0 }
            }
            Waveform::Sawtooth => 2.0 * p - 1.0,
        }
    }
}

/// Frequency over the lifetime of one event, in Hz.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrequencyProgram {
    Constant(f32),
    // exponential glide, holds `end` once `duration` has elapsed
    Sweep { start: f32, end: f32, duration: f64 },
}

impl FrequencyProgram {
    pub fn value_at(&self, elapsed: f64) -> f32 {
        match *self {
            FrequencyProgram::Constant(freq) => freq,
            FrequencyProgram::Sweep { start, end, duration } => {
                ramp::exponential(start, end, duration, elapsed)
            }
        }
    }
}

/// Gain over the lifetime of one event: `level` at the start, decaying
/// exponentially to `floor` over `decay` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmplitudeProgram {
    pub level: f32,
    pub floor: f32,
    pub decay: f64,
}

impl AmplitudeProgram {
    // what every kit voice decays towards
    pub const SILENCE_FLOOR: f32 = 0.001;

    pub fn decaying(level: f32, decay: f64) -> Self {
        Self { level, floor: Self::SILENCE_FLOOR, decay }
    }

    pub fn value_at(&self, elapsed: f64) -> f32 {
        ramp::exponential(self.level, self.floor, self.decay, elapsed)
    }
}

/// One discrete sound: starts at `start` on the audio clock and is retired
/// after exactly `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthEvent {
    pub track: usize,
    pub waveform: Waveform,
    pub frequency: FrequencyProgram,
    pub amplitude: AmplitudeProgram,
    pub start: f64,
    pub duration: f64,
}

impl SynthEvent {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    Schedule(SynthEvent),
    SetTrackGain { track: usize, gain: f32 },
    SetMasterGain(f32),
}

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("audio clock unavailable: {0}")]
    Unavailable(String),
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// The audio-domain clock, plus the only way to make sound: hand it an
/// event with an absolute start time.
pub trait ClockSource {
    /// Current audio time in seconds. Monotonic, only advances while running.
    fn now(&self) -> f64;

    fn is_running(&self) -> bool;

    /// Ask a suspended clock to run. A no-op when already running.
    fn resume(&mut self) -> Result<(), ClockError>;

    fn schedule_event(&mut self, event: SynthEvent);
}

/// The gain stages after the voices: one per track, then the master.
pub trait MixBus {
    fn set_track_gain(&mut self, track: usize, gain: f32);
    fn set_master_gain(&mut self, gain: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveforms_hit_their_extremes() {
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.0), -1.0);
        assert_eq!(Waveform::Square.sample(0.1), 1.0);
        assert_eq!(Waveform::Square.sample(0.9), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
    }

    #[test]
    fn phase_wraps() {
        assert_eq!(Waveform::Square.sample(1.1), Waveform::Square.sample(0.1));
    }

    #[test]
    fn sweep_holds_end_value() {
        let sweep = FrequencyProgram::Sweep { start: 400.0, end: 100.0, duration: 0.1 };
        assert_eq!(sweep.value_at(0.0), 400.0);
        assert_eq!(sweep.value_at(0.5), 100.0);
        // halfway through an exponential glide is the geometric mean
        assert!((sweep.value_at(0.05) - 200.0).abs() < 0.01);
    }

    #[test]
    fn amplitude_decays_to_floor() {
        let amp = AmplitudeProgram::decaying(0.1, 0.05);
        assert_eq!(amp.value_at(0.0), 0.1);
        assert!(amp.value_at(0.025) < 0.1);
        assert_eq!(amp.value_at(0.05), AmplitudeProgram::SILENCE_FLOOR);
    }
}
