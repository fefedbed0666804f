use crate::audio_api::{AudioCommand, SynthEvent};
use crate::shared::{DEFAULT_MASTER_VOLUME, NUM_TRACKS};

use super::frame::StereoFrame;
use super::voice::Voice;

// hard caps so we wont malloc in the audio callback
pub const MAX_VOICES: usize = 32;
pub const MAX_PENDING: usize = 128;

// Renders scheduled SynthEvents. The number of frames rendered so far *is*
// the audio clock: an event starts on the first frame at or after its start
// time, so timing is sample accurate no matter when the command arrived.
pub struct Engine {
    sample_rate: f64,
    frame_pos: u64,
    pending: [Option<PendingEvent>; MAX_PENDING], // waiting for their start frame
    voices: [Voice; MAX_VOICES],                  // fixed pool of voices
    track_gains: [f32; NUM_TRACKS],
    master_gain: f32,
    late_starts: u64,
    dropped: u64,
}

#[derive(Clone, Copy, Debug)]
struct PendingEvent {
    start_frame: u64,
    event: SynthEvent,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            frame_pos: 0,
            pending: [None; MAX_PENDING],
            voices: [Voice::silent(); MAX_VOICES],
            track_gains: [1.0; NUM_TRACKS],
            master_gain: DEFAULT_MASTER_VOLUME,
            late_starts: 0,
            dropped: 0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn frame_pos(&self) -> u64 {
        self.frame_pos
    }

    pub fn now(&self) -> f64 {
        self.frame_pos as f64 / self.sample_rate
    }

    /// Events that arrived after their start time and were started late.
    pub fn late_starts(&self) -> u64 {
        self.late_starts
    }

    /// Events thrown away because the pending queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.iter().filter(|p| p.is_some()).count()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Schedule(event) => self.schedule(event),
            AudioCommand::SetTrackGain { track, gain } => {
                if let Some(g) = self.track_gains.get_mut(track) {
                    *g = gain.clamp(0.0, 1.0);
                }
            }
            AudioCommand::SetMasterGain(gain) => self.master_gain = gain.clamp(0.0, 1.0),
        }
    }

    fn schedule(&mut self, event: SynthEvent) {
        let requested = (event.start.max(0.0) * self.sample_rate).round() as u64;
        // a start time that already slipped behind the clock plays right away
        let start_frame = if requested < self.frame_pos {
            self.late_starts += 1;
            self.frame_pos
        } else {
            requested
        };

        match self.pending.iter_mut().find(|p| p.is_none()) {
            Some(slot) => *slot = Some(PendingEvent { start_frame, event }),
            None => self.dropped += 1,
        }
    }

    fn start_due_events(&mut self) {
        for slot in self.pending.iter_mut() {
            let due = matches!(slot, Some(p) if p.start_frame <= self.frame_pos);
            if !due {
                continue;
            }
            if let Some(p) = slot.take() {
                // what voice do we write to? steal the one closest to done if all are busy
                let idx = self
                    .voices
                    .iter()
                    .position(|v| !v.active)
                    .unwrap_or_else(|| quietest_voice(&self.voices));
                self.voices[idx] = Voice::from_event(&p.event, self.sample_rate);
            }
        }
    }

    pub fn next_frame(&mut self) -> StereoFrame {
        self.start_due_events();

        let mut buses = [0.0f32; NUM_TRACKS];
        for v in self.voices.iter_mut().filter(|v| v.active) {
            let s = v.next_sample(self.sample_rate);
            if let Some(bus) = buses.get_mut(v.track) {
                *bus += s;
            }
        }

        let mixed: f32 = buses
            .iter()
            .zip(self.track_gains.iter())
            .map(|(bus, gain)| bus * gain)
            .sum();

        self.frame_pos += 1;
        StereoFrame::mono(mixed * self.master_gain)
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = self.next_frame();
        }
    }
}

fn quietest_voice(voices: &[Voice; MAX_VOICES]) -> usize {
    voices
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.remaining_frames())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::{AmplitudeProgram, FrequencyProgram, Waveform};

    const SR: u32 = 1000;

    fn square(track: usize, start: f64, duration: f64) -> SynthEvent {
        SynthEvent {
            track,
            waveform: Waveform::Square,
            frequency: FrequencyProgram::Constant(50.0),
            amplitude: AmplitudeProgram { level: 0.5, floor: 0.5, decay: duration },
            start,
            duration,
        }
    }

    fn render(engine: &mut Engine, frames: usize) -> Vec<StereoFrame> {
        let mut out = vec![StereoFrame::zero(); frames];
        engine.render_block(&mut out);
        out
    }

    #[test]
    fn starts_on_the_exact_frame() {
        let mut engine = Engine::new(SR);
        engine.handle_cmd(AudioCommand::SetMasterGain(1.0));
        engine.handle_cmd(AudioCommand::Schedule(square(0, 0.010, 0.005)));

        let out = render(&mut engine, 30);
        assert!(out[..10].iter().all(|f| f.peak() == 0.0));
        assert!(out[10..15].iter().all(|f| f.peak() == 0.5));
        assert!(out[15..].iter().all(|f| f.peak() == 0.0));
        assert_eq!(engine.active_voices(), 0);
        assert_eq!(engine.pending_events(), 0);
    }

    #[test]
    fn clock_counts_rendered_frames() {
        let mut engine = Engine::new(SR);
        render(&mut engine, 250);
        assert_eq!(engine.frame_pos(), 250);
        assert!((engine.now() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn late_event_plays_immediately() {
        let mut engine = Engine::new(SR);
        engine.handle_cmd(AudioCommand::SetMasterGain(1.0));
        render(&mut engine, 100);
        engine.handle_cmd(AudioCommand::Schedule(square(1, 0.050, 0.003)));
        assert_eq!(engine.late_starts(), 1);

        let out = render(&mut engine, 5);
        assert_eq!(out[0].peak(), 0.5);
        assert_eq!(out[3].peak(), 0.0);
    }

    #[test]
    fn track_and_master_gain_apply() {
        let mut engine = Engine::new(SR);
        engine.handle_cmd(AudioCommand::SetMasterGain(0.5));
        engine.handle_cmd(AudioCommand::SetTrackGain { track: 3, gain: 0.0 });
        engine.handle_cmd(AudioCommand::Schedule(square(3, 0.0, 0.01)));
        engine.handle_cmd(AudioCommand::Schedule(square(4, 0.0, 0.01)));

        let out = render(&mut engine, 1);
        // only track 4 is audible: 0.5 level * 0.5 master
        assert_eq!(out[0].left, 0.25);
        assert_eq!(out[0].left, out[0].right);
    }

    #[test]
    fn full_queue_drops_instead_of_allocating() {
        let mut engine = Engine::new(SR);
        for _ in 0..MAX_PENDING + 3 {
            engine.handle_cmd(AudioCommand::Schedule(square(0, 10.0, 0.01)));
        }
        assert_eq!(engine.pending_events(), MAX_PENDING);
        assert_eq!(engine.dropped(), 3);
    }

    #[test]
    fn voice_stealing_when_pool_is_full() {
        let mut engine = Engine::new(SR);
        for _ in 0..MAX_VOICES + 1 {
            engine.handle_cmd(AudioCommand::Schedule(square(0, 0.0, 1.0)));
        }
        render(&mut engine, 1);
        assert_eq!(engine.active_voices(), MAX_VOICES);
        assert_eq!(engine.pending_events(), 0);
    }
}
