// Test doubles for the audio side of the seam.

use crate::audio_api::{ClockError, ClockSource, MixBus, SynthEvent};
use crate::shared::NUM_TRACKS;

#[derive(Debug)]
pub struct MockClock {
    pub now: f64,
    pub running: bool,
    pub fail_resume: bool,
    pub resumes: usize,
    pub events: Vec<SynthEvent>,
    pub track_gains: [f32; NUM_TRACKS],
    pub master_gain: f32,
}

impl MockClock {
    /// A running clock sitting at `now`.
    pub fn at(now: f64) -> Self {
        Self {
            now,
            running: true,
            fail_resume: false,
            resumes: 0,
            events: Vec::new(),
            track_gains: [1.0; NUM_TRACKS],
            master_gain: 1.0,
        }
    }

    pub fn suspended(now: f64) -> Self {
        Self { running: false, ..Self::at(now) }
    }

    pub fn advance(&mut self, secs: f64) {
        self.now += secs;
    }
}

impl ClockSource for MockClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<(), ClockError> {
        self.resumes += 1;
        if self.fail_resume {
            return Err(ClockError::Unavailable("mock device refused to start".into()));
        }
        self.running = true;
        Ok(())
    }

    fn schedule_event(&mut self, event: SynthEvent) {
        self.events.push(event);
    }
}

impl MixBus for MockClock {
    fn set_track_gain(&mut self, track: usize, gain: f32) {
        self.track_gains[track] = gain;
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }
}
