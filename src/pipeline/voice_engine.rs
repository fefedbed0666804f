// Turns "track N of kit K at time T" into one SynthEvent on the clock source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::audio_api::{AmplitudeProgram, ClockSource, FrequencyProgram, SynthEvent};
use crate::shared::NUM_TRACKS;

use super::kit::{resolve_kit, PitchMode, VoiceDescriptor, PENTATONIC_SCALE};
use super::pattern::MuteState;

pub struct VoiceEngine<R = StdRng> {
    rng: R, // only the random-pitch voices use it
}

impl VoiceEngine<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for VoiceEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> VoiceEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Build the event a descriptor produces when triggered at `start`.
    pub fn event_for(&mut self, track: usize, voice: &VoiceDescriptor, start: f64) -> SynthEvent {
        let frequency = match voice.pitch {
            PitchMode::Fixed(freq) => FrequencyProgram::Constant(freq),
            PitchMode::Sweep { start, end, duration } => {
                FrequencyProgram::Sweep { start, end, duration }
            }
            PitchMode::RandomFromScale => {
                let idx = self.rng.random_range(0..PENTATONIC_SCALE.len());
                FrequencyProgram::Constant(PENTATONIC_SCALE[idx])
            }
        };
        SynthEvent {
            track,
            waveform: voice.waveform,
            frequency,
            amplitude: AmplitudeProgram::decaying(voice.level, voice.decay),
            start,
            duration: voice.decay,
        }
    }

    /// Render `track` of the kit called `kit` at `start` on the audio clock.
    /// Returns whether an event was dispatched: muted and out-of-range tracks
    /// produce nothing. A start time already in the past is pulled up to now.
    pub fn render<C: ClockSource + ?Sized>(
        &mut self,
        clock: &mut C,
        kit: &str,
        mutes: &MuteState,
        track: usize,
        start: f64,
    ) -> bool {
        if track >= NUM_TRACKS || mutes.is_muted(track) {
            return false;
        }
        let Some(voice) = resolve_kit(kit).voice(track) else {
            return false;
        };

        let now = clock.now();
        let start = if start < now {
            log::debug!("track {track}: start {start:.4}s is behind the clock ({now:.4}s), playing now");
            now
        } else {
            start
        };

        let event = self.event_for(track, voice, start);
        clock.schedule_event(event);
        true
    }
}
