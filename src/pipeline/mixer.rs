// Per-track gain into a master gain. Mute is a track gain of zero; the gains
// themselves live in the audio engine, this side just keeps track of them.

use crate::audio_api::MixBus;
use crate::shared::{DEFAULT_MASTER_VOLUME, NUM_TRACKS};

#[derive(Clone, Debug, PartialEq)]
pub struct Mixer {
    track_gains: [f32; NUM_TRACKS],
    master: f32,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_VOLUME)
    }
}

impl Mixer {
    pub fn new(master: f32) -> Self {
        Self {
            track_gains: [1.0; NUM_TRACKS],
            master: master.clamp(0.0, 1.0),
        }
    }

    pub fn track_gain(&self, track: usize) -> f32 {
        self.track_gains.get(track).copied().unwrap_or(0.0)
    }

    pub fn master_volume(&self) -> f32 {
        self.master
    }

    pub fn set_mute<B: MixBus + ?Sized>(&mut self, bus: &mut B, track: usize, muted: bool) {
        let Some(gain) = self.track_gains.get_mut(track) else {
            return;
        };
        *gain = if muted { 0.0 } else { 1.0 };
        bus.set_track_gain(track, *gain);
    }

    pub fn set_master_volume<B: MixBus + ?Sized>(&mut self, bus: &mut B, volume: f32) -> f32 {
        self.master = if volume.is_nan() { self.master } else { volume.clamp(0.0, 1.0) };
        bus.set_master_gain(self.master);
        self.master
    }

    /// Push every gain to the bus, e.g. after the audio side was (re)built.
    pub fn sync<B: MixBus + ?Sized>(&self, bus: &mut B) {
        for (track, gain) in self.track_gains.iter().enumerate() {
            bus.set_track_gain(track, *gain);
        }
        bus.set_master_gain(self.master);
    }
}
