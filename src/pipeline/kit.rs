// Kits: one timbre per track, picked by name. The library is fixed at compile
// time; the only runtime state is which kit is selected.

use crate::audio_api::Waveform;
use crate::audio_api::Waveform::{Sawtooth, Sine, Square, Triangle};
use crate::shared::NUM_TRACKS;

/// The pitch classes the random-pitch voices draw from (C minor pentatonic, C4..C5).
pub const PENTATONIC_SCALE: [f32; 5] = [261.63, 311.13, 392.00, 466.16, 523.25];

pub const DEFAULT_KIT: &str = "standard";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PitchMode {
    Fixed(f32),
    // exponential glide from `start` to `end` Hz over `duration` seconds
    Sweep { start: f32, end: f32, duration: f64 },
    // one note of PENTATONIC_SCALE per trigger
    RandomFromScale,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceDescriptor {
    pub waveform: Waveform,
    pub level: f32, // 0.0 to 1.0
    pub decay: f64, // seconds, also the lifetime of every event
    pub pitch: PitchMode,
}

impl VoiceDescriptor {
    const fn fixed(waveform: Waveform, freq: f32, level: f32, decay: f64) -> Self {
        Self { waveform, level, decay, pitch: PitchMode::Fixed(freq) }
    }

    const fn sweep(waveform: Waveform, start: f32, end: f32, duration: f64, level: f32, decay: f64) -> Self {
        Self { waveform, level, decay, pitch: PitchMode::Sweep { start, end, duration } }
    }

    const fn random(waveform: Waveform, level: f32, decay: f64) -> Self {
        Self { waveform, level, decay, pitch: PitchMode::RandomFromScale }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Kit {
    pub name: &'static str,
    pub voices: [VoiceDescriptor; NUM_TRACKS], // Hi-Hat, Snare, Kick, Bass, Synth
}

impl Kit {
    pub fn voice(&self, track: usize) -> Option<&VoiceDescriptor> {
        self.voices.get(track)
    }
}

pub static KITS: [Kit; 3] = [
    Kit {
        name: "standard",
        voices: [
            VoiceDescriptor::fixed(Triangle, 6000.0, 0.1, 0.05),
            VoiceDescriptor::fixed(Square, 250.0, 0.2, 0.1),
            VoiceDescriptor::sweep(Sine, 150.0, 0.01, 0.5, 0.8, 0.5),
            VoiceDescriptor::fixed(Sawtooth, 65.41, 0.4, 0.3),
            VoiceDescriptor::random(Sine, 0.3, 0.3),
        ],
    },
    Kit {
        name: "8bit",
        voices: [
            VoiceDescriptor::fixed(Square, 1200.0, 0.1, 0.05),
            VoiceDescriptor::sweep(Sawtooth, 400.0, 100.0, 0.1, 0.2, 0.1),
            VoiceDescriptor::sweep(Square, 100.0, 10.0, 0.2, 0.5, 0.2),
            VoiceDescriptor::fixed(Square, 55.0, 0.4, 0.4),
            VoiceDescriptor::random(Square, 0.2, 0.4),
        ],
    },
    Kit {
        name: "soft",
        voices: [
            VoiceDescriptor::fixed(Sine, 4000.0, 0.05, 0.05),
            VoiceDescriptor::fixed(Triangle, 200.0, 0.1, 0.1),
            VoiceDescriptor::sweep(Sine, 100.0, 30.0, 0.3, 0.6, 0.3),
            VoiceDescriptor::fixed(Sine, 65.41, 0.5, 0.6),
            VoiceDescriptor::random(Triangle, 0.2, 0.5),
        ],
    },
];

pub fn find_kit(name: &str) -> Option<&'static Kit> {
    KITS.iter().find(|kit| kit.name == name)
}

/// The named kit, or the default kit when the name is unknown.
pub fn resolve_kit(name: &str) -> &'static Kit {
    find_kit(name).unwrap_or_else(|| {
        log::debug!("unknown kit {name:?}, using {DEFAULT_KIT:?}");
        &KITS[0]
    })
}

pub fn display_name(name: &str) -> String {
    match name {
        "8bit" => "8-Bit Chip".to_string(),
        "soft" => "Soft Electric".to_string(),
        _ => {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

// Which kit is selected. `name` may name a kit that doesn't exist (someone
// asked for it by name); synthesis then falls back to the default kit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KitSelection {
    index: usize,
    name: String,
}

impl Default for KitSelection {
    fn default() -> Self {
        Self { index: 0, name: DEFAULT_KIT.to_string() }
    }
}

impl KitSelection {
    pub fn new(name: &str) -> Self {
        let mut selection = Self::default();
        selection.select(name);
        selection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kit(&self) -> &'static Kit {
        resolve_kit(&self.name)
    }

    pub fn label(&self) -> String {
        display_name(&self.name)
    }

    /// Select by name. Returns false (and keeps the name) when no such kit exists.
    pub fn select(&mut self, name: &str) -> bool {
        self.name = name.to_string();
        match KITS.iter().position(|kit| kit.name == name) {
            Some(index) => {
                self.index = index;
                true
            }
            None => {
                log::warn!("no kit named {name:?}, falling back to {DEFAULT_KIT:?}");
                self.index = 0;
                false
            }
        }
    }

    /// Step through the library, wrapping at both ends.
    pub fn cycle(&mut self, direction: i32) -> &'static Kit {
        let len = KITS.len() as i32;
        self.index = (self.index as i32 + direction).rem_euclid(len) as usize;
        let kit = &KITS[self.index];
        self.name = kit.name.to_string();
        kit
    }
}
