pub mod kit;
pub mod mixer;
pub mod pattern;
pub mod snapshot;
pub mod transport;
pub mod voice_engine;

#[cfg(test)]
pub(crate) mod testing;

pub use kit::{Kit, KitSelection, PitchMode, VoiceDescriptor};
pub use mixer::Mixer;
pub use pattern::{MuteState, PatternGrid};
pub use snapshot::{PatternSnapshot, SnapshotError};
pub use transport::{DeadlineTimer, ManualTimer, Transport, TransportConfig, WakeTimer};
pub use voice_engine::VoiceEngine;
