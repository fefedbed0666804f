//! beatgrid: a five-track, sixteen-step rhythm sequencer.
//!
//! The sequencer thread owns all state ([`middle::Middle`]) and drives a
//! lookahead [`pipeline::Transport`] that hands exactly timed
//! [`audio_api::SynthEvent`]s to a [`audio_api::ClockSource`]. The real clock
//! source is a cpal stream ([`audio::AudioHandle`]); [`bounce::OfflineClock`]
//! renders the same events to a buffer.

pub mod audio;
pub mod audio_api;
pub mod bounce;
pub mod config;
pub mod middle;
pub mod pipeline;
pub mod shared;
