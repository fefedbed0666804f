//! Offline rendering of a pattern snapshot to a WAV file.
//!
//! Runs the same transport and voice engine as live playback, but against an
//! [`OfflineClock`] that owns the audio engine directly: time only moves when
//! a chunk of frames is rendered, and the wake loop fires once per chunk.

use std::path::Path;

use anyhow::Context;

use crate::audio::{Engine, StereoFrame};
use crate::audio_api::{AudioCommand, ClockError, ClockSource, MixBus, SynthEvent};
use crate::pipeline::snapshot::PatternSnapshot;
use crate::pipeline::transport::step_duration;
use crate::pipeline::{ManualTimer, Mixer, MuteState, Transport, TransportConfig, VoiceEngine};
use crate::shared::NUM_STEPS;

// longest decay in any kit, so the last hits ring out
const TAIL_SECS: f64 = 0.6;

pub struct OfflineClock {
    engine: Engine,
}

impl OfflineClock {
    pub fn new(sample_rate: u32) -> Self {
        Self { engine: Engine::new(sample_rate) }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn render(&mut self, out: &mut [StereoFrame]) {
        self.engine.render_block(out);
    }
}

impl ClockSource for OfflineClock {
    fn now(&self) -> f64 {
        self.engine.now()
    }

    fn is_running(&self) -> bool {
        true
    }

    fn resume(&mut self) -> Result<(), ClockError> {
        Ok(())
    }

    fn schedule_event(&mut self, event: SynthEvent) {
        self.engine.handle_cmd(AudioCommand::Schedule(event));
    }
}

impl MixBus for OfflineClock {
    fn set_track_gain(&mut self, track: usize, gain: f32) {
        self.engine.handle_cmd(AudioCommand::SetTrackGain { track, gain });
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.engine.handle_cmd(AudioCommand::SetMasterGain(gain));
    }
}

#[derive(Clone, Debug)]
pub struct BounceOptions {
    pub loops: u32,
    pub sample_rate: u32,
    pub master_volume: f32,
    pub seed: u64, // for the random-pitch voices
    pub transport: TransportConfig,
}

impl Default for BounceOptions {
    fn default() -> Self {
        Self {
            loops: 1,
            sample_rate: 44100,
            master_volume: crate::shared::DEFAULT_MASTER_VOLUME,
            seed: 0,
            transport: TransportConfig::default(),
        }
    }
}

/// Render `opts.loops` passes of the snapshot's pattern, plus a short tail.
pub fn render_snapshot(snapshot: &PatternSnapshot, opts: &BounceOptions) -> anyhow::Result<Vec<StereoFrame>> {
    let grid = snapshot.to_grid().context("snapshot has the wrong shape")?;
    let kit = snapshot.meta.kit.as_str();
    let mutes = MuteState::new();

    let mut clock = OfflineClock::new(opts.sample_rate);
    let mut timer = ManualTimer::default();
    let mut voices = VoiceEngine::seeded(opts.seed);
    let mut transport = Transport::new(opts.transport, snapshot.meta.tempo);
    Mixer::new(opts.master_volume).sync(&mut clock);

    let steps_total = opts.loops as usize * NUM_STEPS;
    let length = steps_total as f64 * step_duration(transport.bpm()) + TAIL_SECS;
    let total_frames = (length * opts.sample_rate as f64).ceil() as usize;
    let chunk = ((transport.config().wake_period.as_secs_f64() * opts.sample_rate as f64) as usize).max(1);

    transport.start(&mut clock, &mut timer)?;
    let mut dispatched = 0usize;
    let mut out = vec![StereoFrame::zero(); total_frames];

    for block in out.chunks_mut(chunk) {
        if transport.is_playing() {
            let now = clock.now();
            transport.tick(now, &mut timer, |step, time| {
                if dispatched < steps_total {
                    for track in grid.active_tracks(step) {
                        voices.render(&mut clock, kit, &mutes, track, time);
                    }
                    dispatched += 1;
                }
            });
            if dispatched >= steps_total {
                transport.stop(&mut timer);
            }
        }
        clock.render(block);
    }

    log::info!(
        "rendered {} steps ({} loops) at {} bpm into {:.2}s of audio",
        dispatched,
        opts.loops,
        transport.bpm(),
        total_frames as f64 / opts.sample_rate as f64
    );
    Ok(out)
}

/// 16-bit stereo WAV.
pub fn write_wav(path: &Path, frames: &[StereoFrame], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("could not create {}", path.display()))?;
    for f in frames {
        writer.write_sample(to_i16(f.left))?;
        writer.write_sample(to_i16(f.right))?;
    }
    writer.finalize()?;
    Ok(())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
