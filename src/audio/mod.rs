use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, ClockError, ClockSource, MixBus, SynthEvent};

mod engine;
mod frame;
pub mod ramp;
mod voice;

pub use engine::{Engine, MAX_PENDING, MAX_VOICES};
pub use frame::StereoFrame;
pub use voice::Voice;

const COMMAND_QUEUE_LEN: usize = 1024;

// The real clock source: a cpal output stream whose callback owns the Engine.
// The stream is built paused, like a browser audio context before the first
// user gesture, so `resume()` has to be called before the clock moves.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    frames: Arc<AtomicU64>, // published by the audio callback after every block
    sample_rate: u32,
    running: bool,
    stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!("audio command queue full, dropping command");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn suspend(&mut self) -> Result<(), ClockError> {
        self.stream
            .pause()
            .map_err(|e| ClockError::Stream(e.to_string()))?;
        self.running = false;
        Ok(())
    }
}

impl ClockSource for AudioHandle {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<(), ClockError> {
        if self.running {
            return Ok(());
        }
        self.stream
            .play()
            .map_err(|e| ClockError::Unavailable(e.to_string()))?;
        self.running = true;
        log::info!("audio clock running at {} Hz", self.sample_rate);
        Ok(())
    }

    fn schedule_event(&mut self, event: SynthEvent) {
        self.send(AudioCommand::Schedule(event));
    }
}

impl MixBus for AudioHandle {
    fn set_track_gain(&mut self, track: usize, gain: f32) {
        self.send(AudioCommand::SetTrackGain { track, gain });
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.send(AudioCommand::SetMasterGain(gain));
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE_LEN);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let frames = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let stream = build_output_stream_f32(
                &device,
                &config.into(),
                rx,
                Arc::clone(&frames),
                sample_rate,
                channels,
            )?;
            // cpal may start some backends eagerly; keep the clock frozen until resume()
            if let Err(e) = stream.pause() {
                log::warn!("could not pause the new output stream: {e}");
            }
            log::info!("audio output ready: {channels} channels at {sample_rate} Hz");

            Ok(AudioHandle {
                tx,
                frames,
                sample_rate,
                running: false,
                stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    frames: Arc<AtomicU64>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            for chunk in data.chunks_mut(channels) {
                let frame = engine.next_frame();
                for (ch, sample) in chunk.iter_mut().enumerate() {
                    *sample = match ch {
                        0 => frame.left,
                        1 => frame.right,
                        _ => 0.0,
                    };
                }
            }

            frames.store(engine.frame_pos(), Ordering::Release);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
