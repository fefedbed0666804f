//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::bounce::BounceOptions;
use crate::middle::Settings;
use crate::pipeline::kit::DEFAULT_KIT;
use crate::pipeline::transport::{clamp_tempo, TransportConfig};
use crate::shared::{DEFAULT_BPM, DEFAULT_MASTER_VOLUME, LOOKAHEAD_SECS, WAKE_PERIOD_MS};

/// beatgrid - a five-track, sixteen-step rhythm sequencer for the terminal
#[derive(Parser, Debug)]
#[command(name = "beatgrid")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A five-track, sixteen-step rhythm sequencer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the sequencer (the default)
    Play(PlayArgs),

    /// Render an exported pattern to a WAV file
    Bounce(BounceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TimingArgs {
    /// How far ahead of the audio clock steps are scheduled
    #[arg(long, value_name = "MS", default_value_t = (LOOKAHEAD_SECS * 1000.0) as u64)]
    pub lookahead_ms: u64,

    /// How often the scheduler wakes up; must be shorter than the lookahead
    #[arg(long, value_name = "MS", default_value_t = WAKE_PERIOD_MS)]
    pub wake_ms: u64,
}

impl TimingArgs {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(
            self.lookahead_ms as f64 / 1000.0,
            Duration::from_millis(self.wake_ms),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Starting tempo, clamped to 60..=240
    #[arg(long, default_value_t = DEFAULT_BPM)]
    pub bpm: f64,

    /// Starting kit: standard, 8bit or soft
    #[arg(long, default_value = DEFAULT_KIT)]
    pub kit: String,

    /// Master volume, 0.0 to 1.0
    #[arg(long, default_value_t = DEFAULT_MASTER_VOLUME)]
    pub volume: f32,

    /// Where exported patterns go
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub export_dir: PathBuf,

    /// Log file (the terminal is busy drawing the grid)
    #[arg(long, value_name = "PATH", default_value = "beatgrid.log")]
    pub log_file: PathBuf,

    #[command(flatten)]
    pub timing: TimingArgs,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            kit: DEFAULT_KIT.to_string(),
            volume: DEFAULT_MASTER_VOLUME,
            export_dir: PathBuf::from("."),
            log_file: PathBuf::from("beatgrid.log"),
            timing: TimingArgs {
                lookahead_ms: (LOOKAHEAD_SECS * 1000.0) as u64,
                wake_ms: WAKE_PERIOD_MS,
            },
        }
    }
}

impl PlayArgs {
    pub fn settings(&self) -> Settings {
        Settings {
            transport: self.timing.transport_config(),
            bpm: clamp_tempo(self.bpm),
            kit: self.kit.clone(),
            master_volume: self.volume.clamp(0.0, 1.0),
            export_dir: self.export_dir.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct BounceArgs {
    /// Pattern json written by the export key
    #[arg(value_name = "PATTERN")]
    pub pattern: PathBuf,

    /// WAV file to write
    #[arg(value_name = "OUT")]
    pub out: PathBuf,

    /// How many times to play the pattern
    #[arg(long, default_value_t = 1)]
    pub loops: u32,

    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    /// Master volume, 0.0 to 1.0
    #[arg(long, default_value_t = DEFAULT_MASTER_VOLUME)]
    pub volume: f32,

    /// Seed for the random-pitch voices
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[command(flatten)]
    pub timing: TimingArgs,
}

impl BounceArgs {
    pub fn options(&self) -> BounceOptions {
        BounceOptions {
            loops: self.loops.max(1),
            sample_rate: self.sample_rate.max(8000),
            master_volume: self.volume.clamp(0.0, 1.0),
            seed: self.seed,
            transport: self.timing.transport_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::MAX_BPM;

    #[test]
    fn no_subcommand_means_play() {
        let cli = Cli::try_parse_from(["beatgrid"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn play_flags() {
        let cli = Cli::try_parse_from([
            "beatgrid", "play", "--bpm", "400", "--kit", "8bit", "--volume", "0.9",
        ])
        .unwrap();
        let Some(Command::Play(args)) = cli.command else {
            panic!("expected play");
        };
        let settings = args.settings();
        assert_eq!(settings.bpm, MAX_BPM);
        assert_eq!(settings.kit, "8bit");
        assert_eq!(settings.master_volume, 0.9);
        assert_eq!(settings.transport, TransportConfig::default());
    }

    #[test]
    fn bounce_args() {
        let cli = Cli::try_parse_from([
            "beatgrid", "bounce", "p.json", "out.wav", "--loops", "4", "--wake-ms", "500",
        ])
        .unwrap();
        let Some(Command::Bounce(args)) = cli.command else {
            panic!("expected bounce");
        };
        let opts = args.options();
        assert_eq!(opts.loops, 4);
        assert_eq!(opts.sample_rate, 44100);
        // a wake period longer than the lookahead gets fixed up
        assert!(opts.transport.wake_period.as_secs_f64() < opts.transport.lookahead);
    }

    #[test]
    fn defaults_match_clap_defaults() {
        let cli = Cli::try_parse_from(["beatgrid", "play"]).unwrap();
        let Some(Command::Play(args)) = cli.command else {
            panic!("expected play");
        };
        let d = PlayArgs::default();
        assert_eq!(args.bpm, d.bpm);
        assert_eq!(args.kit, d.kit);
        assert_eq!(args.log_file, d.log_file);
        assert_eq!(args.timing.wake_ms, d.timing.wake_ms);
        assert_eq!(args.timing.lookahead_ms, d.timing.lookahead_ms);
    }
}
