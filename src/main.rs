mod tui;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use beatgrid::audio;
use beatgrid::bounce;
use beatgrid::config::{BounceArgs, Cli, Command, PlayArgs};
use beatgrid::middle::Middle;
use beatgrid::pipeline::snapshot;
use beatgrid::pipeline::DeadlineTimer;
use beatgrid::shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Bounce(args)) => run_bounce(args),
        Some(Command::Play(args)) => run_sequencer(args),
        None => run_sequencer(PlayArgs::default()),
    }
}

// stderr when nothing else owns the terminal, otherwise a file
fn init_logger(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_bounce(args: BounceArgs) -> anyhow::Result<()> {
    init_logger(None)?;
    let snapshot = snapshot::load_snapshot(&args.pattern)
        .with_context(|| format!("could not read pattern {}", args.pattern.display()))?;
    let opts = args.options();
    let frames = bounce::render_snapshot(&snapshot, &opts)?;
    bounce::write_wav(&args.out, &frames, opts.sample_rate)?;
    log::info!("wrote {}", args.out.display());
    Ok(())
}

fn run_sequencer(args: PlayArgs) -> anyhow::Result<()> {
    init_logger(Some(&args.log_file))?;
    let audio = audio::start_audio()?;
    let mut middle = Middle::new(audio, DeadlineTimer::new(), args.settings());
    log::info!("sequencer ready, kit {:?}", middle.kit().name());

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = Duration::from_millis(16); // ~60fps
    let mut last_draw: Option<Instant> = None;
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        if last_draw.is_none_or(|t| t.elapsed() >= frame_rate) {
            let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
            let ds = middle.display_state();
            term.draw(|frame| {
                tui::view::render(frame, frame.area(), &ds, &tui_state, blink_on);
            })?;
            last_draw = Some(Instant::now());
        }

        // never sleep past the transport's next wake-up
        let timeout = middle
            .timer()
            .remaining(Instant::now())
            .map_or(frame_rate, |left| left.min(frame_rate));

        let events = tui::input::poll_input(timeout, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                middle.stop();
                drop(term);
                return Ok(());
            }
            middle.handle_input(event);
        }

        if middle.timer().is_due(Instant::now()) {
            middle.tick();
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
