// The middle layer: owns every piece of mutable sequencer state and is the
// only thing that touches it. The TUI sends InputEvents in and reads a
// DisplayState out; the main loop fires the transport's wake-ups through
// `tick`. Everything runs on one thread, so nothing here needs a lock.

use std::path::PathBuf;

use chrono::Utc;

use crate::audio_api::{ClockError, ClockSource, MixBus};
use crate::pipeline::snapshot::{self, PatternSnapshot, SnapshotError};
use crate::pipeline::{
    DeadlineTimer, KitSelection, Mixer, MuteState, PatternGrid, Transport, TransportConfig,
    VoiceEngine, WakeTimer,
};
use crate::shared::{DisplayState, InputEvent, DEFAULT_BPM, DEFAULT_MASTER_VOLUME, NUM_TRACKS};

#[derive(Clone, Debug)]
pub struct Settings {
    pub transport: TransportConfig,
    pub bpm: f64,
    pub kit: String,
    pub master_volume: f32,
    pub export_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            bpm: DEFAULT_BPM,
            kit: crate::pipeline::kit::DEFAULT_KIT.to_string(),
            master_volume: DEFAULT_MASTER_VOLUME,
            export_dir: PathBuf::from("."),
        }
    }
}

pub struct Middle<A, W = DeadlineTimer> {
    audio: A,
    timer: W,
    transport: Transport,
    pattern: PatternGrid,
    mutes: MuteState,
    mixer: Mixer,
    kit: KitSelection,
    voices: VoiceEngine,
    export_dir: PathBuf,
    status: String,
}

impl<A: ClockSource + MixBus, W: WakeTimer> Middle<A, W> {
    pub fn new(mut audio: A, timer: W, settings: Settings) -> Self {
        let mixer = Mixer::new(settings.master_volume);
        mixer.sync(&mut audio);
        Self {
            audio,
            timer,
            transport: Transport::new(settings.transport, settings.bpm),
            pattern: PatternGrid::new(),
            mutes: MuteState::new(),
            mixer,
            kit: KitSelection::new(&settings.kit),
            voices: VoiceEngine::new(),
            export_dir: settings.export_dir,
            status: String::new(),
        }
    }

    pub fn with_voice_engine(mut self, voices: VoiceEngine) -> Self {
        self.voices = voices;
        self
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn timer(&self) -> &W {
        &self.timer
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn pattern(&self) -> &PatternGrid {
        &self.pattern
    }

    pub fn kit(&self) -> &KitSelection {
        &self.kit
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::ToggleCell { track, step } => {
                self.toggle_cell(track as usize, step as usize);
            }
            InputEvent::ToggleMute(track) => {
                let track = track as usize;
                let muted = !self.mutes.is_muted(track);
                self.set_mute(track, muted);
            }
            InputEvent::ClearPattern => self.clear(),
            InputEvent::PlayPress => self.play_pause(),
            InputEvent::StopPress => self.stop(),
            InputEvent::NudgeTempo(delta) => {
                self.transport.nudge_tempo(delta);
            }
            InputEvent::KitPrev => self.cycle_kit(-1),
            InputEvent::KitNext => self.cycle_kit(1),
            InputEvent::NudgeVolume(delta) => {
                let v = self.mixer.master_volume() + delta;
                self.set_master_volume(v);
            }
            InputEvent::Export => match self.export() {
                Ok(path) => self.status = format!("saved {}", path.display()),
                Err(e) => {
                    log::error!("export failed: {e}");
                    self.status = format!("export failed: {e}");
                }
            },
            InputEvent::Quit => {} // main loop handles quitting
        }
    }

    /// Flip a cell. Turning a cell on while stopped previews it right away.
    pub fn toggle_cell(&mut self, track: usize, step: usize) -> bool {
        let active = self.pattern.toggle(track, step);
        if active && !self.transport.is_playing() {
            if !self.audio.is_running() {
                if let Err(e) = self.audio.resume() {
                    log::warn!("no preview, audio clock won't start: {e}");
                    return active;
                }
            }
            let now = self.audio.now();
            self.voices.render(&mut self.audio, self.kit.name(), &self.mutes, track, now);
        }
        active
    }

    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        self.transport.set_tempo(bpm)
    }

    pub fn set_master_volume(&mut self, volume: f32) -> f32 {
        self.mixer.set_master_volume(&mut self.audio, volume)
    }

    pub fn set_mute(&mut self, track: usize, muted: bool) {
        if track >= NUM_TRACKS {
            return;
        }
        self.mutes.set(track, muted);
        self.mixer.set_mute(&mut self.audio, track, muted);
        log::debug!("track {track} {}", if muted { "muted" } else { "unmuted" });
    }

    pub fn select_kit(&mut self, name: &str) -> bool {
        self.kit.select(name)
    }

    pub fn cycle_kit(&mut self, direction: i32) {
        let kit = self.kit.cycle(direction);
        log::info!("kit: {}", kit.name);
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    pub fn start(&mut self) -> Result<(), ClockError> {
        if let Err(e) = self.transport.start(&mut self.audio, &mut self.timer) {
            log::error!("could not start playback: {e}");
            self.status = e.to_string();
            return Err(e);
        }
        self.status.clear();
        self.tick();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.transport.pause(&mut self.timer);
    }

    pub fn stop(&mut self) {
        self.transport.stop(&mut self.timer);
    }

    pub fn play_pause(&mut self) {
        if self.transport.is_playing() {
            self.pause();
        } else {
            // a failure is already logged and shown in the status line
            let _ = self.start();
        }
    }

    /// Fire the wake loop: consume the pending wake and let the transport
    /// dispatch whatever is due. Returns the number of steps dispatched.
    pub fn tick(&mut self) -> usize {
        self.timer.cancel();
        let now = self.audio.now();
        let kit = self.kit.name();
        let pattern = &self.pattern;
        let mutes = &self.mutes;
        let voices = &mut self.voices;
        let audio = &mut self.audio;
        self.transport.tick(now, &mut self.timer, |step, time| {
            for track in pattern.active_tracks(step) {
                voices.render(audio, kit, mutes, track, time);
            }
        })
    }

    pub fn snapshot(&self) -> PatternSnapshot {
        PatternSnapshot::capture(&self.pattern, self.transport.bpm(), self.kit.name(), Utc::now())
    }

    pub fn export(&self) -> Result<PathBuf, SnapshotError> {
        snapshot::save_snapshot(&self.export_dir, &self.snapshot())
    }

    pub fn display_state(&self) -> DisplayState {
        let playing_step = if self.transport.is_playing() {
            self.transport
                .audible_step(self.audio.now())
                .map(|s| s as u8)
        } else {
            None
        };
        DisplayState {
            grid: *self.pattern.rows(),
            muted: self.mutes.flags(),
            playing: self.transport.is_playing(),
            playing_step,
            bpm: self.transport.bpm(),
            kit_label: self.kit.label(),
            master_volume: self.mixer.master_volume(),
            status_text: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::MockClock;
    use crate::pipeline::ManualTimer;
    use crate::shared::NUM_STEPS;

    fn middle_at(now: f64) -> Middle<MockClock, ManualTimer> {
        Middle::new(MockClock::at(now), ManualTimer::default(), Settings::default())
            .with_voice_engine(VoiceEngine::seeded(3))
    }

    #[test]
    fn new_pushes_initial_gains() {
        let m = middle_at(0.0);
        assert_eq!(m.audio().master_gain, DEFAULT_MASTER_VOLUME);
        assert_eq!(m.audio().track_gains, [1.0; NUM_TRACKS]);
    }

    #[test]
    fn toggle_while_stopped_previews() {
        let mut m = middle_at(4.0);
        assert!(m.toggle_cell(2, 5));
        assert_eq!(m.audio().events.len(), 1);
        assert_eq!(m.audio().events[0].start, 4.0);
        assert_eq!(m.audio().events[0].track, 2);

        // turning it off again makes no sound
        assert!(!m.toggle_cell(2, 5));
        assert_eq!(m.audio().events.len(), 1);
    }

    #[test]
    fn preview_wakes_a_suspended_clock() {
        let mut m = Middle::new(MockClock::suspended(0.0), ManualTimer::default(), Settings::default());
        for step in 0..8 {
            m.toggle_cell(0, step);
        }
        assert!(m.audio().running);
        assert_eq!(m.audio().resumes, 1);
        assert_eq!(m.audio().events.len(), 8);
    }

    #[test]
    fn preview_is_skipped_when_the_clock_cannot_start() {
        let mut clock = MockClock::suspended(0.0);
        clock.fail_resume = true;
        let mut m = Middle::new(clock, ManualTimer::default(), Settings::default());
        assert!(m.toggle_cell(3, 2));
        assert!(m.audio().events.is_empty());
        assert!(m.pattern().is_active(3, 2));
    }

    #[test]
    fn toggle_while_playing_does_not_preview() {
        let mut m = middle_at(0.0);
        m.start().unwrap();
        let before = m.audio().events.len();
        m.toggle_cell(1, 9);
        assert_eq!(m.audio().events.len(), before);
    }

    #[test]
    fn start_dispatches_active_cells_at_step_times() {
        let mut m = middle_at(10.0);
        m.toggle_cell(2, 0);
        m.toggle_cell(0, 0);
        m.toggle_cell(3, 1);
        m.audio.events.clear();

        m.start().unwrap();
        // horizon 10.1: only step 0 is due
        let ev = &m.audio().events;
        assert_eq!(ev.len(), 2);
        assert!(ev.iter().all(|e| e.start == 10.0));
        assert_eq!(ev.iter().map(|e| e.track).collect::<Vec<_>>(), vec![0, 2]);

        m.audio.advance(0.05);
        assert_eq!(m.tick(), 1);
        let last = m.audio().events.last().unwrap();
        assert_eq!((last.track, last.start), (3, 10.125));
    }

    #[test]
    fn muted_track_keeps_time_but_makes_no_events() {
        let mut plain = middle_at(0.0);
        let mut muted = middle_at(0.0);
        for m in [&mut plain, &mut muted] {
            for step in 0..NUM_STEPS {
                m.toggle_cell(1, step);
            }
            m.audio.events.clear();
        }
        muted.set_mute(1, true);
        assert_eq!(muted.audio().track_gains[1], 0.0);

        for m in [&mut plain, &mut muted] {
            m.start().unwrap();
            for _ in 0..40 {
                m.audio.advance(0.025);
                m.tick();
            }
        }
        assert_eq!(plain.transport().state(), muted.transport().state());
        assert!(!plain.audio().events.is_empty());
        assert!(muted.audio().events.is_empty());
    }

    #[test]
    fn failed_resume_is_reported_and_retryable() {
        let mut clock = MockClock::suspended(1.0);
        clock.fail_resume = true;
        let mut m = Middle::new(clock, ManualTimer::default(), Settings::default());

        m.handle_input(InputEvent::PlayPress);
        assert!(!m.transport().is_playing());
        assert!(m.status().contains("unavailable"));
        assert!(m.display_state().status_text.contains("unavailable"));

        m.audio.fail_resume = false;
        m.handle_input(InputEvent::PlayPress);
        assert!(m.transport().is_playing());
        assert!(m.status().is_empty());
    }

    #[test]
    fn play_press_toggles_pause_and_stop_rewinds() {
        let mut m = middle_at(0.0);
        m.handle_input(InputEvent::PlayPress);
        m.audio.advance(0.3);
        m.tick();
        let step = m.transport().current_step();
        assert!(step > 0);

        m.handle_input(InputEvent::PlayPress);
        assert!(!m.transport().is_playing());
        assert_eq!(m.transport().current_step(), step);
        assert_eq!(m.timer().armed, None);

        m.handle_input(InputEvent::PlayPress);
        m.handle_input(InputEvent::StopPress);
        assert_eq!(m.transport().current_step(), 0);
        assert_eq!(m.display_state().playing_step, None);
    }

    #[test]
    fn input_events_reach_tempo_volume_and_kit() {
        let mut m = middle_at(0.0);
        m.handle_input(InputEvent::NudgeTempo(5.0));
        assert_eq!(m.transport().bpm(), 125.0);
        m.handle_input(InputEvent::NudgeVolume(0.25));
        assert_eq!(m.audio().master_gain, 0.75);
        m.handle_input(InputEvent::KitPrev);
        assert_eq!(m.kit().name(), "soft");
        m.handle_input(InputEvent::KitNext);
        m.handle_input(InputEvent::KitNext);
        assert_eq!(m.display_state().kit_label, "8-Bit Chip");
        m.handle_input(InputEvent::ToggleMute(4));
        assert!(m.display_state().muted[4]);
    }

    #[test]
    fn unknown_kit_still_plays() {
        let mut m = middle_at(0.0);
        assert!(!m.select_kit("xyz"));
        assert!(m.toggle_cell(0, 0));
        assert_eq!(m.audio().events.len(), 1);
        assert_eq!(m.display_state().kit_label, "Xyz");
    }

    #[test]
    fn display_follows_audible_step() {
        let mut m = middle_at(0.0);
        m.start().unwrap();
        m.audio.advance(0.2);
        m.tick();
        assert_eq!(m.display_state().playing_step, Some(1));
        assert!(m.transport().current_step() > 1);
    }

    #[test]
    fn clear_and_snapshot() {
        let mut m = middle_at(0.0);
        m.toggle_cell(4, 7);
        let snap = m.snapshot();
        assert!(snap.pattern[4][7]);
        assert_eq!(snap.meta.tempo, DEFAULT_BPM);
        m.handle_input(InputEvent::ClearPattern);
        assert_eq!(m.pattern().active_count(), 0);
    }
}
