//! Lookahead transport scheduler.
//!
//! The wake-ups that drive the transport are sloppy: a timer only promises to
//! fire *at least* this late, and a busy or throttled thread makes it later.
//! So the transport never plays anything at wake-up time. Each wake it looks
//! at the audio clock and hands every step that falls inside the next
//! `lookahead` seconds to the clock source with an exact start time, then asks
//! to be woken again after `wake_period` (which is shorter than `lookahead`,
//! so a wake-up that is a little late still finds the next step unscheduled).
//! A very late wake-up catches up by dispatching every overdue step in order.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::audio_api::{ClockError, ClockSource};
use crate::shared::{DEFAULT_BPM, LOOKAHEAD_SECS, MAX_BPM, MIN_BPM, NUM_STEPS, WAKE_PERIOD_MS};

/// Re-arms the transport's wake loop. Firing it means calling `Transport::tick`.
pub trait WakeTimer {
    fn arm(&mut self, after: Duration);
    fn cancel(&mut self);
}

// Wall-clock deadline for the UI loop to poll against.
#[derive(Clone, Debug, Default)]
pub struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Time left until the deadline, zero when overdue, None when not armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

impl WakeTimer for DeadlineTimer {
    fn arm(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }
}

// Remembers what it was asked to do and leaves the firing to its owner.
// Used wherever time is simulated (offline rendering, tests).
#[derive(Clone, Debug, Default)]
pub struct ManualTimer {
    pub armed: Option<Duration>,
    pub arms: usize,
    pub cancels: usize,
}

impl WakeTimer for ManualTimer {
    fn arm(&mut self, after: Duration) {
        self.armed = Some(after);
        self.arms += 1;
    }

    fn cancel(&mut self) {
        self.armed = None;
        self.cancels += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportConfig {
    pub lookahead: f64, // seconds
    pub wake_period: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            lookahead: LOOKAHEAD_SECS,
            wake_period: Duration::from_millis(WAKE_PERIOD_MS),
        }
    }
}

impl TransportConfig {
    /// A wake period that is not shorter than the lookahead can't keep up;
    /// such a pair gets its wake period cut to half the lookahead.
    pub fn new(lookahead: f64, wake_period: Duration) -> Self {
        let lookahead = if lookahead.is_finite() && lookahead > 0.0 {
            lookahead
        } else {
            log::warn!("lookahead {lookahead}s is not usable, using {LOOKAHEAD_SECS}s");
            LOOKAHEAD_SECS
        };
        let wake_period = if wake_period.is_zero() || wake_period.as_secs_f64() >= lookahead {
            let fixed = Duration::from_secs_f64(lookahead / 2.0);
            log::warn!(
                "wake period {:?} does not fit inside the {lookahead}s lookahead, using {fixed:?}",
                wake_period
            );
            fixed
        } else {
            wake_period
        };
        Self { lookahead, wake_period }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportState {
    pub playing: bool,
    pub current_step: usize,  // next step to dispatch, 0 .. NUM_STEPS
    pub bpm: f64,
    pub next_event_time: f64, // audio-clock seconds of `current_step`
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispatchedStep {
    pub step: usize,
    pub time: f64,
}

pub fn clamp_tempo(bpm: f64) -> f64 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Length of one sixteenth-note step at `bpm`.
pub fn step_duration(bpm: f64) -> f64 {
    60.0 / bpm / 4.0
}

pub struct Transport {
    state: TransportState,
    config: TransportConfig,
    recent: VecDeque<DispatchedStep>, // what's been handed to the clock, for the playhead
}

impl Transport {
    pub fn new(config: TransportConfig, bpm: f64) -> Self {
        let mut transport = Self {
            state: TransportState {
                playing: false,
                current_step: 0,
                bpm: DEFAULT_BPM,
                next_event_time: 0.0,
            },
            config,
            recent: VecDeque::with_capacity(NUM_STEPS),
        };
        transport.set_tempo(bpm);
        transport
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn config(&self) -> TransportConfig {
        self.config
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn bpm(&self) -> f64 {
        self.state.bpm
    }

    pub fn next_event_time(&self) -> f64 {
        self.state.next_event_time
    }

    pub fn step_duration(&self) -> f64 {
        step_duration(self.state.bpm)
    }

    /// Store a new tempo, clamped into range. Takes effect at the next step
    /// boundary; steps already handed to the clock keep their times.
    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        if bpm.is_nan() {
            log::debug!("ignoring NaN tempo");
            return self.state.bpm;
        }
        let clamped = clamp_tempo(bpm);
        if clamped != bpm {
            log::debug!("tempo {bpm} clamped to {clamped}");
        }
        self.state.bpm = clamped;
        clamped
    }

    pub fn nudge_tempo(&mut self, delta: f64) -> f64 {
        self.set_tempo(self.state.bpm + delta)
    }

    /// Start playing from the current step. A suspended clock is resumed
    /// first; if that fails nothing changes and the error is returned.
    /// The first wake is requested immediately.
    pub fn start<C, W>(&mut self, clock: &mut C, timer: &mut W) -> Result<(), ClockError>
    where
        C: ClockSource + ?Sized,
        W: WakeTimer + ?Sized,
    {
        if self.state.playing {
            return Ok(());
        }
        if !clock.is_running() {
            clock.resume()?;
        }
        self.state.playing = true;
        self.state.next_event_time = clock.now();
        log::info!(
            "transport started at step {} ({:.1} bpm, clock {:.3}s)",
            self.state.current_step,
            self.state.bpm,
            self.state.next_event_time
        );
        timer.arm(Duration::ZERO);
        Ok(())
    }

    /// Stop dispatching but keep the position, so `start` carries on from here.
    pub fn pause<W: WakeTimer + ?Sized>(&mut self, timer: &mut W) {
        self.state.playing = false;
        timer.cancel();
        log::info!("transport paused at step {}", self.state.current_step);
    }

    /// Stop dispatching and rewind to step 0. Events already handed to the
    /// clock still sound.
    pub fn stop<W: WakeTimer + ?Sized>(&mut self, timer: &mut W) {
        self.state.playing = false;
        self.state.current_step = 0;
        self.recent.clear();
        timer.cancel();
        log::info!("transport stopped");
    }

    /// One wake of the loop. `now` is the audio clock. Every step due before
    /// `now + lookahead` is passed to `dispatch(step, time)` in order, then
    /// the wake loop is re-armed. Returns how many steps were dispatched.
    pub fn tick<W, F>(&mut self, now: f64, timer: &mut W, mut dispatch: F) -> usize
    where
        W: WakeTimer + ?Sized,
        F: FnMut(usize, f64),
    {
        if !self.state.playing {
            return 0;
        }
        self.forget_before(now);
        let horizon = now + self.config.lookahead;
        let mut dispatched = 0;
        while self.state.next_event_time < horizon {
            let step = self.state.current_step;
            let time = self.state.next_event_time;
            dispatch(step, time);
            self.remember(step, time);
            self.advance();
            dispatched += 1;
        }
        if dispatched > 1 {
            log::debug!("late wake: caught up {dispatched} steps");
        }
        if self.state.playing {
            timer.arm(self.config.wake_period);
        }
        dispatched
    }

    /// Move to the next step, one step duration (at the current tempo) later.
    pub fn advance(&mut self) {
        self.state.next_event_time += self.step_duration();
        self.state.current_step = (self.state.current_step + 1) % NUM_STEPS;
    }

    /// The step being heard at audio time `now`: the latest dispatched step
    /// whose start time has been reached.
    pub fn audible_step(&self, now: f64) -> Option<usize> {
        self.recent
            .iter()
            .rev()
            .find(|d| d.time <= now)
            .map(|d| d.step)
    }

    fn remember(&mut self, step: usize, time: f64) {
        self.recent.push_back(DispatchedStep { step, time });
    }

    // Keep the newest step already heard at `now` and everything after it.
    fn forget_before(&mut self, now: f64) {
        while self.recent.get(1).is_some_and(|d| d.time <= now) {
            self.recent.pop_front();
        }
    }
}
