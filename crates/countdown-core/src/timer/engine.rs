//! Countdown engine.
//!
//! The engine is a wall-clock-anchored state machine. Remaining time is
//! always `total - (now - anchor)`; it is never decremented per callback,
//! so dropped, delayed or coalesced frames cannot skew it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Completed -> Running
//! any  -> Paused (reset)      any -> Idle (go_idle)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(SystemClock, FrameQueue::new());
//! engine.start(&Configuration::new(0, 1, 30));
//! // host loop:
//! if let Some(frame) = engine.scheduler_mut().take_due() {
//!     match engine.on_frame(frame) { /* render */ }
//! }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::clock::Clock;
use super::frame::{FrameHandle, Scheduler};
use super::refresh::{Emitted, RefreshPolicy};
use crate::configuration::Configuration;
use crate::events::Event;
use crate::format::{self, DisplayStrings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Immutable read of the engine at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub state: TimerState,
    pub remaining: Duration,
    pub total: Duration,
}

impl Snapshot {
    /// 0.0 .. 1.0 of the countdown already elapsed.
    pub fn fraction_elapsed(&self) -> f64 {
        format::ring_fraction(self.remaining, self.total)
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state == TimerState::Completed
    }

    pub fn display(&self) -> DisplayStrings {
        format::format(self.remaining, self.total)
    }
}

/// Result of one recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Not running, or a frame that was already cancelled.
    Ignored,
    /// Recomputed, but the view would not change.
    Unchanged,
    Updated(Snapshot),
    /// The countdown just reached zero. Reported once per run.
    Completed(Snapshot),
}

impl Tick {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Tick::Updated(s) | Tick::Completed(s) => Some(s),
            Tick::Ignored | Tick::Unchanged => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Tick::Completed(_))
    }
}

/// Core countdown engine.
///
/// Owns its clock and frame scheduler. Commands that make no sense in the
/// current state return `None` and change nothing.
#[derive(Debug)]
pub struct TimerEngine<C, S> {
    clock: C,
    scheduler: S,
    policy: RefreshPolicy,
    state: TimerState,
    total: Duration,
    /// Cached at every tick and pause; authoritative only while not running.
    remaining: Duration,
    /// Instant elapsed running time is measured from.
    anchor: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    pending_frame: Option<FrameHandle>,
    last_emitted: Option<Emitted>,
}

impl<C: Clock, S: Scheduler> TimerEngine<C, S> {
    pub fn new(clock: C, scheduler: S) -> Self {
        let anchor = clock.now();
        Self {
            clock,
            scheduler,
            policy: RefreshPolicy::default(),
            state: TimerState::Idle,
            total: Duration::ZERO,
            remaining: Duration::ZERO,
            anchor,
            paused_at: None,
            pending_frame: None,
            last_emitted: None,
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending_frame
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            remaining: self.remaining,
            total: self.total,
        }
    }

    /// Build a full state snapshot event.
    pub fn event_snapshot(&self) -> Event {
        let snap = self.snapshot();
        Event::StateSnapshot {
            state: snap.state,
            remaining_ms: as_millis(snap.remaining),
            total_ms: as_millis(snap.total),
            fraction_elapsed: snap.fraction_elapsed(),
            at: self.clock.now(),
        }
    }

    /// `TimerCompleted` for a countdown that has reached zero, stamped with
    /// the instant completion was observed.
    pub fn completed_event(&self) -> Option<Event> {
        if self.state != TimerState::Completed {
            return None;
        }
        Some(Event::TimerCompleted {
            total_ms: as_millis(self.total),
            at: self.last_emitted.map_or_else(|| self.clock.now(), |e| e.at),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a countdown of `configuration`'s length.
    ///
    /// Refused (`None`) for a zero-length configuration. Starting while
    /// already running replaces the current countdown.
    pub fn start(&mut self, configuration: &Configuration) -> Option<Event> {
        if !configuration.is_startable() {
            debug!("refusing to start a zero-length countdown");
            return None;
        }
        if self.state == TimerState::Running {
            debug!("start while running, restarting countdown");
        }
        self.cancel_frame();

        let now = self.clock.now();
        self.total = configuration.total_duration();
        self.remaining = self.total;
        self.anchor = now;
        self.paused_at = None;
        self.last_emitted = None;
        self.state = TimerState::Running;
        self.request_frame();

        debug!(total_secs = self.total.as_secs(), "countdown started");
        Some(Event::TimerStarted {
            total_ms: as_millis(self.total),
            at: now,
        })
    }

    /// Recompute remaining time as of `now`.
    ///
    /// Only meaningful while running; in every other state this is a no-op.
    /// Does not request another frame; see [`on_frame`](Self::on_frame).
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Ignored;
        }

        self.remaining = self.remaining_at(now);

        if self.remaining.is_zero() {
            self.cancel_frame();
            self.state = TimerState::Completed;
            self.last_emitted = Some(Emitted::new(now, Duration::ZERO));
            info!(total_secs = self.total.as_secs(), "countdown completed");
            return Tick::Completed(self.snapshot());
        }

        if self.policy.should_emit(self.last_emitted, now, self.remaining) {
            self.last_emitted = Some(Emitted::new(now, self.remaining));
            Tick::Updated(self.snapshot())
        } else {
            Tick::Unchanged
        }
    }

    /// Deliver a scheduled frame.
    ///
    /// A handle that is not the outstanding request (cancelled by pause,
    /// stop or completion, or superseded by a restart) does nothing.
    /// Otherwise the countdown is recomputed and, if still running, exactly
    /// one further frame is requested.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Tick {
        if self.pending_frame != Some(handle) {
            trace!(frame = handle.id(), "ignoring stale frame");
            return Tick::Ignored;
        }
        self.pending_frame = None;

        let now = self.clock.now();
        let tick = self.tick(now);
        if self.state == TimerState::Running {
            self.request_frame();
        }
        tick
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            debug!(state = ?self.state, "pause ignored");
            return None;
        }
        let now = self.clock.now();
        self.remaining = self.remaining_at(now);
        self.paused_at = Some(now);
        self.state = TimerState::Paused;
        self.cancel_frame();

        debug!(remaining_ms = as_millis(self.remaining), "countdown paused");
        Some(Event::TimerPaused {
            remaining_ms: as_millis(self.remaining),
            at: now,
        })
    }

    /// Continue a paused countdown. The anchor moves forward by the length
    /// of the pause, so paused time never counts as elapsed.
    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            debug!(state = ?self.state, "resume ignored");
            return None;
        }
        let now = self.clock.now();
        let gap = self
            .paused_at
            .map(|at| (now - at).max(chrono::Duration::zero()))
            .unwrap_or_else(chrono::Duration::zero);
        self.anchor += gap;
        self.paused_at = None;
        self.last_emitted = None;
        self.state = TimerState::Running;
        self.request_frame();

        let paused_ms = gap.num_milliseconds().max(0) as u64;
        debug!(paused_ms, "countdown resumed");
        Some(Event::TimerResumed {
            remaining_ms: as_millis(self.remaining),
            paused_ms,
            at: now,
        })
    }

    /// Run a completed countdown again from its full length.
    pub fn resume_from_completed(&mut self) -> Option<Event> {
        if self.state != TimerState::Completed {
            debug!(state = ?self.state, "restart ignored");
            return None;
        }
        let now = self.clock.now();
        self.remaining = self.total;
        self.anchor = now;
        self.paused_at = None;
        self.last_emitted = None;
        self.state = TimerState::Running;
        self.request_frame();

        debug!(total_secs = self.total.as_secs(), "countdown restarted");
        Some(Event::TimerRestarted {
            total_ms: as_millis(self.total),
            at: now,
        })
    }

    /// The single pause/resume button: pause when running, resume when
    /// paused, restart when completed.
    pub fn toggle(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
            TimerState::Completed => self.resume_from_completed(),
            TimerState::Idle => None,
        }
    }

    /// Rewind to the full length and hold, ready to resume.
    ///
    /// Anchor and pause instant are set equal, so an immediate `resume`
    /// applies no correction. Nothing happens before the first start.
    pub fn reset(&mut self) -> Option<Event> {
        if self.total.is_zero() {
            debug!("reset ignored, nothing configured");
            return None;
        }
        self.cancel_frame();
        let now = self.clock.now();
        self.remaining = self.total;
        self.anchor = now;
        self.paused_at = Some(now);
        self.last_emitted = None;
        self.state = TimerState::Paused;

        debug!("countdown reset");
        Some(Event::TimerReset {
            total_ms: as_millis(self.total),
            at: now,
        })
    }

    /// Cancel frame scheduling without touching remaining time.
    ///
    /// A running countdown is frozen as paused so it can still be resumed.
    pub fn stop(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.cancel_frame();
        if self.state == TimerState::Running {
            self.remaining = self.remaining_at(now);
            self.paused_at = Some(now);
            self.state = TimerState::Paused;
        }
        Some(Event::TimerStopped {
            remaining_ms: as_millis(self.remaining),
            at: now,
        })
    }

    /// Drop the countdown entirely (navigating away from the timer).
    pub fn go_idle(&mut self) -> Option<Event> {
        self.cancel_frame();
        let now = self.clock.now();
        self.state = TimerState::Idle;
        self.remaining = self.total;
        self.anchor = now;
        self.paused_at = None;
        self.last_emitted = None;
        debug!("countdown cleared");
        Some(Event::TimerCleared { at: now })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// `total - (now - anchor)`, floored at zero and never above the last
    /// cached value, so the readout cannot climb if the clock steps back.
    fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.anchor).to_std().unwrap_or(Duration::ZERO);
        self.total.saturating_sub(elapsed).min(self.remaining)
    }

    fn request_frame(&mut self) {
        if let Some(old) = self.pending_frame.take() {
            self.scheduler.cancel(old);
        }
        self.pending_frame = Some(self.scheduler.schedule_next_frame());
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel(handle);
        }
    }
}

fn as_millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{FrameQueue, ManualClock};

    const T0: i64 = 1_000_000;

    fn engine() -> (TimerEngine<ManualClock, FrameQueue>, ManualClock) {
        let clock = ManualClock::at_millis(T0);
        (TimerEngine::new(clock.clone(), FrameQueue::new()), clock)
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, _clock) = engine();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(&Configuration::from_minutes(5)).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert!(engine.pending_frame().is_some());

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.pending_frame().is_none());

        assert!(engine.resume().is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn zero_length_start_is_refused() {
        let (mut engine, _clock) = engine();
        assert!(engine.start(&Configuration::ZERO).is_none());
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.scheduler().has_pending());
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let (mut engine, _clock) = engine();
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert!(engine.resume_from_completed().is_none());
        assert!(engine.toggle().is_none());
        assert!(engine.reset().is_none());
        assert!(engine.completed_event().is_none());
        assert_eq!(engine.tick(at(T0 + 5_000)), Tick::Ignored);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn remaining_is_derived_from_anchor() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::new(0, 0, 30));

        // skipping ticks entirely still yields the right value
        let tick = engine.tick(at(T0 + 12_250));
        assert_eq!(tick.snapshot().unwrap().remaining, Duration::from_millis(17_750));
        assert_eq!(engine.remaining(), Duration::from_millis(17_750));
    }

    #[test]
    fn reaching_total_completes_once() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::new(0, 0, 10));

        let tick = engine.tick(at(T0 + 10_000));
        assert!(tick.is_completed());
        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(engine.remaining(), Duration::ZERO);
        assert!(engine.pending_frame().is_none());

        assert_eq!(engine.tick(at(T0 + 11_000)), Tick::Ignored);
        assert_eq!(
            engine.completed_event(),
            Some(Event::TimerCompleted {
                total_ms: 10_000,
                at: at(T0 + 10_000),
            })
        );
    }

    #[test]
    fn overdue_tick_clamps_to_zero() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::new(0, 0, 10));
        let tick = engine.tick(at(T0 + 3_600_000));
        assert_eq!(tick.snapshot().unwrap().remaining, Duration::ZERO);
    }

    #[test]
    fn pause_gap_is_excluded() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(1));

        clock.advance_millis(5_000);
        engine.pause();
        clock.advance_millis(42_000);
        let event = engine.resume().unwrap();
        assert!(matches!(event, Event::TimerResumed { paused_ms: 42_000, .. }));

        let tick = engine.tick(clock.now() + chrono::Duration::seconds(10));
        assert_eq!(tick.snapshot().unwrap().remaining, Duration::from_secs(45));
    }

    #[test]
    fn stale_frame_after_pause_is_noop() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(1));
        let captured = engine.pending_frame().unwrap();

        clock.advance_millis(2_000);
        engine.pause();
        let remaining = engine.remaining();

        clock.advance_millis(2_000);
        assert_eq!(engine.on_frame(captured), Tick::Ignored);
        assert_eq!(engine.remaining(), remaining);
        assert_eq!(engine.state(), TimerState::Paused);

        // still ignored once running again: the handle was superseded
        engine.resume();
        assert_eq!(engine.on_frame(captured), Tick::Ignored);
    }

    #[test]
    fn on_frame_requests_exactly_one_more() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(1));
        let first = engine.scheduler_mut().take_due().unwrap();

        clock.advance_millis(1_000);
        assert!(matches!(engine.on_frame(first), Tick::Updated(_)));
        let second = engine.pending_frame().unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.scheduler().pending(), Some(second));
    }

    #[test]
    fn reset_then_resume_restores_full_length() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(2));
        clock.advance_millis(30_000);
        engine.tick(clock.now());

        engine.reset();
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.paused_at(), Some(engine.anchor()));

        engine.resume();
        let tick = engine.tick(clock.now());
        assert_eq!(tick.snapshot().unwrap().remaining, Duration::from_secs(120));
    }

    #[test]
    fn restart_after_completion() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::new(0, 0, 5));
        clock.advance_millis(5_000);
        engine.tick(clock.now());
        assert_eq!(engine.state(), TimerState::Completed);

        assert!(matches!(engine.toggle(), Some(Event::TimerRestarted { .. })));
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.remaining(), Duration::from_secs(5));
        assert_eq!(engine.anchor(), clock.now());
    }

    #[test]
    fn start_while_running_replaces_countdown() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(10));
        let old_frame = engine.pending_frame().unwrap();
        clock.advance_millis(60_000);

        engine.start(&Configuration::from_minutes(3));
        assert_eq!(engine.total(), Duration::from_secs(180));
        assert_eq!(engine.remaining(), Duration::from_secs(180));
        assert_eq!(engine.on_frame(old_frame), Tick::Ignored);
        assert_eq!(engine.scheduler().cancelled_count(), 1);
    }

    #[test]
    fn stop_keeps_remaining() {
        let (mut engine, clock) = engine();
        engine.start(&Configuration::from_minutes(1));
        clock.advance_millis(20_000);
        engine.stop();
        assert_eq!(engine.remaining(), Duration::from_secs(40));
        assert!(engine.pending_frame().is_none());
        assert_eq!(engine.state(), TimerState::Paused);
    }

    #[test]
    fn go_idle_returns_to_idle() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::from_minutes(1));
        engine.go_idle();
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.scheduler().has_pending());
    }

    #[test]
    fn readout_never_climbs_when_clock_steps_back() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::from_minutes(1));
        engine.tick(at(T0 + 10_000));
        engine.tick(at(T0 + 4_000));
        assert_eq!(engine.remaining(), Duration::from_secs(50));
    }

    #[test]
    fn coarse_refresh_skips_redundant_snapshots() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::from_minutes(5));

        assert!(matches!(engine.tick(at(T0 + 100)), Tick::Updated(_)));
        assert_eq!(engine.tick(at(T0 + 200)), Tick::Unchanged);
        assert!(matches!(engine.tick(at(T0 + 1_150)), Tick::Updated(_)));
    }

    #[test]
    fn final_minute_refreshes_at_frame_rate() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::new(0, 0, 30));

        assert!(matches!(engine.tick(at(T0 + 100)), Tick::Updated(_)));
        assert_eq!(engine.tick(at(T0 + 110)), Tick::Unchanged);
        assert!(matches!(engine.tick(at(T0 + 116)), Tick::Updated(_)));
    }

    #[test]
    fn tenths_redraw_with_a_narrow_high_frequency_window() {
        let (engine, _clock) = engine();
        let mut engine = engine.with_policy(RefreshPolicy {
            high_frequency_below: Duration::from_secs(30),
            ..RefreshPolicy::default()
        });
        engine.start(&Configuration::new(0, 0, 50));

        let first = engine.tick(at(T0 + 4_050));
        assert_eq!(first.snapshot().unwrap().display().display, "45.9");
        assert_eq!(engine.tick(at(T0 + 4_090)), Tick::Unchanged);

        let later = engine.tick(at(T0 + 4_600));
        assert_eq!(later.snapshot().unwrap().display().display, "45.4");
    }

    #[test]
    fn snapshot_event_carries_progress() {
        let (mut engine, _clock) = engine();
        engine.start(&Configuration::new(0, 0, 40));
        engine.tick(at(T0 + 10_000));
        match engine.event_snapshot() {
            Event::StateSnapshot {
                state,
                remaining_ms,
                total_ms,
                fraction_elapsed,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(remaining_ms, 30_000);
                assert_eq!(total_ms, 40_000);
                assert!((fraction_elapsed - 0.25).abs() < 1e-9);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }
}
