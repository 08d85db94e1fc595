use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every engine transition produces an Event.
/// A command that is invalid in the current state produces none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        /// How long the countdown sat paused.
        paused_ms: u64,
        at: DateTime<Utc>,
    },
    /// A completed countdown was started over from its full length.
    TimerRestarted {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    /// Frame scheduling was cancelled without resetting the countdown.
    TimerStopped {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// The countdown was dropped and the engine is idle again.
    TimerCleared {
        at: DateTime<Utc>,
    },
    TimerCompleted {
        total_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_ms: u64,
        total_ms: u64,
        fraction_elapsed: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Instant the event was produced.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerRestarted { at, .. }
            | Event::TimerReset { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::TimerCleared { at }
            | Event::TimerCompleted { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
