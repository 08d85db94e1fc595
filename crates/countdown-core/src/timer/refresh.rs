//! Display refresh policy.
//!
//! Outside the high-frequency window a redraw happens only when the rendered
//! readout changes (whole seconds, or tenths once the readout carries them).
//! Inside it snapshots are emitted at frame rate, capped by a minimum
//! wall-clock interval.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::format::readout_key;

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const DEFAULT_HIGH_FREQUENCY_BELOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPolicy {
    /// Minimum wall-clock advance between sub-minute snapshots.
    pub frame_interval: Duration,
    /// Remaining time below which sub-second refresh kicks in.
    pub high_frequency_below: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            high_frequency_below: DEFAULT_HIGH_FREQUENCY_BELOW,
        }
    }
}

/// What was last handed to the display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Emitted {
    pub at: DateTime<Utc>,
    /// [`readout_key`] of the emitted remaining time.
    pub readout: u64,
}

impl Emitted {
    pub fn new(at: DateTime<Utc>, remaining: Duration) -> Self {
        Self {
            at,
            readout: readout_key(remaining),
        }
    }
}

impl RefreshPolicy {
    pub fn is_high_frequency(&self, remaining: Duration) -> bool {
        remaining < self.high_frequency_below
    }

    /// Whether a snapshot for `remaining` at `now` would change the view.
    pub(crate) fn should_emit(
        &self,
        last: Option<Emitted>,
        now: DateTime<Utc>,
        remaining: Duration,
    ) -> bool {
        let Some(last) = last else {
            return true;
        };
        if self.is_high_frequency(remaining) {
            let since = (now - last.at).to_std().unwrap_or(Duration::ZERO);
            since >= self.frame_interval
        } else {
            readout_key(remaining) != last.readout
        }
    }
}
