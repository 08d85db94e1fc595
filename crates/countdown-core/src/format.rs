//! Display strings for a remaining duration.
//!
//! Pure functions with no state; safe to call every frame.

use std::time::Duration;

use serde::Serialize;

/// Remaining time below which the readout switches to `S.T`.
pub const TENTHS_BELOW: Duration = Duration::from_secs(60);

/// Everything a display needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayStrings {
    /// Shortest sufficient readout: `H:MM:SS`, `M:SS`, or `S.T` under a minute.
    pub display: String,
    /// Fixed-shape readout that never drops below `M:SS`.
    pub clock: String,
    /// Tenths digit, present only in the sub-minute form.
    pub tenths: Option<u8>,
    /// Whole percent of the countdown already elapsed.
    pub percentage: u8,
    /// Elapsed fraction in `[0, 1]` for progress-arc rendering.
    pub ring_fraction: f64,
}

impl DisplayStrings {
    /// Dash offset for a progress ring of the given circumference.
    pub fn ring_offset(&self, circumference: f64) -> f64 {
        circumference * self.ring_fraction
    }
}

/// Hours, minutes and seconds of the truncated whole-second value.
pub fn split_hms(remaining: Duration) -> (u64, u64, u64) {
    let whole = remaining.as_secs();
    (whole / 3600, (whole % 3600) / 60, whole % 60)
}

/// Sub-second digit, `floor(frac * 10)`. Computed on whole nanoseconds so
/// it is always in `0..=9`.
pub fn tenths(remaining: Duration) -> u8 {
    (remaining.subsec_nanos() / 100_000_000).min(9) as u8
}

/// The value the `display` readout is derived from: tenths of a second
/// under [`TENTHS_BELOW`], whole seconds above it. Two durations with the
/// same key render identically.
pub fn readout_key(remaining: Duration) -> u64 {
    if remaining < TENTHS_BELOW {
        remaining.as_secs() * 10 + u64::from(tenths(remaining))
    } else {
        remaining.as_secs()
    }
}

/// Elapsed fraction in `[0, 1]`; zero when `total` is zero.
pub fn ring_fraction(remaining: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (1.0 - remaining.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

pub fn percentage(remaining: Duration, total: Duration) -> u8 {
    (ring_fraction(remaining, total) * 100.0).round() as u8
}

/// Two-digit readout used by the hours/minutes/seconds editor.
pub fn pad_zero(n: u8) -> String {
    format!("{n:02}")
}

pub fn format(remaining: Duration, total: Duration) -> DisplayStrings {
    let (h, m, s) = split_hms(remaining);

    let (display, digit) = if remaining < TENTHS_BELOW {
        let t = tenths(remaining);
        (format!("{s}.{t}"), Some(t))
    } else if h > 0 {
        (format!("{h}:{m:02}:{s:02}"), None)
    } else {
        (format!("{m}:{s:02}"), None)
    };

    let clock = if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    };

    DisplayStrings {
        display,
        clock,
        tenths: digit,
        percentage: percentage(remaining, total),
        ring_fraction: ring_fraction(remaining, total),
    }
}
