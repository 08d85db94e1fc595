//! The hours/minutes/seconds value a user dials in before starting.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const MAX_HOURS: u8 = 99;
pub const MAX_MINUTES: u8 = 59;
pub const MAX_SECONDS: u8 = 59;

/// Which field of a [`Configuration`] an adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn max(self) -> u8 {
        match self {
            TimeUnit::Hours => MAX_HOURS,
            TimeUnit::Minutes => MAX_MINUTES,
            TimeUnit::Seconds => MAX_SECONDS,
        }
    }
}

/// A countdown length.
///
/// Every constructor and mutator clamps the fields into
/// `hours 0..=99`, `minutes 0..=59`, `seconds 0..=59`. A zero total is a
/// valid value but cannot be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Configuration {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Configuration {
    pub const ZERO: Configuration = Configuration {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Build a configuration, clamping each component into range.
    pub fn new(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            hours: clamp_unit(hours, TimeUnit::Hours),
            minutes: clamp_unit(minutes, TimeUnit::Minutes),
            seconds: clamp_unit(seconds, TimeUnit::Seconds),
        }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self::new(0, minutes, 0)
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn get(&self, unit: TimeUnit) -> u8 {
        match unit {
            TimeUnit::Hours => self.hours,
            TimeUnit::Minutes => self.minutes,
            TimeUnit::Seconds => self.seconds,
        }
    }

    /// Add `delta` to one unit, saturating at both ends of its range.
    pub fn adjust(&mut self, unit: TimeUnit, delta: i32) {
        let next = clamp_unit(i64::from(self.get(unit)) + i64::from(delta), unit);
        match unit {
            TimeUnit::Hours => self.hours = next,
            TimeUnit::Minutes => self.minutes = next,
            TimeUnit::Seconds => self.seconds = next,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_secs(self.total_seconds())
    }

    /// A zero-length configuration is not startable.
    pub fn is_startable(&self) -> bool {
        self.total_seconds() > 0
    }
}

fn clamp_unit(value: i64, unit: TimeUnit) -> u8 {
    value.clamp(0, i64::from(unit.max())) as u8
}

// Deserialize through the clamping constructor so hand-edited or corrupted
// values can never produce an out-of-range configuration.
impl<'de> Deserialize<'de> for Configuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            hours: i64,
            #[serde(default)]
            minutes: i64,
            #[serde(default)]
            seconds: i64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Configuration::new(raw.hours, raw.minutes, raw.seconds))
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}h{:02}m{:02}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            write!(f, "{}m{:02}s", self.minutes, self.seconds)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

/// Parses `90`, `1m30s`, `1h5m`, `01:30` or `1:02:03`.
///
/// A bare number is taken as seconds and spread across the units, so `90`
/// becomes one minute thirty. Components past their range are clamped.
impl FromStr for Configuration {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::Custom("empty duration".into()));
        }
        let invalid = || CoreError::Custom(format!("invalid duration: '{s}'"));

        if s.contains(':') {
            let parts = s
                .split(':')
                .map(|p| p.parse::<i64>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()?;
            return match parts.as_slice() {
                [m, sec] => Ok(Configuration::new(0, *m, *sec)),
                [h, m, sec] => Ok(Configuration::new(*h, *m, *sec)),
                _ => Err(invalid()),
            };
        }

        if let Ok(total) = s.parse::<i64>() {
            let total = total.max(0);
            return Ok(Configuration::new(total / 3600, (total % 3600) / 60, total % 60));
        }

        let (mut h, mut m, mut sec) = (0i64, 0i64, 0i64);
        let mut digits = String::new();
        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let value = digits.parse::<i64>().map_err(|_| invalid())?;
            digits.clear();
            match c.to_ascii_lowercase() {
                'h' => h = value,
                'm' => m = value,
                's' => sec = value,
                _ => return Err(invalid()),
            }
        }
        if !digits.is_empty() {
            return Err(invalid());
        }
        Ok(Configuration::new(h, m, sec))
    }
}
