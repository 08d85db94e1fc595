//! Wall-clock sources for the timer engine.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

/// Something that can tell the current wall-clock time.
///
/// Real deployments use [`SystemClock`]. Must be wall time, not monotonic:
/// time spent suspended or backgrounded counts as elapsed.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock. Clones share the same instant, so a test can keep one
/// handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Start at the given epoch milliseconds.
    pub fn at_millis(epoch_ms: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(epoch_ms).unwrap_or_default())
    }

    pub fn advance(&self, by: std::time::Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        self.now.set(self.now.get() + step);
    }

    pub fn advance_millis(&self, ms: i64) {
        self.now.set(self.now.get() + chrono::Duration::milliseconds(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
