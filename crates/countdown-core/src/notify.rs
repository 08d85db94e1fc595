//! Completion side effects.

use std::time::Duration;

/// Vibration pattern played on completion: buzz, pause, buzz, pause, buzz.
pub const VIBRATION_PATTERN_MS: [u64; 5] = [200, 100, 200, 100, 200];

/// How long the visual completion indicator stays on.
pub const COMPLETION_INDICATOR: Duration = Duration::from_secs(3);

/// Invoked exactly once each time a countdown reaches zero.
pub trait CompletionNotifier {
    fn notify_complete(&mut self, total: Duration);
}

/// Counts notifications; handy for hosts that poll instead of react.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub completions: Vec<Duration>,
}

impl CompletionNotifier for RecordingNotifier {
    fn notify_complete(&mut self, total: Duration) {
        self.completions.push(total);
    }
}
