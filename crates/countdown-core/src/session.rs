//! The layer a UI talks to.
//!
//! A [`CountdownSession`] owns the configuration being edited, the engine,
//! the history store and the completion notifier. It turns user intents into
//! engine commands and engine snapshots into [`ViewFrame`]s; it never draws
//! anything itself.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::configuration::{Configuration, TimeUnit};
use crate::events::Event;
use crate::format::{self, pad_zero};
use crate::notify::CompletionNotifier;
use crate::storage::{AppConfig, ConfigurationStore, HistoryEntry, KeyValueStore};
use crate::timer::{Clock, FrameHandle, Scheduler, Tick, TimerEngine, TimerState};

/// What a display paints for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewFrame {
    pub display: String,
    pub clock: String,
    pub percentage: u8,
    pub ring_fraction: f64,
    pub is_running: bool,
    pub is_complete: bool,
    /// The temporary "just finished" highlight is on.
    pub completion_indicator: bool,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Fallback shortcuts, ascending.
    pub shortcut_defaults: [Configuration; 3],
    pub remember_history: bool,
    pub notify: bool,
    pub indicator: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            shortcut_defaults: config.default_shortcuts(),
            remember_history: config.history.enabled,
            notify: config.notifications.enabled,
            indicator: config.indicator_duration(),
        }
    }
}

pub struct CountdownSession<C, S, K, N> {
    engine: TimerEngine<C, S>,
    store: ConfigurationStore<K>,
    notifier: N,
    options: SessionOptions,
    configuration: Configuration,
    completed_at: Option<DateTime<Utc>>,
}

impl<C, S, K, N> CountdownSession<C, S, K, N>
where
    C: Clock,
    S: Scheduler,
    K: KeyValueStore,
    N: CompletionNotifier,
{
    /// The editor starts out holding the most recently used configuration.
    pub fn new(
        engine: TimerEngine<C, S>,
        store: ConfigurationStore<K>,
        notifier: N,
        options: SessionOptions,
    ) -> Self {
        let configuration = store.most_recent().unwrap_or_default();
        Self {
            engine,
            store,
            notifier,
            options,
            configuration,
            completed_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn configuration(&self) -> Configuration {
        self.configuration
    }

    /// Two-digit hours, minutes, seconds for the editor.
    pub fn editor(&self) -> [String; 3] {
        [
            pad_zero(self.configuration.hours()),
            pad_zero(self.configuration.minutes()),
            pad_zero(self.configuration.seconds()),
        ]
    }

    /// Whether the start control should be enabled.
    pub fn can_start(&self) -> bool {
        self.configuration.is_startable()
    }

    pub fn state(&self) -> TimerState {
        self.engine.state()
    }

    pub fn engine(&self) -> &TimerEngine<C, S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimerEngine<C, S> {
        &mut self.engine
    }

    pub fn store(&self) -> &ConfigurationStore<K> {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.store.history()
    }

    pub fn shortcuts(&self) -> [Configuration; 3] {
        self.store.shortcuts(self.options.shortcut_defaults)
    }

    pub fn completion_indicator_active(&self) -> bool {
        self.completed_at
            .and_then(|at| (self.engine.now() - at).to_std().ok())
            .is_some_and(|since| since < self.options.indicator)
    }

    pub fn view(&self) -> ViewFrame {
        let snap = self.engine.snapshot();
        let strings = format::format(snap.remaining, snap.total);
        ViewFrame {
            display: strings.display,
            clock: strings.clock,
            percentage: strings.percentage,
            ring_fraction: strings.ring_fraction,
            is_running: snap.is_running(),
            is_complete: snap.is_complete(),
            completion_indicator: self.completion_indicator_active(),
        }
    }

    // ── Intents ──────────────────────────────────────────────────────

    pub fn adjust(&mut self, unit: TimeUnit, delta: i32) -> Configuration {
        self.configuration.adjust(unit, delta);
        self.configuration
    }

    pub fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    /// Start the edited configuration and remember it.
    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start(&self.configuration)?;
        if self.options.remember_history {
            self.store.save_at(&self.configuration, event.at());
        }
        self.completed_at = None;
        Some(event)
    }

    /// Load a shortcut into the editor and start it.
    pub fn select_shortcut(&mut self, configuration: Configuration) -> Option<Event> {
        self.configuration = configuration;
        self.start()
    }

    /// Pause, resume, or restart after completion.
    pub fn toggle_pause(&mut self) -> Option<Event> {
        let event = self.engine.toggle();
        if matches!(event, Some(Event::TimerRestarted { .. })) {
            self.completed_at = None;
        }
        event
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.completed_at = None;
        self.engine.reset()
    }

    /// Leave the countdown and return to the editor.
    pub fn go_home(&mut self) -> Option<Event> {
        self.completed_at = None;
        self.engine.go_idle()
    }

    // ── Frames ───────────────────────────────────────────────────────

    /// Deliver a scheduled frame. Returns a frame to paint when the view
    /// changed.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<ViewFrame> {
        let tick = self.engine.on_frame(handle);
        self.absorb(tick)
    }

    /// Recompute against the clock without a scheduled frame.
    pub fn refresh(&mut self) -> Option<ViewFrame> {
        let now = self.engine.now();
        let tick = self.engine.tick(now);
        self.absorb(tick)
    }

    fn absorb(&mut self, tick: Tick) -> Option<ViewFrame> {
        match tick {
            Tick::Completed(snap) => {
                self.completed_at = Some(self.engine.now());
                if self.options.notify {
                    debug!("notifying completion");
                    self.notifier.notify_complete(snap.total);
                }
                Some(self.view())
            }
            Tick::Updated(_) => Some(self.view()),
            Tick::Ignored | Tick::Unchanged => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use crate::timer::{FrameQueue, ManualClock};

    type Session = CountdownSession<ManualClock, FrameQueue, MemoryStore, RecordingNotifier>;

    fn session() -> (Session, ManualClock) {
        let clock = ManualClock::at_millis(1_000);
        let engine = TimerEngine::new(clock.clone(), FrameQueue::new());
        let session = CountdownSession::new(
            engine,
            ConfigurationStore::new(MemoryStore::new()),
            RecordingNotifier::default(),
            SessionOptions::default(),
        );
        (session, clock)
    }

    #[test]
    fn editor_pads_and_gates_start() {
        let (mut session, _clock) = session();
        assert!(!session.can_start());
        assert!(session.start().is_none());

        session.adjust(TimeUnit::Minutes, 5);
        session.adjust(TimeUnit::Seconds, -1);
        assert_eq!(session.editor(), ["00", "05", "00"]);
        assert!(session.can_start());
    }

    #[test]
    fn start_records_history() {
        let (mut session, _clock) = session();
        session.set_configuration(Configuration::new(0, 1, 30));
        session.start().unwrap();
        assert_eq!(session.store().most_recent(), Some(Configuration::new(0, 1, 30)));
        assert_eq!(session.history()[0].timestamp, 1_000);
    }

    #[test]
    fn history_can_be_disabled() {
        let clock = ManualClock::at_millis(0);
        let mut session = CountdownSession::new(
            TimerEngine::new(clock, FrameQueue::new()),
            ConfigurationStore::new(MemoryStore::new()),
            RecordingNotifier::default(),
            SessionOptions {
                remember_history: false,
                ..SessionOptions::default()
            },
        );
        session.select_shortcut(Configuration::from_minutes(1)).unwrap();
        assert!(session.history().is_empty());
    }

    #[test]
    fn completion_notifies_once_and_lights_indicator() {
        let (mut session, clock) = session();
        session.set_configuration(Configuration::new(0, 0, 2));
        session.start();

        clock.advance_millis(2_500);
        let frame = session.engine_mut().scheduler_mut().take_due().unwrap();
        let view = session.on_frame(frame).unwrap();
        assert!(view.is_complete);
        assert!(view.completion_indicator);
        assert_eq!(view.display, "0.0");
        assert!(session.engine().scheduler().pending().is_none());

        assert!(session.refresh().is_none());
        assert_eq!(session.notifier().completions, vec![Duration::from_secs(2)]);

        clock.advance_millis(3_000);
        assert!(!session.completion_indicator_active());
    }

    #[test]
    fn new_session_prefills_last_configuration() {
        let mut store = ConfigurationStore::new(MemoryStore::new());
        store.save_at(&Configuration::from_minutes(7), DateTime::from_timestamp_millis(5).unwrap());
        let session = CountdownSession::new(
            TimerEngine::new(ManualClock::at_millis(0), FrameQueue::new()),
            store,
            RecordingNotifier::default(),
            SessionOptions::default(),
        );
        assert_eq!(session.configuration(), Configuration::from_minutes(7));
    }

    #[test]
    fn go_home_cancels_and_idles() {
        let (mut session, _clock) = session();
        session.select_shortcut(Configuration::from_minutes(1));
        assert!(session.go_home().is_some());
        assert_eq!(session.state(), TimerState::Idle);
        assert!(session.engine().scheduler().pending().is_none());
    }
}
