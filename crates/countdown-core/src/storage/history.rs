//! Recently started configurations and the quick-select shortcuts derived
//! from them.
//!
//! History lives as a JSON list under a single key, newest first, at most
//! [`HISTORY_CAPACITY`] entries. Every storage or parse failure degrades to
//! "no history"; nothing here returns an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::configuration::Configuration;

pub const HISTORY_KEY: &str = "countdown.history";
pub const HISTORY_CAPACITY: usize = 4;
pub const SHORTCUT_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Epoch milliseconds of the most recent start.
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(configuration: &Configuration, at: DateTime<Utc>) -> Self {
        Self {
            hours: i64::from(configuration.hours()),
            minutes: i64::from(configuration.minutes()),
            seconds: i64::from(configuration.seconds()),
            timestamp: at.timestamp_millis(),
        }
    }

    /// The stored value, clamped back into range.
    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.hours, self.minutes, self.seconds)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    fn same_duration(&self, configuration: &Configuration) -> bool {
        self.configuration() == *configuration
    }
}

/// Owns the persisted history. The engine never touches it; the session
/// saves a configuration when a countdown starts.
pub struct ConfigurationStore<K> {
    store: K,
}

impl<K: KeyValueStore> ConfigurationStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &K {
        &self.store
    }

    /// Stored entries, newest first. Missing or unreadable data is empty.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("history unavailable: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Err(e) => {
                warn!("discarding unreadable history: {e}");
                Vec::new()
            }
        }
    }

    /// Record a started configuration at the current time.
    pub fn save(&mut self, configuration: &Configuration) {
        self.save_at(configuration, Utc::now());
    }

    /// Record a started configuration.
    ///
    /// Zero-length configurations are ignored. Repeating the newest entry
    /// only refreshes its timestamp; anything else is prepended and the list
    /// cut back to capacity.
    pub fn save_at(&mut self, configuration: &Configuration, at: DateTime<Utc>) {
        if !configuration.is_startable() {
            return;
        }
        let mut entries = self.history();
        match entries.first_mut() {
            Some(newest) if newest.same_duration(configuration) => {
                newest.timestamp = at.timestamp_millis();
            }
            _ => {
                entries.insert(0, HistoryEntry::new(configuration, at));
                entries.truncate(HISTORY_CAPACITY);
            }
        }
        debug!(%configuration, len = entries.len(), "saving history");
        self.write(&entries);
    }

    pub fn most_recent(&self) -> Option<Configuration> {
        self.history().first().map(HistoryEntry::configuration)
    }

    /// Three quick-select durations.
    ///
    /// Entries after the newest one (which is the "current" configuration)
    /// are sorted ascending by length; slots they cannot fill take the
    /// default at the same position.
    pub fn shortcuts(
        &self,
        defaults: [Configuration; SHORTCUT_COUNT],
    ) -> [Configuration; SHORTCUT_COUNT] {
        let mut recent: Vec<Configuration> = self
            .history()
            .iter()
            .skip(1)
            .take(SHORTCUT_COUNT)
            .map(HistoryEntry::configuration)
            .collect();
        recent.sort_by_key(Configuration::total_seconds);

        let mut out = defaults;
        for (slot, configuration) in out.iter_mut().zip(recent) {
            *slot = configuration;
        }
        out
    }

    pub fn clear(&mut self) {
        self.write(&[]);
    }

    fn write(&mut self, entries: &[HistoryEntry]) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to encode history: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &json) {
            warn!("failed to persist history: {e}");
        }
    }
}
