mod config;
pub mod database;
pub mod history;
mod memory;

pub use config::{AppConfig, HistoryConfig, NotificationsConfig, RefreshConfig, ShortcutsConfig};
pub use database::SqliteStore;
pub use history::{ConfigurationStore, HistoryEntry, HISTORY_CAPACITY, HISTORY_KEY};
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "COUNTDOWN_HOME";

/// Minimal persistent string store.
///
/// Backends report failures; callers that must not fail (the history store)
/// decide how to degrade.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Returns `$COUNTDOWN_HOME` if set, otherwise `~/.config/countdown/`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("countdown"),
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
