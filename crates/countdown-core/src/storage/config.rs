//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Display refresh tuning
//! - Default quick-select shortcuts
//! - Completion notification behavior
//! - Whether started countdowns are remembered
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::configuration::Configuration;
use crate::error::ConfigError;
use crate::notify::COMPLETION_INDICATOR;
use crate::timer::RefreshPolicy;

/// Display refresh tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Minimum milliseconds between sub-minute redraws.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Remaining seconds below which redraws run at frame rate. Above it a
    /// redraw happens whenever the rendered readout changes.
    #[serde(default = "default_high_frequency_below_secs")]
    pub high_frequency_below_secs: u64,
}

/// Fallback shortcuts, ascending by length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutsConfig {
    #[serde(default = "default_shortcuts")]
    pub defaults: [Configuration; 3],
}

/// Completion notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
    /// How long the completion indicator stays lit.
    #[serde(default = "default_indicator_secs")]
    pub indicator_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

// Default functions
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_high_frequency_below_secs() -> u64 {
    60
}
fn default_shortcuts() -> [Configuration; 3] {
    [
        Configuration::from_minutes(1),
        Configuration::from_minutes(5),
        Configuration::from_minutes(10),
    ]
}
fn default_true() -> bool {
    true
}
fn default_indicator_secs() -> u64 {
    COMPLETION_INDICATOR.as_secs()
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            high_frequency_below_secs: default_high_frequency_below_secs(),
        }
    }
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            defaults: default_shortcuts(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vibration: true,
            indicator_secs: default_indicator_secs(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match Self::read(&path)? {
            Some(cfg) => Ok(cfg),
            None => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Parse the file at `path`; `None` when it cannot be read.
    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Ok(None);
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("using default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy {
            frame_interval: Duration::from_millis(self.refresh.frame_interval_ms.max(1)),
            high_frequency_below: Duration::from_secs(self.refresh.high_frequency_below_secs),
        }
    }

    /// Default shortcuts, sorted ascending regardless of how they were entered.
    pub fn default_shortcuts(&self) -> [Configuration; 3] {
        let mut defaults = self.shortcuts.defaults;
        defaults.sort_by_key(Configuration::total_seconds);
        defaults
    }

    pub fn indicator_duration(&self) -> Duration {
        Duration::from_secs(self.notifications.indicator_secs)
    }
}
