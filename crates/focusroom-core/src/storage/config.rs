//! TOML-based application configuration.
//!
//! Stores:
//! - Initial session settings used before anything has been persisted
//! - Timer engine behaviour (tick period, auto-advance)
//! - Persistence cadence (tick-save throttle, write debounce)
//! - Stats conventions (week start, goals)
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::SoundId;
use crate::session::Settings;
use crate::stats::WeekStart;

/// Settings a brand-new session starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,
    #[serde(default = "default_break_secs")]
    pub break_secs: u64,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u64,
    #[serde(default = "default_pomodoros_until_long_break")]
    pub pomodoros_until_long_break: u64,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_work_end_sound")]
    pub work_end_sound: SoundId,
    #[serde(default = "default_break_end_sound")]
    pub break_end_sound: SoundId,
}

/// Timer engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Start the next phase automatically after one completes.
    #[serde(default)]
    pub auto_advance: bool,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Persistence cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// While running, save whenever the remaining seconds are a multiple of this.
    #[serde(default = "default_save_every_secs")]
    pub save_every_secs: u64,
    /// Minimum spacing between two writes; 0 writes through.
    #[serde(default)]
    pub debounce_ms: u64,
}

/// Stats conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub week_start: WeekStart,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u64,
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

// Default functions
fn default_work_secs() -> u64 {
    25 * 60
}
fn default_break_secs() -> u64 {
    5 * 60
}
fn default_long_break_secs() -> u64 {
    15 * 60
}
fn default_pomodoros_until_long_break() -> u64 {
    4
}
fn default_true() -> bool {
    true
}
fn default_work_end_sound() -> SoundId {
    SoundId::Alarm
}
fn default_break_end_sound() -> SoundId {
    SoundId::Default
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_save_every_secs() -> u64 {
    10
}
fn default_daily_goal() -> u64 {
    8
}
fn default_weekly_goal() -> u64 {
    40
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            break_secs: default_break_secs(),
            long_break_secs: default_long_break_secs(),
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
            sound_enabled: true,
            work_end_sound: default_work_end_sound(),
            break_end_sound: default_break_end_sound(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            auto_advance: false,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_every_secs: default_save_every_secs(),
            debounce_ms: 0,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Sunday,
            daily_goal: default_daily_goal(),
            weekly_goal: default_weekly_goal(),
        }
    }
}

impl Config {
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
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
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

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or defaults cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a value by dot-separated key, typed by the value already there.
    ///
    /// Does not write to disk; call [`Config::save`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Settings for a session that has no persisted state yet.
    pub fn initial_settings(&self) -> Settings {
        let d = &self.defaults;
        Settings {
            work_duration: d.work_secs,
            break_duration: d.break_secs,
            long_break_duration: d.long_break_secs,
            pomodoros_until_long_break: d.pomodoros_until_long_break,
            sound_enabled: d.sound_enabled,
            work_end_sound: d.work_end_sound,
            break_end_sound: d.break_end_sound,
        }
        .sanitized()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
