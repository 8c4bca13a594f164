//! Core error types for focusroom-core.
//!
//! Session operations themselves never fail: invalid requests are no-ops and
//! storage problems degrade to defaults. The types here describe the failures
//! that the outer surfaces (stores, configuration, CLI) can still observe.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The timer engine task has exited
    #[error("Timer engine is not running")]
    EngineStopped,
}

/// Errors raised by a [`PersistentStore`](crate::storage::PersistentStore).
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store could not be read or written.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The stored blob could not be decoded.
    #[error("Malformed persisted data: {0}")]
    Malformed(String),

    /// Another process holds the session lock.
    #[error("Another focusroom session is active (lock held on {})", path.display())]
    Locked { path: PathBuf },

    /// Failed to open the backing database.
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Malformed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
