mod config;
pub mod database;
mod lock;
mod writer;

pub use config::{
    Config, DefaultsConfig, PersistenceConfig, StatsConfig, TimerConfig,
};
pub use database::Database;
pub use lock::SessionLock;
pub use writer::DebouncedWriter;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

/// Fixed key the session root is stored under.
pub const STORAGE_KEY: &str = "pomodoro_data";

/// Durable home for the serialized session root.
///
/// Implementations hold a single opaque blob; they know nothing about its
/// shape.
pub trait PersistentStore: Send {
    /// `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError>;
    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Shared in-memory blob. Clones see the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(bytes.into()))),
        }
    }

    /// Current blob, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.blob.lock().ok().and_then(|b| b.clone())
    }
}

impl PersistentStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let blob = self
            .blob
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(blob.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut blob = self
            .blob
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *blob = Some(bytes.to_vec());
        Ok(())
    }
}

/// Returns the data directory, creating it if needed.
///
/// `FOCUSROOM_DATA_DIR` wins when set. Otherwise `~/.config/focusroom`, or
/// `~/.config/focusroom-dev` when `FOCUSROOM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FOCUSROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusroom-dev")
            } else {
                base_dir.join("focusroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
