//! Exclusive lock on the data directory.
//!
//! Only one process may mutate a store at a time. The lock is an OS advisory
//! lock on `<data dir>/focusroom.lock`, released when the guard is dropped or
//! the process exits. The file itself is left in place.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::data_dir;
use crate::error::StorageError;

const LOCK_FILE: &str = "focusroom.lock";

/// Held for as long as a mutating session is open.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Lock the default data directory without waiting.
    ///
    /// # Errors
    /// [`StorageError::Locked`] if another process holds the lock.
    pub fn acquire() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::acquire_in(&dir)
    }

    /// Lock `dir` without waiting.
    ///
    /// # Errors
    /// [`StorageError::Locked`] if the lock is taken, `Unavailable` if the
    /// lock file cannot be opened.
    pub fn acquire_in(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::Unavailable(format!("{}: {e}", path.display())))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "session lock acquired");
                Ok(Self { file, path })
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(StorageError::Locked { path })
            }
            Err(e) => Err(StorageError::Unavailable(format!("{}: {e}", path.display()))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
