//! SQLite-backed persistent store.
//!
//! The session root lives in a small key-value table under [`STORAGE_KEY`].

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection};

use super::{data_dir, PersistentStore, STORAGE_KEY};
use crate::error::StorageError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// SQLite database holding the persisted session blob.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/focusroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("focusroom.db"))
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // Readers may overlap a running timer's saves.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl PersistentStore for Database {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.kv_get(STORAGE_KEY)?.map(String::into_bytes))
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;
        self.kv_set(STORAGE_KEY, text)?;
        Ok(())
    }
}
