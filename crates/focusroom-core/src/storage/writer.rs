//! Debounced, fire-and-forget writer in front of a [`PersistentStore`].
//!
//! A save request is written immediately unless the previous write is younger
//! than the debounce window; then the root is only marked dirty and goes out
//! with the next due request or an explicit [`DebouncedWriter::flush`].
//! Failed writes are logged and dropped. Nothing is retried.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::PersistentStore;
use crate::session::SessionData;

pub struct DebouncedWriter {
    store: Box<dyn PersistentStore>,
    debounce: Duration,
    last_write_at: Option<DateTime<Utc>>,
    dirty: bool,
    writes: u64,
    failures: u64,
}

impl DebouncedWriter {
    pub fn new(store: Box<dyn PersistentStore>, debounce_ms: u64) -> Self {
        Self {
            store,
            debounce: Duration::milliseconds(i64::try_from(debounce_ms).unwrap_or(i64::MAX)),
            last_write_at: None,
            dirty: false,
            writes: 0,
            failures: 0,
        }
    }

    /// Ask for `data` to be persisted.
    pub fn request(&mut self, data: &mut SessionData, now: DateTime<Utc>) {
        self.dirty = true;
        let due = match self.last_write_at {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.debounce,
        };
        if due {
            self.write(data, now);
        } else {
            debug!("save deferred by debounce window");
        }
    }

    /// Write any deferred state now.
    pub fn flush(&mut self, data: &mut SessionData, now: DateTime<Utc>) {
        if self.dirty {
            self.write(data, now);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Successful writes so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Failed writes so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    fn write(&mut self, data: &mut SessionData, now: DateTime<Utc>) {
        data.timer_state.last_saved_at = Some(now);
        self.dirty = false;
        self.last_write_at = Some(now);

        let bytes = match serde_json::to_vec(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.failures += 1;
                warn!(error = %e, "failed to serialize session state");
                return;
            }
        };
        match self.store.save(&bytes) {
            Ok(()) => {
                self.writes += 1;
                debug!(bytes = bytes.len(), "session state saved");
            }
            Err(e) => {
                self.failures += 1;
                warn!(error = %e, "failed to save session state");
            }
        }
    }
}
