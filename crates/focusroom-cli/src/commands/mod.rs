pub mod config;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;

use std::sync::Arc;

use focusroom_core::storage::Database;
use focusroom_core::{recover, Config, CoreError, Session, SessionLock, SystemClock};
use serde::Serialize;
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Whether a command changes the persisted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Holds the data-dir lock until the returned guard is dropped.
    Write,
}

/// Load config and recover the persisted session.
///
/// Writers take the session lock before recovering, so they always start
/// from the latest saved state and a second writer is refused.
pub fn open_session(access: Access) -> Result<(Option<SessionLock>, Config, Session), CoreError> {
    let lock = match access {
        Access::Write => Some(SessionLock::acquire()?),
        Access::Read => None,
    };
    let config = Config::load()?;
    let db = Database::open()?;
    let (session, report) = recover(Box::new(db), Arc::new(SystemClock), &config);
    debug!(?report, ?access, "session opened");
    Ok((lock, config, session))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
