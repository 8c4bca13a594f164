//! # Focusroom Core Library
//!
//! Core logic for the Focusroom focus timer: a single work/break session with
//! a task queue and daily statistics, persisted as one JSON document and
//! recovered across restarts. The `focusroom` CLI is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Session**: the phase state machine plus the task queue and stats it
//!   updates. Every mutation is persisted through a debounced writer.
//! - **Timer Engine**: a Tokio task that owns the session and ticks it once
//!   per second while it runs
//! - **Recovery**: rebuilds the session at startup and subtracts time spent
//!   offline from a countdown that was running
//! - **Storage**: SQLite-backed blob store and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Session`]: the live session and every command it accepts
//! - [`TimerEngine`]: periodic driver for a session
//! - [`RecoveryManager`]: startup load and reconciliation
//! - [`Database`]: durable [`PersistentStore`]
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod recovery;
pub mod session;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier, NotifyEvent, SoundId};
pub use recovery::{recover, RecoveryManager, RecoveryReport, RecoverySource};
pub use session::{Phase, Session, SessionData, Settings, SettingsPatch, TimerState};
pub use stats::{goal_progress, DaySummary, PeriodSummary, StatsAggregator, WeekStart};
pub use storage::{Config, Database, DebouncedWriter, MemoryStore, PersistentStore, SessionLock};
pub use task::{Task, TaskProgress, TaskQueue};
pub use timer::{EngineCommand, EngineHandle, TimerEngine};
