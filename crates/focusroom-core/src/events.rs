use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Phase;
use crate::task::Task;

/// Every state change in the session produces an Event.
/// The CLI prints them; engine subscribers receive them over a broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero and the session moved on.
    PhaseCompleted {
        phase: Phase,
        next_phase: Phase,
        completed_pomodoros: u64,
        /// Task credited with the pomodoro, if any.
        credited_task: Option<String>,
        /// Set when that credit finished the task.
        task_completed: bool,
        at: DateTime<Utc>,
    },
    /// Manual transition without stats side effects.
    PhaseSkipped {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    TaskRemoved {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task: Task,
        at: DateTime<Utc>,
    },
    TaskMoved {
        from: usize,
        to: usize,
        at: DateTime<Utc>,
    },
    CurrentTaskChanged {
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        is_running: bool,
        remaining_secs: u64,
        total_secs: u64,
        /// 0.0 .. 100.0 progress within the active phase.
        progress_pct: f64,
        completed_pomodoros: u64,
        current_task: Option<String>,
        at: DateTime<Utc>,
    },
}
