//! The focus session: settings, countdown state machine, and the persisted
//! root that ties them to the task queue and stats.

mod machine;
mod settings;
mod state;

pub use machine::Session;
pub use settings::{Settings, SettingsPatch};
pub use state::{Phase, TimerState};

use serde::{Deserialize, Serialize};

use crate::stats::StatsAggregator;
use crate::task::TaskQueue;

/// Everything that is persisted, as one root object.
///
/// Serializes to `{ settings, timerState, tasks, completedTasks,
/// currentTaskId, stats }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub settings: Settings,
    pub timer_state: TimerState,
    #[serde(flatten)]
    pub queue: TaskQueue,
    pub stats: StatsAggregator,
}

impl SessionData {
    /// Initial in-memory state for `settings`.
    pub fn new(settings: Settings) -> Self {
        let timer_state = TimerState::initial(&settings);
        Self {
            settings,
            timer_state,
            queue: TaskQueue::new(),
            stats: StatsAggregator::new(),
        }
    }
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
