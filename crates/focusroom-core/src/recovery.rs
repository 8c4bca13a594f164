//! Startup recovery.
//!
//! Loads the persisted root, repairs what it can, and reconciles a countdown
//! that was running when the process went away. A recovered session is never
//! resumed automatically: `isRunning` is always false afterwards.
//!
//! Storage failures and malformed blobs are not errors here. They degrade to
//! the initial state and are reported in [`RecoveryReport`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::StorageError;
use crate::session::{Session, SessionData, Settings, TimerState};
use crate::stats::StatsAggregator;
use crate::storage::{Config, DebouncedWriter, PersistentStore};
use crate::task::{Task, TaskQueue};

/// Where the recovered state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySource {
    /// Nothing was stored yet.
    Fresh,
    /// A stored root was loaded.
    Restored,
    /// The store could not be read; started fresh.
    Unavailable,
    /// The stored blob could not be parsed; started fresh.
    Malformed,
}

/// Summary of a recovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub source: RecoverySource,
    /// The stored session claimed to be running.
    pub was_running: bool,
    /// Seconds subtracted from the countdown for time spent offline.
    pub drift_applied_secs: Option<u64>,
    /// Top-level fields that were present but unreadable and fell back to defaults.
    pub repaired_fields: Vec<String>,
}

impl RecoveryReport {
    fn new(source: RecoverySource) -> Self {
        Self {
            source,
            was_running: false,
            drift_applied_secs: None,
            repaired_fields: Vec::new(),
        }
    }
}

/// Rebuilds session state from a [`PersistentStore`].
pub struct RecoveryManager<'a> {
    clock: &'a dyn Clock,
    defaults: Settings,
}

impl<'a> RecoveryManager<'a> {
    /// `defaults` seeds any part of the root that is missing.
    pub fn new(clock: &'a dyn Clock, defaults: Settings) -> Self {
        Self { clock, defaults }
    }

    /// Load and reconcile. Never fails.
    pub fn load(&self, store: &dyn PersistentStore) -> (SessionData, RecoveryReport) {
        let (mut data, mut report) = match store.load() {
            Ok(None) => (
                SessionData::new(self.defaults.clone()),
                RecoveryReport::new(RecoverySource::Fresh),
            ),
            Ok(Some(bytes)) => match self.decode(&bytes) {
                Ok((data, repaired)) => {
                    let mut report = RecoveryReport::new(RecoverySource::Restored);
                    report.repaired_fields = repaired;
                    (data, report)
                }
                Err(e) => {
                    warn!(error = %e, "persisted session is malformed; starting fresh");
                    (
                        SessionData::new(self.defaults.clone()),
                        RecoveryReport::new(RecoverySource::Malformed),
                    )
                }
            },
            Err(e) => {
                warn!(error = %e, "persistent store unavailable; starting fresh");
                (
                    SessionData::new(self.defaults.clone()),
                    RecoveryReport::new(RecoverySource::Unavailable),
                )
            }
        };

        report.was_running = data.timer_state.is_running;
        report.drift_applied_secs = self.reconcile(&mut data);
        info!(
            source = ?report.source,
            was_running = report.was_running,
            drift_secs = ?report.drift_applied_secs,
            "session recovered"
        );
        (data, report)
    }

    /// Apply offline drift to a running countdown and force it paused.
    ///
    /// Returns the seconds subtracted, when drift applied.
    pub fn reconcile(&self, data: &mut SessionData) -> Option<u64> {
        let state = &mut data.timer_state;
        let mut drift = None;
        if state.is_running {
            if let Some(saved_at) = state.last_saved_at {
                let elapsed = self
                    .clock
                    .now()
                    .signed_duration_since(saved_at)
                    .num_seconds()
                    .max(0) as u64;
                state.current_time = state.current_time.saturating_sub(elapsed);
                drift = Some(elapsed);
            }
        }
        state.is_running = false;
        state.clamp_to(&data.settings);
        drift
    }

    fn decode(&self, bytes: &[u8]) -> Result<(SessionData, Vec<String>), StorageError> {
        let root: serde_json::Value = serde_json::from_slice(bytes)?;
        let obj = root
            .as_object()
            .ok_or_else(|| StorageError::Malformed("root is not an object".into()))?;
        let mut repaired = Vec::new();

        let settings = field::<Settings>(obj, "settings", &mut repaired)
            .unwrap_or_else(|| self.defaults.clone())
            .sanitized();
        let mut timer_state = field::<TimerState>(obj, "timerState", &mut repaired)
            .unwrap_or_else(|| TimerState::initial(&settings));
        let has_countdown = obj
            .get("timerState")
            .and_then(|raw| raw.get("currentTime"))
            .is_some();
        if !has_countdown {
            timer_state.current_time = settings.duration_for(timer_state.phase());
        }
        let tasks = field::<Vec<Task>>(obj, "tasks", &mut repaired).unwrap_or_default();
        let completed_tasks =
            field::<Vec<Task>>(obj, "completedTasks", &mut repaired).unwrap_or_default();
        let current_task_id =
            field::<Option<String>>(obj, "currentTaskId", &mut repaired).flatten();
        let stats = field::<StatsAggregator>(obj, "stats", &mut repaired).unwrap_or_default();

        Ok((
            SessionData {
                settings,
                timer_state,
                queue: TaskQueue::from_parts(tasks, completed_tasks, current_task_id),
                stats,
            },
            repaired,
        ))
    }
}

/// Decode one top-level field. Missing is silent; unreadable is logged.
fn field<T: DeserializeOwned>(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
    repaired: &mut Vec<String>,
) -> Option<T> {
    let raw = obj.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(field = key, error = %e, "unreadable persisted field; using default");
            repaired.push(key.to_string());
            None
        }
    }
}

/// Build the live session: recover from `store`, then hand the store to the
/// session's writer.
pub fn recover(
    store: Box<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    config: &Config,
) -> (Session, RecoveryReport) {
    let (data, report) = RecoveryManager::new(clock.as_ref(), config.initial_settings())
        .load(store.as_ref());
    let writer = DebouncedWriter::new(store, config.persistence.debounce_ms);
    let session = Session::new(data, clock, writer)
        .with_save_every(config.persistence.save_every_secs);
    (session, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::Phase;
    use crate::storage::MemoryStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 6, 9, 0, 0).unwrap()
    }

    fn stored_running(current_time: u64, saved_at: Option<DateTime<Utc>>) -> MemoryStore {
        let mut data = SessionData::default();
        data.timer_state.is_running = true;
        data.timer_state.current_time = current_time;
        data.timer_state.last_saved_at = saved_at;
        MemoryStore::with_contents(serde_json::to_vec(&data).unwrap())
    }

    fn load_at(store: &MemoryStore, now: DateTime<Utc>) -> (SessionData, RecoveryReport) {
        let clock = ManualClock::new(now);
        RecoveryManager::new(&clock, Settings::default()).load(store)
    }

    #[test]
    fn running_session_loses_offline_time() {
        let store = stored_running(100, Some(t0()));
        let (data, report) = load_at(&store, t0() + Duration::seconds(30));
        assert_eq!(data.timer_state.current_time, 70);
        assert!(!data.timer_state.is_running);
        assert!(report.was_running);
        assert_eq!(report.drift_applied_secs, Some(30));
        assert_eq!(report.source, RecoverySource::Restored);
    }

    #[test]
    fn drift_is_floored_to_whole_seconds() {
        let store = stored_running(100, Some(t0()));
        let (data, _) = load_at(&store, t0() + Duration::milliseconds(30_999));
        assert_eq!(data.timer_state.current_time, 70);
    }

    #[test]
    fn drift_never_goes_negative() {
        let store = stored_running(10, Some(t0()));
        let (data, _) = load_at(&store, t0() + Duration::seconds(999));
        assert_eq!(data.timer_state.current_time, 0);
        assert!(!data.timer_state.is_running);
    }

    #[test]
    fn clock_behind_save_applies_no_drift() {
        let store = stored_running(100, Some(t0()));
        let (data, report) = load_at(&store, t0() - Duration::seconds(50));
        assert_eq!(data.timer_state.current_time, 100);
        assert_eq!(report.drift_applied_secs, Some(0));
    }

    #[test]
    fn running_without_timestamp_keeps_countdown() {
        let store = stored_running(100, None);
        let (data, report) = load_at(&store, t0());
        assert_eq!(data.timer_state.current_time, 100);
        assert!(!data.timer_state.is_running);
        assert_eq!(report.drift_applied_secs, None);
    }

    #[test]
    fn paused_session_is_restored_unchanged() {
        let mut data = SessionData::default();
        data.timer_state.current_time = 321;
        data.timer_state.last_saved_at = Some(t0());
        let store = MemoryStore::with_contents(serde_json::to_vec(&data).unwrap());
        let (loaded, _) = load_at(&store, t0() + Duration::hours(5));
        assert_eq!(loaded.timer_state.current_time, 321);
    }

    #[test]
    fn empty_store_starts_fresh() {
        let (data, report) = load_at(&MemoryStore::new(), t0());
        assert_eq!(report.source, RecoverySource::Fresh);
        assert_eq!(data, SessionData::default());
    }

    #[test]
    fn garbage_starts_fresh() {
        for blob in [&b"{not json"[..], &b"[1,2,3]"[..], &b"\"hello\""[..]] {
            let (data, report) = load_at(&MemoryStore::with_contents(blob), t0());
            assert_eq!(report.source, RecoverySource::Malformed);
            assert_eq!(data, SessionData::default());
        }
    }

    #[test]
    fn missing_fields_default_without_complaint() {
        let store = MemoryStore::with_contents(
            br#"{"settings":{"workDuration":600,"breakDuration":60,"longBreakDuration":300,"pomodorosUntilLongBreak":2,"soundEnabled":false,"workEndSound":"BELL","breakEndSound":"NONE"}}"#.to_vec(),
        );
        let (data, report) = load_at(&store, t0());
        assert!(report.repaired_fields.is_empty());
        assert_eq!(data.settings.work_duration, 600);
        assert_eq!(data.timer_state.current_time, 600);
        assert_eq!(data.timer_state.phase(), Phase::Work);
        assert!(data.queue.pending_tasks().is_empty());
    }

    #[test]
    fn missing_countdown_restarts_the_stored_phase() {
        let store = MemoryStore::with_contents(
            br#"{"settings":{"workDuration":600,"breakDuration":60,"longBreakDuration":300,"pomodorosUntilLongBreak":4,"soundEnabled":false,"workEndSound":"BELL","breakEndSound":"NONE"},
                "timerState":{"isRunning":false,"isBreak":true,"completedPomodoros":3}}"#
                .to_vec(),
        );
        let (data, report) = load_at(&store, t0());
        assert!(report.repaired_fields.is_empty());
        assert_eq!(data.timer_state.completed_pomodoros, 3);
        assert_eq!(data.timer_state.phase(), Phase::Break);
        assert_eq!(data.timer_state.current_time, 60);
    }

    #[test]
    fn unreadable_field_is_repaired_independently() {
        let store = MemoryStore::with_contents(
            br#"{"tasks":"oops","stats":{"dailyPomodoros":{"2026-05-06":3}},"currentTaskId":null}"#
                .to_vec(),
        );
        let (data, report) = load_at(&store, t0());
        assert_eq!(report.repaired_fields, vec!["tasks".to_string()]);
        let day = chrono::NaiveDate::from_ymd_opt(2026, 5, 6).unwrap();
        assert_eq!(data.stats.pomodoros_on(day), 3);
    }

    #[test]
    fn countdown_is_clamped_to_phase_length() {
        let mut data = SessionData::default();
        data.timer_state.current_time = 99_999;
        let store = MemoryStore::with_contents(serde_json::to_vec(&data).unwrap());
        let (loaded, _) = load_at(&store, t0());
        assert_eq!(loaded.timer_state.current_time, 1500);
    }

    #[test]
    fn unavailable_store_starts_fresh() {
        struct Down;
        impl PersistentStore for Down {
            fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
                Err(StorageError::Unavailable("disk on fire".into()))
            }
            fn save(&mut self, _: &[u8]) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("disk on fire".into()))
            }
        }
        let clock = ManualClock::new(t0());
        let (data, report) = RecoveryManager::new(&clock, Settings::default()).load(&Down);
        assert_eq!(report.source, RecoverySource::Unavailable);
        assert_eq!(data, SessionData::default());
    }
}
