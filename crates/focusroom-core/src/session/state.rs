use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::Settings;

/// The interval type currently being counted down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    Break,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Work => "work",
            Phase::Break => "break",
            Phase::LongBreak => "long break",
        };
        write!(f, "{label}")
    }
}

/// Mutable countdown state, persisted as `timerState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_break: bool,
    /// Set together with `is_break` when the break is the long one.
    #[serde(default)]
    pub is_long_break: bool,
    /// Seconds remaining in the active phase. When absent, recovery fills
    /// in the full duration of the restored phase.
    #[serde(default)]
    pub current_time: u64,
    #[serde(default)]
    pub completed_pomodoros: u64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl TimerState {
    /// WORK, paused, full work duration.
    pub fn initial(settings: &Settings) -> Self {
        Self {
            is_running: false,
            is_break: false,
            is_long_break: false,
            current_time: settings.work_duration,
            completed_pomodoros: 0,
            last_saved_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.is_break, self.is_long_break) {
            (false, _) => Phase::Work,
            (true, false) => Phase::Break,
            (true, true) => Phase::LongBreak,
        }
    }

    pub(crate) fn enter(&mut self, phase: Phase, settings: &Settings) {
        self.is_break = phase.is_break();
        self.is_long_break = phase == Phase::LongBreak;
        self.current_time = settings.duration_for(phase);
    }

    /// Keep `current_time` inside `0..=duration(active phase)`.
    pub(crate) fn clamp_to(&mut self, settings: &Settings) {
        let max = settings.duration_for(self.phase());
        self.current_time = self.current_time.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn phase_is_derived_from_flags() {
        let settings = Settings::default();
        let mut state = TimerState::initial(&settings);
        assert_eq!(state.phase(), Phase::Work);
        state.enter(Phase::LongBreak, &settings);
        assert_eq!(state.phase(), Phase::LongBreak);
        assert!(state.is_break);
        assert_eq!(state.current_time, settings.long_break_duration);
        state.enter(Phase::Work, &settings);
        assert!(!state.is_long_break);
    }

    #[test]
    fn last_saved_at_is_epoch_millis() {
        let mut state = TimerState::initial(&Settings::default());
        state.last_saved_at = Some(Utc.timestamp_millis_opt(1_700_000_000_123).unwrap());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["lastSavedAt"], 1_700_000_000_123_i64);
        assert_eq!(json["currentTime"], 1500);
    }

    #[test]
    fn legacy_state_without_long_break_flag_loads() {
        let state: TimerState = serde_json::from_str(
            r#"{"isRunning":true,"isBreak":true,"currentTime":42,"completedPomodoros":3,"lastSavedAt":null}"#,
        )
        .unwrap();
        assert_eq!(state.phase(), Phase::Break);
        assert_eq!(state.last_saved_at, None);
    }

    #[test]
    fn state_without_countdown_still_decodes() {
        let state: TimerState =
            serde_json::from_str(r#"{"isBreak":true,"completedPomodoros":3}"#).unwrap();
        assert_eq!(state.completed_pomodoros, 3);
        assert_eq!(state.current_time, 0);
    }
}
