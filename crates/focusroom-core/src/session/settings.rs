use serde::{Deserialize, Serialize};

use super::state::Phase;
use crate::notify::SoundId;

/// User-editable session configuration. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration: u64,
    #[serde(default = "default_break_duration")]
    pub break_duration: u64,
    #[serde(default = "default_long_break_duration")]
    pub long_break_duration: u64,
    #[serde(default = "default_pomodoros_until_long_break")]
    pub pomodoros_until_long_break: u64,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_work_end_sound")]
    pub work_end_sound: SoundId,
    #[serde(default = "default_break_end_sound")]
    pub break_end_sound: SoundId,
}

/// Partial settings update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub work_duration: Option<u64>,
    pub break_duration: Option<u64>,
    pub long_break_duration: Option<u64>,
    pub pomodoros_until_long_break: Option<u64>,
    pub sound_enabled: Option<bool>,
    pub work_end_sound: Option<SoundId>,
    pub break_end_sound: Option<SoundId>,
}

fn default_work_duration() -> u64 {
    25 * 60
}
fn default_break_duration() -> u64 {
    5 * 60
}
fn default_long_break_duration() -> u64 {
    15 * 60
}
fn default_pomodoros_until_long_break() -> u64 {
    4
}
fn default_true() -> bool {
    true
}
fn default_work_end_sound() -> SoundId {
    SoundId::Alarm
}
fn default_break_end_sound() -> SoundId {
    SoundId::Default
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            break_duration: default_break_duration(),
            long_break_duration: default_long_break_duration(),
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
            sound_enabled: true,
            work_end_sound: default_work_end_sound(),
            break_end_sound: default_break_end_sound(),
        }
    }
}

impl Settings {
    /// Full length of `phase` in seconds.
    pub fn duration_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_duration,
            Phase::Break => self.break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }

    /// Shallow merge. Zero durations and a zero cadence are clamped to 1.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.work_duration {
            self.work_duration = v.max(1);
        }
        if let Some(v) = patch.break_duration {
            self.break_duration = v.max(1);
        }
        if let Some(v) = patch.long_break_duration {
            self.long_break_duration = v.max(1);
        }
        if let Some(v) = patch.pomodoros_until_long_break {
            self.pomodoros_until_long_break = v.max(1);
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.work_end_sound {
            self.work_end_sound = v;
        }
        if let Some(v) = patch.break_end_sound {
            self.break_end_sound = v;
        }
    }

    /// Repair values a hand-edited or corrupted blob may carry.
    pub(crate) fn sanitized(mut self) -> Self {
        self.work_duration = self.work_duration.max(1);
        self.break_duration = self.break_duration.max(1);
        self.long_break_duration = self.long_break_duration.max(1);
        self.pomodoros_until_long_break = self.pomodoros_until_long_break.max(1);
        self
    }
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}
