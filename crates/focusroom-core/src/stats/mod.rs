//! Productivity statistics.
//!
//! Three per-day counters keyed by local calendar date. Counters only ever
//! grow. Day, week and recent-days views are computed from the counters on
//! every call and never cached.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest window [`StatsAggregator::recent_days`] will build.
pub const MAX_RECENT_DAYS: u32 = 366;

/// Which weekday a week begins on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// First day of the week containing `date`.
    pub fn week_of(self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        date.checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// Counters for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub pomodoros: u64,
    /// Seconds of completed work phases.
    pub focus_time: u64,
    pub task_completions: u64,
}

/// Counters summed over an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub pomodoros: u64,
    pub focus_time: u64,
    pub task_completions: u64,
}

/// Owner of the persisted `stats` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsAggregator {
    #[serde(default)]
    daily_pomodoros: BTreeMap<NaiveDate, u64>,
    #[serde(default)]
    daily_focus_time: BTreeMap<NaiveDate, u64>,
    #[serde(default)]
    task_completions: BTreeMap<NaiveDate, u64>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One finished work phase of `duration_secs`.
    pub fn record_pomodoro(&mut self, date: NaiveDate, duration_secs: u64) {
        bump(&mut self.daily_pomodoros, date, 1);
        bump(&mut self.daily_focus_time, date, duration_secs);
    }

    pub fn record_task_completion(&mut self, date: NaiveDate) {
        bump(&mut self.task_completions, date, 1);
    }

    pub fn pomodoros_on(&self, date: NaiveDate) -> u64 {
        lookup(&self.daily_pomodoros, date)
    }

    pub fn focus_time_on(&self, date: NaiveDate) -> u64 {
        lookup(&self.daily_focus_time, date)
    }

    pub fn task_completions_on(&self, date: NaiveDate) -> u64 {
        lookup(&self.task_completions, date)
    }

    pub fn today(&self, date: NaiveDate) -> DaySummary {
        DaySummary {
            date,
            pomodoros: self.pomodoros_on(date),
            focus_time: self.focus_time_on(date),
            task_completions: self.task_completions_on(date),
        }
    }

    /// The seven days of the week containing `date`.
    pub fn week(&self, date: NaiveDate, week_start: WeekStart) -> PeriodSummary {
        let start = week_start.week_of(date);
        self.period(start, 7)
    }

    /// `days` consecutive days ending at `date`, oldest first.
    ///
    /// At most [`MAX_RECENT_DAYS`] are returned. Empty when the range would
    /// start before the earliest representable date.
    pub fn recent_days(&self, date: NaiveDate, days: u32) -> Vec<DaySummary> {
        let days = days.min(MAX_RECENT_DAYS);
        if days == 0 {
            return Vec::new();
        }
        let Some(start) = date.checked_sub_days(Days::new(u64::from(days) - 1)) else {
            return Vec::new();
        };
        start
            .iter_days()
            .take(days as usize)
            .map(|d| self.today(d))
            .collect()
    }

    fn period(&self, start: NaiveDate, days: usize) -> PeriodSummary {
        let mut summary = PeriodSummary {
            start,
            end: start,
            pomodoros: 0,
            focus_time: 0,
            task_completions: 0,
        };
        for date in start.iter_days().take(days) {
            summary.end = date;
            summary.pomodoros += self.pomodoros_on(date);
            summary.focus_time += self.focus_time_on(date);
            summary.task_completions += self.task_completions_on(date);
        }
        summary
    }
}

/// Percent of `target` reached, capped at 100.
pub fn goal_progress(count: u64, target: u64) -> u8 {
    if target == 0 {
        return 0;
    }
    let pct = (count as f64 / target as f64 * 100.0).round();
    pct.min(100.0) as u8
}

fn bump(map: &mut BTreeMap<NaiveDate, u64>, date: NaiveDate, by: u64) {
    let entry = map.entry(date).or_insert(0);
    *entry = entry.saturating_add(by);
}

fn lookup(map: &BTreeMap<NaiveDate, u64>, date: NaiveDate) -> u64 {
    map.get(&date).copied().unwrap_or(0)
}
