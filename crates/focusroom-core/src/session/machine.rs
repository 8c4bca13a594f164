//! Session state machine.
//!
//! ## State Transitions
//!
//! ```text
//! WORK ──(zero / skip)──> BREAK | LONG_BREAK ──(zero / skip)──> WORK
//! ```
//!
//! Each phase is either running or paused. A phase transition always leaves
//! the session paused; the caller decides whether to start the next one.
//!
//! The machine has no clock thread of its own: a driver (see
//! [`TimerEngine`](crate::timer::TimerEngine)) calls [`Session::tick`] once per
//! second and [`Session::complete_phase`] when [`Session::phase_due`] says so.

use std::sync::Arc;

use tracing::{debug, info};

use super::settings::{Settings, SettingsPatch};
use super::state::{Phase, TimerState};
use super::SessionData;
use crate::clock::Clock;
use crate::events::Event;
use crate::notify::{LogNotifier, Notifier, NotifyEvent};
use crate::stats::{DaySummary, PeriodSummary, StatsAggregator, WeekStart};
use crate::storage::DebouncedWriter;
use crate::task::{Task, TaskProgress};

/// Default tick-save throttle in seconds.
const DEFAULT_SAVE_EVERY_SECS: u64 = 10;

/// The single live session. Owns the persisted root.
pub struct Session {
    data: SessionData,
    clock: Arc<dyn Clock>,
    writer: DebouncedWriter,
    notifier: Box<dyn Notifier>,
    save_every_secs: u64,
}

impl Session {
    pub fn new(data: SessionData, clock: Arc<dyn Clock>, writer: DebouncedWriter) -> Self {
        Self {
            data,
            clock,
            writer,
            notifier: Box::new(LogNotifier),
            save_every_secs: DEFAULT_SAVE_EVERY_SECS,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// While running, persist whenever the remaining seconds are a multiple of `secs`.
    pub fn with_save_every(mut self, secs: u64) -> Self {
        self.save_every_secs = secs.max(1);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn settings(&self) -> &Settings {
        &self.data.settings
    }

    pub fn timer_state(&self) -> &TimerState {
        &self.data.timer_state
    }

    pub fn phase(&self) -> Phase {
        self.data.timer_state.phase()
    }

    pub fn is_running(&self) -> bool {
        self.data.timer_state.is_running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.data.timer_state.current_time
    }

    /// Full length of the active phase.
    pub fn total_secs(&self) -> u64 {
        self.data.settings.duration_for(self.phase())
    }

    /// True when a running countdown has reached zero.
    pub fn phase_due(&self) -> bool {
        self.is_running() && self.remaining_secs() == 0
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.data.queue.current_task()
    }

    pub fn pending_tasks(&self) -> &[Task] {
        self.data.queue.pending_tasks()
    }

    pub fn completed_tasks(&self) -> &[Task] {
        self.data.queue.completed_tasks()
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.data.stats
    }

    pub fn today_stats(&self) -> DaySummary {
        self.data.stats.today(self.clock.today())
    }

    pub fn week_stats(&self, week_start: WeekStart) -> PeriodSummary {
        self.data.stats.week(self.clock.today(), week_start)
    }

    pub fn recent_stats(&self, days: u32) -> Vec<DaySummary> {
        self.data.stats.recent_days(self.clock.today(), days)
    }

    pub fn writer(&self) -> &DebouncedWriter {
        &self.writer
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let total = self.total_secs();
        let remaining = self.remaining_secs();
        let progress_pct = if total == 0 {
            0.0
        } else {
            (total.saturating_sub(remaining) as f64 / total as f64 * 100.0).min(100.0)
        };
        Event::StateSnapshot {
            phase: self.phase(),
            is_running: self.is_running(),
            remaining_secs: remaining,
            total_secs: total,
            progress_pct,
            completed_pomodoros: self.data.timer_state.completed_pomodoros,
            current_task: self.data.queue.current_task_id().map(str::to_string),
            at: self.clock.now(),
        }
    }

    // ── Timer commands ───────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        self.data.timer_state.is_running = true;
        self.persist();
        debug!(phase = %self.phase(), remaining = self.remaining_secs(), "timer started");
        Some(Event::TimerStarted {
            phase: self.phase(),
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    /// Idempotent: pausing a paused session changes nothing.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.data.timer_state.is_running = false;
        self.persist();
        Some(Event::TimerPaused {
            phase: self.phase(),
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    /// Consume one second. Returns false when nothing was counted.
    pub fn tick(&mut self) -> bool {
        let state = &mut self.data.timer_state;
        if !state.is_running || state.current_time == 0 {
            return false;
        }
        state.current_time -= 1;
        if state.current_time % self.save_every_secs == 0 {
            self.persist();
        }
        true
    }

    /// Close out a running phase whose countdown hit zero.
    ///
    /// A finished WORK phase counts a pomodoro, records stats, and credits
    /// the current task. The session then moves to the next phase, paused.
    pub fn complete_phase(&mut self) -> Option<Event> {
        if !self.phase_due() {
            return None;
        }
        let now = self.clock.now();
        let phase = self.phase();
        let mut credited_task = None;
        let mut task_completed = false;

        let next = match phase {
            Phase::Work => {
                let today = self.clock.today();
                let data = &mut self.data;
                data.timer_state.completed_pomodoros += 1;
                data.stats.record_pomodoro(today, data.settings.work_duration);

                if let Some(id) = data.queue.current_task_id().map(str::to_string) {
                    match data.queue.increment_completed(&id, now, today, &mut data.stats) {
                        Some(TaskProgress::Completed(task)) => {
                            info!(task_id = %task.id, "task reached its estimate");
                            task_completed = true;
                        }
                        Some(TaskProgress::Advanced { .. }) | None => {}
                    }
                    credited_task = Some(id);
                }
                self.notify(NotifyEvent::WorkEnd);
                self.break_phase()
            }
            Phase::Break | Phase::LongBreak => {
                self.notify(NotifyEvent::BreakEnd);
                Phase::Work
            }
        };

        self.enter(next);
        info!(
            %phase,
            next = %next,
            completed_pomodoros = self.data.timer_state.completed_pomodoros,
            "phase completed"
        );
        Some(Event::PhaseCompleted {
            phase,
            next_phase: next,
            completed_pomodoros: self.data.timer_state.completed_pomodoros,
            credited_task,
            task_completed,
            at: now,
        })
    }

    /// Jump to the next phase now, without counting anything.
    pub fn skip_to_next(&mut self) -> Option<Event> {
        let from = self.phase();
        let to = match from {
            Phase::Work => self.break_phase(),
            Phase::Break | Phase::LongBreak => Phase::Work,
        };
        self.enter(to);
        Some(Event::PhaseSkipped {
            from,
            to,
            at: self.clock.now(),
        })
    }

    /// Stop and rewind the active phase to its full length.
    pub fn reset_timer(&mut self) -> Option<Event> {
        let phase = self.phase();
        let state = &mut self.data.timer_state;
        state.is_running = false;
        state.current_time = self.data.settings.duration_for(phase);
        self.persist();
        Some(Event::TimerReset {
            phase,
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    /// Same as [`Session::reset_timer`].
    pub fn stop_current_session(&mut self) -> Option<Event> {
        self.reset_timer()
    }

    /// Merge `patch` into the settings.
    ///
    /// A running countdown keeps its remaining time, only clamped to the new
    /// phase length.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Option<Event> {
        if patch.is_empty() {
            return None;
        }
        self.data.settings.merge(patch);
        self.data.timer_state.clamp_to(&self.data.settings);
        self.persist();
        Some(Event::SettingsUpdated {
            at: self.clock.now(),
        })
    }

    // ── Task commands ────────────────────────────────────────────────

    pub fn add_task(&mut self, name: impl Into<String>, estimated_pomodoros: u64) -> Task {
        let now = self.clock.now();
        let task = self
            .data
            .queue
            .add_task(name, estimated_pomodoros, now)
            .clone();
        self.persist();
        task
    }

    pub fn remove_task(&mut self, id: &str) -> Option<Event> {
        let task = self.data.queue.remove_task(id)?;
        self.persist();
        Some(Event::TaskRemoved {
            task_id: task.id,
            at: self.clock.now(),
        })
    }

    pub fn complete_task(&mut self, id: &str) -> Option<Event> {
        let now = self.clock.now();
        let today = self.clock.today();
        let data = &mut self.data;
        let task = data.queue.complete_task(id, now, today, &mut data.stats)?;
        self.persist();
        Some(Event::TaskCompleted { task, at: now })
    }

    /// Point at a pending task, or clear the pointer with `None`.
    pub fn set_current_task(&mut self, id: Option<&str>) -> Option<Event> {
        if !self.data.queue.set_current_task(id) {
            return None;
        }
        self.persist();
        Some(Event::CurrentTaskChanged {
            task_id: id.map(str::to_string),
            at: self.clock.now(),
        })
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> Option<Event> {
        if !self.data.queue.move_task(from, to) {
            return None;
        }
        self.persist();
        Some(Event::TaskMoved {
            from,
            to,
            at: self.clock.now(),
        })
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Persist now, bypassing the tick throttle.
    pub fn save_data(&mut self) {
        self.persist();
    }

    /// Write anything the debounce window is holding back.
    pub fn flush(&mut self) {
        let now = self.clock.now();
        self.writer.flush(&mut self.data, now);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self) {
        let now = self.clock.now();
        self.writer.request(&mut self.data, now);
    }

    /// Long break on exact multiples of the cadence, including zero.
    fn break_phase(&self) -> Phase {
        let every = self.data.settings.pomodoros_until_long_break.max(1);
        if self.data.timer_state.completed_pomodoros % every == 0 {
            Phase::LongBreak
        } else {
            Phase::Break
        }
    }

    fn enter(&mut self, phase: Phase) {
        let state = &mut self.data.timer_state;
        state.enter(phase, &self.data.settings);
        state.is_running = false;
        self.persist();
    }

    fn notify(&self, event: NotifyEvent) {
        let settings = &self.data.settings;
        if !settings.sound_enabled {
            return;
        }
        let sound = match event {
            NotifyEvent::WorkEnd => settings.work_end_sound,
            NotifyEvent::BreakEnd => settings.break_end_sound,
        };
        if !sound.is_silent() {
            self.notifier.notify(event, sound);
        }
    }
}
