//! Integration tests for a full focus day.
//!
//! Drives a session through work and break phases with a manual clock,
//! crediting tasks along the way, and checks what ends up persisted.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use focusroom_core::{
    recover, Config, Event, ManualClock, MemoryStore, Phase, RecoverySource, SettingsPatch,
};

fn run_phase(session: &mut focusroom_core::Session) -> Event {
    session.start();
    while session.tick() {}
    session.complete_phase().expect("phase should be due")
}

#[test]
fn test_full_focus_cycle_with_tasks() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ));
    let store = MemoryStore::new();
    let (mut session, report) = recover(Box::new(store.clone()), clock.clone(), &Config::default());
    assert_eq!(report.source, RecoverySource::Fresh);

    session.update_settings(SettingsPatch {
        work_duration: Some(4),
        break_duration: Some(2),
        long_break_duration: Some(3),
        pomodoros_until_long_break: Some(2),
        ..SettingsPatch::default()
    });

    let write = session.add_task("Write report", 2);
    let review = session.add_task("Review PR", 1);
    session.set_current_task(Some(&write.id));

    // Work 1 -> Break
    match run_phase(&mut session) {
        Event::PhaseCompleted { next_phase, credited_task, task_completed, .. } => {
            assert_eq!(next_phase, Phase::Break);
            assert_eq!(credited_task.as_deref(), Some(write.id.as_str()));
            assert!(!task_completed);
        }
        other => panic!("Expected PhaseCompleted, got {other:?}"),
    }
    assert!(!session.is_running());
    assert_eq!(session.remaining_secs(), 2);

    // Break -> Work
    run_phase(&mut session);
    assert_eq!(session.phase(), Phase::Work);

    // Work 2 -> LongBreak, and the task meets its estimate.
    match run_phase(&mut session) {
        Event::PhaseCompleted { next_phase, task_completed, completed_pomodoros, .. } => {
            assert_eq!(next_phase, Phase::LongBreak);
            assert!(task_completed);
            assert_eq!(completed_pomodoros, 2);
        }
        other => panic!("Expected PhaseCompleted, got {other:?}"),
    }
    assert_eq!(session.remaining_secs(), 3);
    assert!(session.current_task().is_none());
    assert_eq!(session.pending_tasks().len(), 1);
    assert_eq!(session.pending_tasks()[0].id, review.id);
    assert_eq!(session.completed_tasks()[0].id, write.id);

    let today = session.today_stats();
    assert_eq!(today.pomodoros, 2);
    assert_eq!(today.focus_time, 8);
    assert_eq!(today.task_completions, 1);

    // The persisted root reflects the latest state.
    let saved: serde_json::Value = serde_json::from_slice(&store.contents().unwrap()).unwrap();
    assert_eq!(saved["timerState"]["completedPomodoros"], 2);
    assert_eq!(saved["timerState"]["isBreak"], true);
    assert_eq!(saved["timerState"]["isLongBreak"], true);
    assert_eq!(saved["completedTasks"].as_array().unwrap().len(), 1);
    assert!(saved["currentTaskId"].is_null());
}

#[test]
fn test_manual_completion_counts_once_per_day() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
    ));
    let (mut session, _) = recover(Box::new(MemoryStore::new()), clock.clone(), &Config::default());

    let first = session.add_task("a", 3);
    let second = session.add_task("b", 3);
    session.complete_task(&first.id);
    session.complete_task(&first.id);

    clock.advance_secs(24 * 3600);
    session.complete_task(&second.id);

    let recent = session.recent_stats(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].task_completions, 1);
    assert_eq!(recent[1].task_completions, 1);
    assert_eq!(session.completed_tasks().len(), 2);
}

#[test]
fn test_skip_never_counts() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
    ));
    let (mut session, _) = recover(Box::new(MemoryStore::new()), clock, &Config::default());

    // From WORK with zero pomodoros the next break is the long one.
    session.start();
    match session.skip_to_next() {
        Some(Event::PhaseSkipped { from, to, .. }) => {
            assert_eq!(from, Phase::Work);
            assert_eq!(to, Phase::LongBreak);
        }
        other => panic!("Expected PhaseSkipped, got {other:?}"),
    }
    assert!(!session.is_running());
    session.skip_to_next();
    assert_eq!(session.phase(), Phase::Work);
    assert_eq!(session.timer_state().completed_pomodoros, 0);
    assert_eq!(session.today_stats().pomodoros, 0);
}
