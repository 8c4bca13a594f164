//! Property tests for countdown and recovery arithmetic.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use focusroom_core::{
    recover, Config, Event, ManualClock, MemoryStore, RecoveryManager, SessionData, Settings,
    SettingsPatch,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// `d` ticks of a running phase of length `d` reach zero with exactly one completion.
    #[test]
    fn countdown_completes_exactly_once(d in 1u64..400, extra in 0u64..20) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()));
        let (mut session, _) = recover(Box::new(MemoryStore::new()), clock, &Config::default());
        session.update_settings(SettingsPatch {
            work_duration: Some(d),
            ..SettingsPatch::default()
        });
        session.start();

        let mut completions = 0;
        for _ in 0..(d + extra) {
            session.tick();
            if let Some(Event::PhaseCompleted { .. }) = session.complete_phase() {
                completions += 1;
            }
        }
        prop_assert_eq!(completions, 1);
        prop_assert_eq!(session.timer_state().completed_pomodoros, 1);
        prop_assert!(!session.is_running());
    }

    /// Recovered countdown is `max(0, remaining - offline)` and never running.
    #[test]
    fn recovery_never_goes_negative(remaining in 0u64..=1500, offline in 0i64..10_000) {
        let saved_at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut data = SessionData::default();
        data.timer_state.is_running = true;
        data.timer_state.current_time = remaining;
        data.timer_state.last_saved_at = Some(saved_at);
        let store = MemoryStore::with_contents(serde_json::to_vec(&data).unwrap());

        let clock = ManualClock::new(saved_at + chrono::Duration::seconds(offline));
        let (data, report) = RecoveryManager::new(&clock, Settings::default()).load(&store);

        prop_assert_eq!(data.timer_state.current_time, remaining.saturating_sub(offline as u64));
        prop_assert!(!data.timer_state.is_running);
        prop_assert_eq!(report.drift_applied_secs, Some(offline as u64));
    }

    /// Arbitrary bytes never make recovery fail.
    #[test]
    fn recovery_tolerates_garbage(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());
        let store = MemoryStore::with_contents(bytes);
        let (data, _) = RecoveryManager::new(&clock, Settings::default()).load(&store);
        prop_assert!(!data.timer_state.is_running);
        prop_assert!(data.timer_state.current_time <= data.settings.duration_for(data.timer_state.phase()));
    }
}
