//! Timer engine implementation.
//!
//! The engine is the only place that waits on the wall clock. While the
//! session runs it holds one periodic schedule and forwards every firing into
//! [`Session::tick`], completing the phase when the countdown hits zero.
//! Drift is not corrected per tick; only recovery does that.
//!
//! ## Lifecycle
//!
//! ```text
//! new -> spawn -> (start | pause | reset | skip | tick)* -> shutdown
//! ```
//!
//! The schedule is an owned [`Interval`]. Cancelling means dropping it, so no
//! exit path (shutdown, handle drop, task abort) can leave a callback behind.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(session, &config.timer);
//! let (handle, task) = engine.spawn();
//! handle.start().await?;
//! ```

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::handle::{EngineCommand, EngineHandle};
use crate::events::Event;
use crate::session::Session;
use crate::storage::TimerConfig;

const EVENT_CAPACITY: usize = 64;
const COMMAND_CAPACITY: usize = 16;

/// Periodic driver for a [`Session`].
pub struct TimerEngine {
    session: Session,
    /// At most one outstanding schedule; `None` when idle.
    schedule: Option<Interval>,
    period: Duration,
    auto_advance: bool,
    events: broadcast::Sender<Event>,
}

impl TimerEngine {
    pub fn new(session: Session, config: &TimerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session,
            schedule: None,
            period: Duration::from_millis(config.tick_interval_ms.max(1)),
            auto_advance: config.auto_advance,
            events,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True while a schedule is outstanding.
    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────
    //
    // Creating a schedule needs a Tokio runtime context.

    /// No-op while a schedule is already active.
    pub fn start(&mut self) -> Option<Event> {
        if self.schedule.is_some() {
            return None;
        }
        let event = self.session.start();
        self.arm();
        self.publish(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.disarm();
        let event = self.session.pause();
        self.publish(event)
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.disarm();
        let event = self.session.reset_timer();
        self.publish(event)
    }

    pub fn skip(&mut self) -> Option<Event> {
        self.disarm();
        let event = self.session.skip_to_next();
        self.publish(event)
    }

    /// One schedule firing. Returns the phase-completion event, if any.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.session.is_running() {
            self.disarm();
            return None;
        }
        self.session.tick();
        if !self.session.phase_due() {
            return None;
        }

        self.disarm();
        let completed = self.session.complete_phase();
        let completed = self.publish(completed);
        if self.auto_advance {
            self.start();
        }
        completed
    }

    // ── Loop ─────────────────────────────────────────────────────────

    /// Run the engine on its own task.
    pub fn spawn(self) -> (EngineHandle, JoinHandle<Session>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = EngineHandle::new(tx, self.events.clone());
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    /// Serve commands and schedule firings until shutdown or until every
    /// handle is gone. Returns the session for reuse or inspection.
    pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) -> Session {
        info!(period_ms = self.period.as_millis() as u64, "timer engine started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = next_firing(&mut self.schedule) => {
                    self.tick();
                }
            }
        }
        self.teardown();
        self.session
    }

    fn handle(&mut self, command: EngineCommand) {
        debug!(?command, "engine command");
        // A dropped reply receiver only means the caller stopped waiting.
        match command {
            EngineCommand::Start { reply } => {
                let _ = reply.send(self.start());
            }
            EngineCommand::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            EngineCommand::Reset { reply } => {
                let _ = reply.send(self.reset());
            }
            EngineCommand::Skip { reply } => {
                let _ = reply.send(self.skip());
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn teardown(&mut self) {
        self.disarm();
        self.session.flush();
        info!("timer engine stopped");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&mut self) {
        let mut schedule = interval_at(Instant::now() + self.period, self.period);
        schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.schedule = Some(schedule);
    }

    fn disarm(&mut self) {
        if self.schedule.take().is_some() {
            debug!("schedule cancelled");
        }
    }

    fn publish(&self, event: Option<Event>) -> Option<Event> {
        if let Some(ref e) = event {
            // No subscribers is fine.
            let _ = self.events.send(e.clone());
        }
        event
    }
}

/// Resolves on the next firing, or never when no schedule is armed.
async fn next_firing(schedule: &mut Option<Interval>) {
    match schedule {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::{Phase, SessionData, Settings};
    use crate::storage::{DebouncedWriter, MemoryStore};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn session(work: u64, brk: u64) -> (Session, MemoryStore) {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 6, 9, 0, 0).unwrap(),
        ));
        let settings = Settings {
            work_duration: work,
            break_duration: brk,
            ..Settings::default()
        };
        let writer = DebouncedWriter::new(Box::new(store.clone()), 0);
        (
            Session::new(SessionData::new(settings), clock, writer),
            store,
        )
    }

    #[tokio::test]
    async fn start_is_idempotent_while_scheduled() {
        let (session, _) = session(60, 10);
        let mut engine = TimerEngine::new(session, &TimerConfig::default());
        assert!(engine.start().is_some());
        assert!(engine.is_scheduled());
        assert!(engine.start().is_none());
        assert!(engine.pause().is_some());
        assert!(!engine.is_scheduled());
        assert!(!engine.session().is_running());
    }

    #[tokio::test]
    async fn exactly_one_completion_per_countdown() {
        let (session, _) = session(7, 10);
        let mut engine = TimerEngine::new(session, &TimerConfig::default());
        engine.start();
        let mut completions = 0;
        for _ in 0..7 {
            if let Some(Event::PhaseCompleted { .. }) = engine.tick() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(!engine.is_scheduled());
        assert!(engine.tick().is_none());
        assert_eq!(engine.session().phase(), Phase::Break);
        assert_eq!(engine.session().timer_state().completed_pomodoros, 1);
    }

    #[tokio::test]
    async fn auto_advance_restarts_next_phase() {
        let (session, _) = session(1, 10);
        let config = TimerConfig {
            auto_advance: true,
            ..TimerConfig::default()
        };
        let mut engine = TimerEngine::new(session, &config);
        let mut events = engine.subscribe();
        engine.start();
        assert!(engine.tick().is_some());
        assert!(engine.is_scheduled());
        assert!(engine.session().is_running());
        assert_eq!(engine.session().phase(), Phase::Break);

        assert!(matches!(events.try_recv(), Ok(Event::TimerStarted { phase: Phase::Work, .. })));
        assert!(matches!(events.try_recv(), Ok(Event::PhaseCompleted { .. })));
        assert!(matches!(events.try_recv(), Ok(Event::TimerStarted { phase: Phase::Break, .. })));
    }

    #[tokio::test]
    async fn skip_and_reset_cancel_schedule() {
        let (session, _) = session(60, 10);
        let mut engine = TimerEngine::new(session, &TimerConfig::default());
        engine.start();
        engine.skip();
        assert!(!engine.is_scheduled());
        engine.start();
        engine.reset();
        assert!(!engine.is_scheduled());
        assert_eq!(engine.session().remaining_secs(), engine.session().total_secs());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_engine_runs_phase_to_completion() {
        let (session, store) = session(3, 10);
        let engine = TimerEngine::new(session, &TimerConfig::default());
        let mut events = engine.subscribe();
        let (handle, task) = engine.spawn();

        assert!(handle.start().await.unwrap().is_some());
        loop {
            if let Event::PhaseCompleted { phase, next_phase, .. } = events.recv().await.unwrap() {
                assert_eq!(phase, Phase::Work);
                assert_eq!(next_phase, Phase::Break);
                break;
            }
        }

        match handle.snapshot().await.unwrap() {
            Event::StateSnapshot { phase, is_running, remaining_secs, .. } => {
                assert_eq!(phase, Phase::Break);
                assert!(!is_running);
                assert_eq!(remaining_secs, 10);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }

        handle.shutdown().await.unwrap();
        let session = task.await.unwrap();
        assert_eq!(session.timer_state().completed_pomodoros, 1);
        let saved: serde_json::Value = serde_json::from_slice(&store.contents().unwrap()).unwrap();
        assert_eq!(saved["timerState"]["isBreak"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_tears_down() {
        let (session, _) = session(600, 10);
        let engine = TimerEngine::new(session, &TimerConfig::default());
        let (handle, task) = engine.spawn();
        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(handle);
        let session = task.await.unwrap();
        assert!(session.remaining_secs() <= 596);
        assert!(session.remaining_secs() >= 594);
        assert!(!session.writer().is_dirty());
    }

    #[tokio::test]
    async fn commands_after_shutdown_fail() {
        let (session, _) = session(60, 10);
        let (handle, task) = TimerEngine::new(session, &TimerConfig::default()).spawn();
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(handle.start().await.is_err());
    }
}
