use clap::Subcommand;
use focusroom_core::storage::TimerConfig;
use focusroom_core::{Event, Session, TimerEngine};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::{open_session, print_json, Access, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground until the phase ends (Ctrl-C pauses)
    Run {
        /// Keep going into the following phases
        #[arg(long)]
        follow: bool,
    },
    /// Stop and rewind the current phase
    Reset,
    /// Jump to the next phase without counting this one
    Skip,
}

impl TimerAction {
    fn access(&self) -> Access {
        match self {
            TimerAction::Status => Access::Read,
            TimerAction::Run { .. } | TimerAction::Reset | TimerAction::Skip => Access::Write,
        }
    }
}

pub fn run(action: TimerAction) -> CmdResult {
    let (_lock, config, mut session) = open_session(action.access())?;

    match action {
        TimerAction::Status => print_json(&session.snapshot())?,
        TimerAction::Run { follow } => {
            let mut timer = config.timer.clone();
            timer.auto_advance |= follow;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            session = runtime.block_on(run_foreground(session, &timer))?;
        }
        TimerAction::Reset => {
            if let Some(event) = session.reset_timer() {
                print_json(&event)?;
            }
        }
        TimerAction::Skip => {
            if let Some(event) = session.skip_to_next() {
                print_json(&event)?;
            }
        }
    }

    session.flush();
    Ok(())
}

/// Drive the session with a [`TimerEngine`] and stream its events as JSON lines.
async fn run_foreground(
    session: Session,
    timer: &TimerConfig,
) -> Result<Session, Box<dyn std::error::Error>> {
    let engine = TimerEngine::new(session, timer);
    let mut events = engine.subscribe();
    let (handle, task) = engine.spawn();
    handle.start().await?;

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, Event::PhaseCompleted { .. }) && !timer.auto_advance {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if let Some(event) = handle.pause().await? {
                    println!("{}", serde_json::to_string(&event)?);
                }
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(task.await?)
}
