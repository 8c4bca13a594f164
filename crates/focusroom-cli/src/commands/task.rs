//! Task queue commands for CLI.

use clap::Subcommand;

use super::{open_session, print_json, Access, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the end of the queue
    Add {
        /// Task name
        name: String,
        /// Estimated pomodoros (default: 1)
        #[arg(long, default_value = "1")]
        estimate: u64,
    },
    /// List pending tasks in queue order
    List {
        /// List completed tasks instead
        #[arg(long)]
        completed: bool,
    },
    /// Remove a pending task
    Remove {
        /// Task ID
        id: String,
    },
    /// Mark a pending task as completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Show, set or clear the current task
    Current {
        /// Task ID to make current
        id: Option<String>,
        /// Clear the current task
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
    /// Move a pending task to another position (0-based)
    Move { from: usize, to: usize },
}

impl TaskAction {
    fn access(&self) -> Access {
        match self {
            TaskAction::List { .. } => Access::Read,
            TaskAction::Current { id: None, clear: false } => Access::Read,
            _ => Access::Write,
        }
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let (_lock, _, mut session) = open_session(action.access())?;

    match action {
        TaskAction::Add { name, estimate } => {
            let task = session.add_task(name, estimate);
            print_json(&task)?;
        }
        TaskAction::List { completed } => {
            if completed {
                print_json(session.completed_tasks())?;
            } else {
                print_json(session.pending_tasks())?;
            }
        }
        TaskAction::Remove { id } => {
            let event = session
                .remove_task(&id)
                .ok_or_else(|| format!("no pending task with id {id}"))?;
            print_json(&event)?;
        }
        TaskAction::Complete { id } => {
            let event = session
                .complete_task(&id)
                .ok_or_else(|| format!("no pending task with id {id}"))?;
            print_json(&event)?;
        }
        TaskAction::Current { id, clear } => {
            if clear || id.is_some() {
                let event = session
                    .set_current_task(id.as_deref())
                    .ok_or_else(|| format!("no pending task with id {}", id.unwrap_or_default()))?;
                print_json(&event)?;
            } else {
                print_json(&session.current_task())?;
            }
        }
        TaskAction::Move { from, to } => {
            let event = session
                .move_task(from, to)
                .ok_or_else(|| format!("no pending task at position {from}"))?;
            print_json(&event)?;
        }
    }

    session.flush();
    Ok(())
}
