//! Task queue.
//!
//! Pending tasks are kept in user order. A task leaves the pending list for
//! the completed list exactly once and never comes back. At most one pending
//! task is "current"; the pointer is an id, not ownership.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats::StatsAggregator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub estimated_pomodoros: u64,
    #[serde(default)]
    pub completed_pomodoros: u64,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    fn new(name: String, estimated_pomodoros: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            estimated_pomodoros: estimated_pomodoros.max(1),
            completed_pomodoros: 0,
            completed: false,
            created_at: now,
            completed_at: None,
        }
    }

    /// True once the pomodoro budget is met or exceeded.
    pub fn budget_met(&self) -> bool {
        self.completed_pomodoros >= self.estimated_pomodoros
    }
}

/// Result of crediting a pomodoro to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskProgress {
    /// Counter went up; the task is still pending.
    Advanced { completed_pomodoros: u64 },
    /// Counter reached the estimate and the task moved to the completed list.
    Completed(Task),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueue {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    completed_tasks: Vec<Task>,
    #[serde(default)]
    current_task_id: Option<String>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts, dropping a dangling current-task pointer.
    pub(crate) fn from_parts(
        tasks: Vec<Task>,
        completed_tasks: Vec<Task>,
        current_task_id: Option<String>,
    ) -> Self {
        let mut queue = Self {
            tasks,
            completed_tasks,
            current_task_id,
        };
        if queue.current_task().is_none() {
            queue.current_task_id = None;
        }
        queue
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn pending_tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed_tasks
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.current_task_id.as_deref()
    }

    pub fn current_task(&self) -> Option<&Task> {
        let id = self.current_task_id.as_deref()?;
        self.get(id)
    }

    /// Look up a pending task.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a new task. It does not become current.
    pub fn add_task(&mut self, name: impl Into<String>, estimate: u64, now: DateTime<Utc>) -> &Task {
        self.tasks.push(Task::new(name.into(), estimate, now));
        let idx = self.tasks.len() - 1;
        &self.tasks[idx]
    }

    /// Remove a pending task. Unknown ids are ignored.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let idx = self.position(id)?;
        let task = self.tasks.remove(idx);
        if self.current_task_id.as_deref() == Some(id) {
            self.current_task_id = None;
        }
        Some(task)
    }

    /// Move a pending task to the completed list and count it for `today`.
    pub fn complete_task(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        today: NaiveDate,
        stats: &mut StatsAggregator,
    ) -> Option<Task> {
        let idx = self.position(id)?;
        let mut task = self.tasks.remove(idx);
        task.completed = true;
        task.completed_at = Some(now);
        self.completed_tasks.push(task.clone());
        stats.record_task_completion(today);
        if self.current_task_id.as_deref() == Some(id) {
            self.current_task_id = None;
        }
        Some(task)
    }

    /// Credit one pomodoro; completes the task once its budget is met.
    pub fn increment_completed(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        today: NaiveDate,
        stats: &mut StatsAggregator,
    ) -> Option<TaskProgress> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.completed_pomodoros += 1;
        if !task.budget_met() {
            return Some(TaskProgress::Advanced {
                completed_pomodoros: task.completed_pomodoros,
            });
        }
        self.complete_task(id, now, today, stats)
            .map(TaskProgress::Completed)
    }

    /// Point at a pending task, or clear the pointer with `None`.
    ///
    /// Returns false (and changes nothing) for an id that is not pending.
    pub fn set_current_task(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.current_task_id = None;
                true
            }
            Some(id) if self.position(id).is_some() => {
                self.current_task_id = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    /// Remove-then-insert reorder. `to` past the end appends.
    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tasks.len() {
            return false;
        }
        let task = self.tasks.remove(from);
        let to = to.min(self.tasks.len());
        self.tasks.insert(to, task);
        true
    }
}
