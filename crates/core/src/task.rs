//! Task model - the unit of work observed by the monitor.
//!
//! Tasks are owned by the external task store; vigil only reads them.

use serde::{Deserialize, Serialize};
use crate::id::{AgentId, TaskId};
use crate::Time;

/// A task as reported by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task name
    pub name: String,

    /// Current status
    pub status: TaskStatus,

    /// Agent currently working on the task
    #[serde(default)]
    pub assigned_to: Option<AgentId>,

    /// Due date, if any
    #[serde(default)]
    pub due_date: Option<Time>,

    /// Last update timestamp
    pub updated_at: Time,

    /// Tasks that must finish before this one
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    /// Create a task with no due date, assignee or dependencies.
    pub fn new(
        id: impl Into<TaskId>,
        name: impl Into<String>,
        status: TaskStatus,
        updated_at: Time,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            assigned_to: None,
            due_date: None,
            updated_at,
            dependencies: Vec::new(),
        }
    }

    /// Set the due date.
    pub fn with_due_date(mut self, due: Time) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set the dependencies.
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    /// Whether the task has reached `Done`.
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Not done and past its due date.
    pub fn is_overdue(&self, now: Time) -> bool {
        !self.is_done() && self.due_date.is_some_and(|due| due < now)
    }

    /// Whether this task lists `other` as a dependency.
    pub fn depends_on(&self, other: &TaskId) -> bool {
        self.dependencies.contains(other)
    }
}

/// Task status as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    Todo,
    /// Currently being worked on
    InProgress,
    /// Cannot progress
    Blocked,
    /// Completed
    Done,
}

impl TaskStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a status string coming from a task store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "todo" | "to_do" => Ok(TaskStatus::Todo),
            "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" => Ok(TaskStatus::Done),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}
