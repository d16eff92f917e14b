//! Task source abstraction.

use async_trait::async_trait;
use vigil_core::{Task, TaskId};

/// Error type for task source operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading from a task source.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached
    #[error("Task source unavailable: {0}")]
    Unavailable(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Supplies the current list of tasks for a project.
///
/// Implementations are usually network clients; the caller owns timeout and
/// retry policy.
#[async_trait]
pub trait TaskSnapshotProvider: Send + Sync {
    /// Fetch every task on the board.
    async fn get_all_tasks(&self) -> Result<Vec<Task>>;
}

/// Answers reverse-dependency queries.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    /// Tasks that list `task_id` as one of their dependencies.
    async fn get_dependents(&self, task_id: &TaskId) -> Result<Vec<Task>>;
}

/// Reverse-dependency lookup over an in-memory task list.
pub fn dependents_of(tasks: &[Task], task_id: &TaskId) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.depends_on(task_id))
        .cloned()
        .collect()
}
