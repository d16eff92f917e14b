//! JSON file task source.
//!
//! Reads a JSON array of tasks from disk on every call, so an external
//! process can rewrite the file between monitoring cycles.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use vigil_core::{Task, TaskId};

use super::{dependents_of, DependencyResolver, Result, StorageError, TaskSnapshotProvider};

/// Read-only task source backed by a JSON file.
pub struct JsonTaskSnapshot {
    path: PathBuf,
}

impl JsonTaskSnapshot {
    /// Create a source reading from `path`. The file is not touched until
    /// the first read.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn load(&self) -> Result<Vec<Task>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(self.path.display().to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        let tasks: Vec<Task> = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), count = tasks.len(), "Loaded task snapshot");
        Ok(tasks)
    }
}

#[async_trait]
impl TaskSnapshotProvider for JsonTaskSnapshot {
    async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.load().await
    }
}

#[async_trait]
impl DependencyResolver for JsonTaskSnapshot {
    async fn get_dependents(&self, task_id: &TaskId) -> Result<Vec<Task>> {
        let tasks = self.load().await?;
        Ok(dependents_of(&tasks, task_id))
    }
}
