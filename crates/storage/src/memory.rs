//! In-memory task source.

use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use tokio::sync::RwLock;
use vigil_core::{Task, TaskId};

use super::{dependents_of, DependencyResolver, Result, StorageError, TaskSnapshotProvider};

/// Thread-safe task list that can stand in for a remote task store.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
    failure: RwLock<Option<String>>,
    fetches: AtomicUsize,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with tasks.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
            ..Default::default()
        }
    }

    /// Insert a task, replacing any task with the same id.
    pub async fn upsert(&self, task: Task) {
        let mut tasks = self.tasks.write().await;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
    }

    /// Remove a task. Returns the removed task if present.
    pub async fn remove(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let pos = tasks.iter().position(|t| &t.id == id)?;
        Some(tasks.remove(pos))
    }

    /// Make every subsequent read fail with `Unavailable(reason)`, or clear
    /// the failure with `None`.
    pub async fn set_failure(&self, reason: Option<String>) {
        *self.failure.write().await = reason;
    }

    /// Number of `get_all_tasks` calls served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn check_available(&self) -> Result<()> {
        match self.failure.read().await.as_ref() {
            Some(reason) => Err(StorageError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskSnapshotProvider for InMemoryTaskStore {
    async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available().await?;
        Ok(self.tasks.read().await.clone())
    }
}

#[async_trait]
impl DependencyResolver for InMemoryTaskStore {
    async fn get_dependents(&self, task_id: &TaskId) -> Result<Vec<Task>> {
        self.check_available().await?;
        Ok(dependents_of(&self.tasks.read().await, task_id))
    }
}
