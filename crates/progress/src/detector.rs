//! Issue detection.
//!
//! Runs independent rule checks over the current task list:
//! - Stalled in-progress tasks
//! - Capacity overload (too much work in flight)
//! - Dependency bottlenecks (blocked tasks with many dependents)
//!
//! The risk list is rebuilt from scratch on every call. Risks from earlier
//! calls are not merged or deduplicated.

use std::sync::Arc;
use chrono::Duration;
use tracing::{debug, info, warn};
use vigil_core::{Risk, RiskLevel, RiskType, Task, TaskStatus, Time};
use vigil_storage::DependencyResolver;

/// Default hours without an update before an in-progress task counts as stalled.
pub const DEFAULT_STALL_THRESHOLD_HOURS: u64 = 24;

/// Default maximum number of tasks in progress.
pub const DEFAULT_CAPACITY_THRESHOLD: usize = 10;

/// A blocked task with more dependents than this is a bottleneck.
pub const BOTTLENECK_DEPENDENT_THRESHOLD: usize = 2;

/// Thresholds for the detection rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionThresholds {
    /// Hours without an update before an in-progress task is stalled
    pub stall_threshold_hours: u64,
    /// Maximum in-progress tasks before capacity is overloaded
    pub capacity_threshold: usize,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            stall_threshold_hours: DEFAULT_STALL_THRESHOLD_HOURS,
            capacity_threshold: DEFAULT_CAPACITY_THRESHOLD,
        }
    }
}

/// Detects operational issues in a project.
#[derive(Clone)]
pub struct IssueDetector {
    dependencies: Arc<dyn DependencyResolver>,
    thresholds: DetectionThresholds,
}

impl IssueDetector {
    /// Create a detector with default thresholds.
    pub fn new(dependencies: Arc<dyn DependencyResolver>) -> Self {
        Self {
            dependencies,
            thresholds: DetectionThresholds::default(),
        }
    }

    /// Set the thresholds.
    pub fn with_thresholds(mut self, thresholds: DetectionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Run every check and return a fresh risk list.
    pub async fn detect(&self, tasks: &[Task], now: Time) -> Vec<Risk> {
        let mut risks = self.detect_stalled_tasks(tasks, now);
        risks.extend(self.detect_capacity_overload(tasks, now));
        risks.extend(self.detect_dependency_bottlenecks(tasks, now).await);

        if !risks.is_empty() {
            info!(count = risks.len(), "Detected project risks");
        }
        risks
    }

    /// In-progress tasks not updated within the stall threshold.
    fn detect_stalled_tasks(&self, tasks: &[Task], now: Time) -> Vec<Risk> {
        let threshold = Duration::hours(self.thresholds.stall_threshold_hours as i64);

        tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .filter_map(|task| {
                let elapsed = now.signed_duration_since(task.updated_at);
                if elapsed <= threshold {
                    return None;
                }
                let hours = elapsed.num_minutes() as f64 / 60.0;
                debug!(task_id = %task.id, hours, "Stalled task");
                Some(Risk {
                    risk_type: RiskType::StalledTask,
                    task_id: Some(task.id.clone()),
                    description: format!(
                        "Task '{}' ({}) has not been updated in {:.1} hours",
                        task.name, task.id, hours
                    ),
                    severity: RiskLevel::Medium,
                    probability: 1.0,
                    impact: "Work on this task may have silently stopped".to_string(),
                    mitigation: "Check in with the assigned agent or reassign the task".to_string(),
                    identified_at: now,
                })
            })
            .collect()
    }

    /// More tasks in progress than the team can carry.
    fn detect_capacity_overload(&self, tasks: &[Task], now: Time) -> Option<Risk> {
        let in_progress = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count();

        if in_progress <= self.thresholds.capacity_threshold {
            return None;
        }

        Some(Risk {
            risk_type: RiskType::CapacityOverload,
            task_id: None,
            description: format!(
                "{} tasks in progress exceeds capacity threshold of {}",
                in_progress, self.thresholds.capacity_threshold
            ),
            severity: RiskLevel::High,
            probability: 0.8,
            impact: "Context switching slows every task in flight".to_string(),
            mitigation: "Finish in-progress work before starting new tasks".to_string(),
            identified_at: now,
        })
    }

    /// Blocked tasks that hold up more than two dependents.
    async fn detect_dependency_bottlenecks(&self, tasks: &[Task], now: Time) -> Vec<Risk> {
        let mut risks = Vec::new();

        for task in tasks.iter().filter(|t| t.status == TaskStatus::Blocked) {
            let dependents = match self.dependencies.get_dependents(&task.id).await {
                Ok(dependents) => dependents,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Failed to load dependents, skipping bottleneck check");
                    continue;
                }
            };

            if dependents.len() > BOTTLENECK_DEPENDENT_THRESHOLD {
                risks.push(Risk {
                    risk_type: RiskType::DependencyBottleneck,
                    task_id: Some(task.id.clone()),
                    description: format!(
                        "Blocked task '{}' ({}) is holding up {} dependent tasks",
                        task.name,
                        task.id,
                        dependents.len()
                    ),
                    severity: RiskLevel::High,
                    probability: 1.0,
                    impact: format!("{} downstream tasks cannot start", dependents.len()),
                    mitigation: "Prioritize unblocking this task".to_string(),
                    identified_at: now,
                });
            }
        }

        risks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use vigil_core::TaskId;
    use vigil_storage::{dependents_of, StorageError};

    struct StaticDependencies(Vec<Task>);

    #[async_trait]
    impl DependencyResolver for StaticDependencies {
        async fn get_dependents(&self, task_id: &TaskId) -> vigil_storage::Result<Vec<Task>> {
            Ok(dependents_of(&self.0, task_id))
        }
    }

    struct FailingFor(TaskId, Vec<Task>);

    #[async_trait]
    impl DependencyResolver for FailingFor {
        async fn get_dependents(&self, task_id: &TaskId) -> vigil_storage::Result<Vec<Task>> {
            if *task_id == self.0 {
                Err(StorageError::Unavailable("timeout".to_string()))
            } else {
                Ok(dependents_of(&self.1, task_id))
            }
        }
    }

    fn detector(tasks: &[Task]) -> IssueDetector {
        IssueDetector::new(Arc::new(StaticDependencies(tasks.to_vec())))
    }

    fn task(id: &str, status: TaskStatus, updated_at: Time) -> Task {
        Task::new(id, format!("Task {}", id), status, updated_at)
    }

    fn dependent(id: &str, on: &str, now: Time) -> Task {
        task(id, TaskStatus::Todo, now).with_dependencies([TaskId::new(on)])
    }

    #[tokio::test]
    async fn test_stalled_task_detected_after_threshold() {
        let now = Utc::now();
        let tasks = vec![
            task("stale", TaskStatus::InProgress, now - Duration::hours(30)),
            task("fresh", TaskStatus::InProgress, now - Duration::hours(2)),
            task("old-todo", TaskStatus::Todo, now - Duration::hours(100)),
        ];

        let risks = detector(&tasks).detect(&tasks, now).await;
        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.risk_type, RiskType::StalledTask);
        assert_eq!(risk.severity, RiskLevel::Medium);
        assert_eq!(risk.probability, 1.0);
        assert_eq!(risk.task_id, Some(TaskId::new("stale")));
        assert!(risk.description.contains("Task stale"));
        assert!(risk.description.contains("30.0 hours"));
    }

    #[tokio::test]
    async fn test_stall_threshold_is_configurable() {
        let now = Utc::now();
        let tasks = vec![task("a", TaskStatus::InProgress, now - Duration::hours(5))];
        let detector = detector(&tasks).with_thresholds(DetectionThresholds {
            stall_threshold_hours: 4,
            ..Default::default()
        });

        let risks = detector.detect(&tasks, now).await;
        assert_eq!(risks.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_overload() {
        let now = Utc::now();
        let at_limit: Vec<_> = (0..10)
            .map(|i| task(&i.to_string(), TaskStatus::InProgress, now))
            .collect();
        assert!(detector(&at_limit).detect(&at_limit, now).await.is_empty());

        let mut over = at_limit.clone();
        over.push(task("10", TaskStatus::InProgress, now));
        let risks = detector(&over).detect(&over, now).await;
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].risk_type, RiskType::CapacityOverload);
        assert_eq!(risks[0].severity, RiskLevel::High);
        assert_eq!(risks[0].probability, 0.8);
        assert!(risks[0].task_id.is_none());
    }

    #[tokio::test]
    async fn test_dependency_bottleneck_requires_more_than_two_dependents() {
        let now = Utc::now();
        let tasks = vec![
            task("hub", TaskStatus::Blocked, now),
            task("minor", TaskStatus::Blocked, now),
            dependent("a", "hub", now),
            dependent("b", "hub", now),
            dependent("c", "hub", now),
            dependent("d", "minor", now),
            dependent("e", "minor", now),
        ];

        let risks = detector(&tasks).detect(&tasks, now).await;
        assert_eq!(risks.len(), 1);
        let risk = &risks[0];
        assert_eq!(risk.risk_type, RiskType::DependencyBottleneck);
        assert_eq!(risk.task_id, Some(TaskId::new("hub")));
        assert_eq!(risk.severity, RiskLevel::High);
        assert!(risk.description.contains("3 dependent tasks"));
    }

    #[tokio::test]
    async fn test_failed_dependents_lookup_skips_only_that_task() {
        let now = Utc::now();
        let tasks = vec![
            task("broken", TaskStatus::Blocked, now),
            task("hub", TaskStatus::Blocked, now),
            dependent("a", "hub", now),
            dependent("b", "hub", now),
            dependent("c", "hub", now),
            dependent("x", "broken", now),
            dependent("y", "broken", now),
            dependent("z", "broken", now),
        ];
        let detector = IssueDetector::new(Arc::new(FailingFor(TaskId::new("broken"), tasks.clone())));

        let risks = detector.detect(&tasks, now).await;
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].task_id, Some(TaskId::new("hub")));
    }

    #[tokio::test]
    async fn test_checks_are_independent_and_rebuilt_each_call() {
        let now = Utc::now();
        let mut tasks: Vec<_> = (0..11)
            .map(|i| task(&format!("w{}", i), TaskStatus::InProgress, now - Duration::hours(48)))
            .collect();
        tasks.push(task("hub", TaskStatus::Blocked, now));
        tasks.extend((0..3).map(|i| dependent(&format!("d{}", i), "hub", now)));

        let detector = detector(&tasks);
        let first = detector.detect(&tasks, now).await;
        let stalled = first.iter().filter(|r| r.risk_type == RiskType::StalledTask).count();
        assert_eq!(stalled, 11);
        assert!(first.iter().any(|r| r.risk_type == RiskType::CapacityOverload));
        assert!(first.iter().any(|r| r.risk_type == RiskType::DependencyBottleneck));

        let second = detector.detect(&tasks, now).await;
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn test_no_tasks_no_risks() {
        assert!(detector(&[]).detect(&[], Utc::now()).await.is_empty());
    }
}
