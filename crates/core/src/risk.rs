//! Risk and blocker records.

use serde::{Deserialize, Serialize};
use crate::id::{AgentId, BlockerId, TaskId};
use crate::project::RiskLevel;
use crate::Time;

/// A detected threat to delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    /// Which check raised it
    pub risk_type: RiskType,

    /// Task the risk is about, if task-specific
    pub task_id: Option<TaskId>,

    /// What was detected
    pub description: String,

    /// Severity
    pub severity: RiskLevel,

    /// Probability the risk materializes (0-1)
    pub probability: f64,

    /// Expected impact
    pub impact: String,

    /// Suggested mitigation
    pub mitigation: String,

    /// When detected
    pub identified_at: Time,
}

/// Kinds of detected risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    /// In-progress task with no recent update
    StalledTask,
    /// Too much work in flight
    CapacityOverload,
    /// Blocked task holding up many dependents
    DependencyBottleneck,
}

impl RiskType {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskType::StalledTask => "stalled_task",
            RiskType::CapacityOverload => "capacity_overload",
            RiskType::DependencyBottleneck => "dependency_bottleneck",
        }
    }
}

impl std::fmt::Display for RiskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocker reported by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerReport {
    /// Unique identifier
    pub id: BlockerId,

    /// Blocked task
    pub task_id: TaskId,

    /// Who reported it
    pub reporter_id: AgentId,

    /// What is blocking
    pub description: String,

    /// Severity
    pub severity: RiskLevel,

    /// When reported
    pub reported_at: Time,

    /// Whether it has been resolved
    pub resolved: bool,

    /// When resolved
    pub resolved_at: Option<Time>,
}

impl BlockerReport {
    /// Create an unresolved blocker.
    pub fn new(
        task_id: TaskId,
        reporter_id: AgentId,
        description: impl Into<String>,
        severity: RiskLevel,
        reported_at: Time,
    ) -> Self {
        Self {
            id: BlockerId::new(),
            task_id,
            reporter_id,
            description: description.into(),
            severity,
            reported_at,
            resolved: false,
            resolved_at: None,
        }
    }

    /// Mark as resolved.
    pub fn resolve(&mut self, at: Time) {
        self.resolved = true;
        self.resolved_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocker_starts_unresolved() {
        let now = chrono::Utc::now();
        let mut blocker = BlockerReport::new(
            TaskId::new("t1"),
            AgentId::new("agent-7"),
            "waiting on credentials",
            RiskLevel::Medium,
            now,
        );
        assert!(!blocker.resolved);
        assert!(blocker.resolved_at.is_none());

        blocker.resolve(now);
        assert!(blocker.resolved);
        assert_eq!(blocker.resolved_at, Some(now));
    }

    #[test]
    fn test_risk_type_names() {
        assert_eq!(RiskType::StalledTask.to_string(), "stalled_task");
        assert_eq!(
            serde_json::to_string(&RiskType::DependencyBottleneck).unwrap(),
            "\"dependency_bottleneck\""
        );
    }
}
