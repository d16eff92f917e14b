//! Project health snapshot model.

use serde::{Deserialize, Serialize};
use crate::id::TaskId;
use crate::Time;

/// Identity of the monitored project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Board the project's tasks live on
    pub board_id: String,

    /// Human-readable project name
    pub project_name: String,
}

impl ProjectRef {
    /// Create a project reference.
    pub fn new(board_id: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            project_name: project_name.into(),
        }
    }
}

/// Point-in-time view of project metrics.
///
/// A new snapshot is computed every monitoring cycle and replaces the
/// previous one wholesale; snapshots are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Board identifier
    pub board_id: String,

    /// Project name
    pub project_name: String,

    /// Total number of tasks
    pub total_tasks: usize,

    /// Tasks with status `Done`
    pub completed_tasks: usize,

    /// Tasks with status `InProgress`
    pub in_progress_tasks: usize,

    /// Tasks with status `Blocked`
    pub blocked_tasks: usize,

    /// Unfinished tasks past their due date
    pub overdue_tasks: Vec<TaskId>,

    /// Completion percentage (0-100)
    pub progress_percent: f64,

    /// Tasks completed over the trailing week
    pub velocity: f64,

    /// Direction of velocity relative to recent history
    pub velocity_trend: VelocityTrend,

    /// Categorical risk
    pub risk_level: RiskLevel,

    /// Continuous risk in `[0, 1]`
    pub risk_score: f64,

    /// Projected completion at the current velocity
    pub projected_completion: Option<Time>,

    /// When the snapshot was computed
    pub last_updated: Time,
}

impl ProjectState {
    /// Tasks not yet done.
    pub fn remaining_tasks(&self) -> usize {
        self.total_tasks.saturating_sub(self.completed_tasks)
    }

    /// Number of overdue tasks.
    pub fn overdue_count(&self) -> usize {
        self.overdue_tasks.len()
    }
}

/// Risk level, also used as the severity of individual risks and blockers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// On track
    Low,
    /// Worth watching
    Medium,
    /// Needs intervention
    High,
    /// Delivery in jeopardy
    Critical,
}

impl RiskLevel {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Velocity trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityTrend {
    /// More than 10% above the recent mean
    Increasing,
    /// Within 10% of the recent mean
    Stable,
    /// More than 10% below the recent mean
    Decreasing,
}

impl std::fmt::Display for VelocityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VelocityTrend::Increasing => write!(f, "increasing"),
            VelocityTrend::Stable => write!(f, "stable"),
            VelocityTrend::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// One recorded monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the cycle ran
    pub timestamp: Time,

    /// Progress percentage at that time
    pub progress: f64,

    /// Velocity at that time
    pub velocity: f64,

    /// Blocked task count
    pub blocked_tasks: usize,

    /// Risk level
    pub risk_level: RiskLevel,

    /// Total task count
    pub total_tasks: usize,

    /// Completed task count
    pub completed_tasks: usize,
}

impl HistoryEntry {
    /// Record a snapshot taken at `timestamp`.
    pub fn from_state(state: &ProjectState, timestamp: Time) -> Self {
        Self {
            timestamp,
            progress: state.progress_percent,
            velocity: state.velocity,
            blocked_tasks: state.blocked_tasks,
            risk_level: state.risk_level,
            total_tasks: state.total_tasks,
            completed_tasks: state.completed_tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&VelocityTrend::Decreasing).unwrap(), "\"decreasing\"");
        assert_eq!(VelocityTrend::Stable.to_string(), "stable");
    }

    #[test]
    fn test_history_entry_copies_snapshot_metrics() {
        let now = chrono::Utc::now();
        let state = ProjectState {
            board_id: "b".to_string(),
            project_name: "p".to_string(),
            total_tasks: 10,
            completed_tasks: 4,
            in_progress_tasks: 3,
            blocked_tasks: 2,
            overdue_tasks: vec![TaskId::new("late")],
            progress_percent: 40.0,
            velocity: 4.0,
            velocity_trend: VelocityTrend::Stable,
            risk_level: RiskLevel::High,
            risk_score: 0.55,
            projected_completion: None,
            last_updated: now,
        };

        let entry = HistoryEntry::from_state(&state, now);
        assert_eq!(entry.total_tasks, 10);
        assert_eq!(entry.completed_tasks, 4);
        assert_eq!(entry.blocked_tasks, 2);
        assert_eq!(entry.risk_level, RiskLevel::High);
        assert_eq!(state.remaining_tasks(), 6);
        assert_eq!(state.overdue_count(), 1);
    }
}
