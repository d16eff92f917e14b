//! Qualitative project health analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vigil_core::{
    BlockerReport, ProjectState, RiskLevel, Task, TeamMember, Time, VelocityTrend,
};

/// Overall health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// On track
    Green,
    /// Needs attention
    Yellow,
    /// Delivery at risk
    Red,
}

/// A qualitative assessment of project health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAnalysis {
    /// Overall verdict
    pub overall_health: HealthStatus,
    /// Short narrative summary
    pub summary: String,
    /// Suggested actions
    pub recommendations: Vec<String>,
    /// Confidence in the analysis (0-1)
    pub confidence: f64,
    /// When the analysis ran
    pub analyzed_at: Time,
}

/// Produces a qualitative health analysis, typically backed by an LLM.
#[async_trait]
pub trait HealthAnalyzer: Send + Sync {
    /// Analyze the current snapshot.
    async fn analyze(
        &self,
        state: &ProjectState,
        tasks: &[Task],
        team: &[TeamMember],
        blockers: &[BlockerReport],
    ) -> anyhow::Result<HealthAnalysis>;
}

/// Deterministic analyzer deriving its verdict from the computed metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedHealthAnalyzer;

impl RuleBasedHealthAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HealthAnalyzer for RuleBasedHealthAnalyzer {
    async fn analyze(
        &self,
        state: &ProjectState,
        _tasks: &[Task],
        team: &[TeamMember],
        blockers: &[BlockerReport],
    ) -> anyhow::Result<HealthAnalysis> {
        let overall_health = match state.risk_level {
            RiskLevel::Low => HealthStatus::Green,
            RiskLevel::Medium => HealthStatus::Yellow,
            RiskLevel::High | RiskLevel::Critical => HealthStatus::Red,
        };

        let mut recommendations = Vec::new();
        if state.overdue_count() > 0 {
            recommendations.push(format!(
                "Re-plan or descope {} overdue task(s)",
                state.overdue_count()
            ));
        }
        if state.blocked_tasks > 0 || !blockers.is_empty() {
            recommendations.push(format!(
                "Resolve {} blocked task(s) and {} reported blocker(s)",
                state.blocked_tasks,
                blockers.len()
            ));
        }
        if state.velocity_trend == VelocityTrend::Decreasing {
            recommendations.push("Investigate the drop in weekly velocity".to_string());
        }
        if team.is_empty() && state.remaining_tasks() > 0 {
            recommendations.push("Assign agents to the remaining work".to_string());
        }

        let summary = format!(
            "{}: {:.0}% complete ({} of {} tasks), velocity {:.0}/week ({}), risk {}",
            state.project_name,
            state.progress_percent,
            state.completed_tasks,
            state.total_tasks,
            state.velocity,
            state.velocity_trend,
            state.risk_level
        );

        Ok(HealthAnalysis {
            overall_health,
            summary,
            recommendations,
            confidence: 0.6,
            analyzed_at: state.last_updated,
        })
    }
}
