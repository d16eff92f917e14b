//! Downstream analysis seams invoked when a project completes.

use async_trait::async_trait;
use vigil_core::{Outcome, Pattern, ProjectState, QualityAssessment, Task, TeamMember};

/// Scores the quality of a finished project.
#[async_trait]
pub trait QualityAssessor: Send + Sync {
    /// Assess the project as it stands.
    async fn assess(
        &self,
        state: &ProjectState,
        tasks: &[Task],
        team: &[TeamMember],
    ) -> anyhow::Result<QualityAssessment>;
}

/// Learns reusable patterns from finished projects.
#[async_trait]
pub trait PatternLearner: Send + Sync {
    /// Learn from a completed project and its outcome.
    async fn learn(
        &self,
        state: &ProjectState,
        tasks: &[Task],
        team: &[TeamMember],
        outcome: &Outcome,
    ) -> anyhow::Result<Pattern>;
}

/// Errors from the downstream analysis calls.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    /// The quality assessor failed
    #[error("quality assessment failed: {0:#}")]
    Assessment(anyhow::Error),

    /// The pattern learner failed
    #[error("pattern learning failed: {0:#}")]
    Learning(anyhow::Error),
}
