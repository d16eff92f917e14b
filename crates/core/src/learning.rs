//! Records exchanged with the quality assessor and pattern learner.

use serde::{Deserialize, Serialize};
use crate::id::AgentId;

/// A team member working on the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Agent identifier
    pub agent_id: AgentId,

    /// Display name
    pub name: String,

    /// Role on the team
    pub role: String,

    /// Skills
    #[serde(default)]
    pub skills: Vec<String>,
}

impl TeamMember {
    /// Create a team member without skills.
    pub fn new(agent_id: AgentId, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            agent_id,
            name: name.into(),
            role: role.into(),
            skills: Vec::new(),
        }
    }
}

/// Quality assessment of a finished project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Overall score (0-1)
    pub overall_score: f64,

    /// Whether the project counts as a success
    pub is_successful: bool,

    /// Areas to improve
    pub improvement_areas: Vec<String>,
}

/// Pattern extracted by the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Confidence in the pattern (0-1)
    pub confidence_score: f64,

    /// What contributed to success
    pub success_factors: Vec<String>,

    /// What put delivery at risk
    pub risk_factors: Vec<String>,
}

/// Outcome of a completed project, handed to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the project succeeded
    pub successful: bool,

    /// Elapsed days from first observation to completion
    pub completion_time_days: f64,

    /// Quality score from the assessment
    pub quality_score: f64,

    /// Estimated cost
    pub cost: f64,

    /// Reasons for failure, empty on success
    pub failure_reasons: Vec<String>,
}
