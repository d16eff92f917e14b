//! Quality Assurance
//!
//! Completion gate and the downstream quality/learning seams it drives.

#![warn(missing_docs)]

pub mod assessor;
pub mod gate;

pub use assessor::{DownstreamError, PatternLearner, QualityAssessor};
pub use gate::{
    estimate_cost, project_duration_days, CompletionCriteria, CompletionGate, CompletionReport,
    GateDecision, DEFAULT_COMPLETION_THRESHOLD, DEFAULT_COOLDOWN_HOURS, DEFAULT_DAILY_RATE,
};
