//! vigil core data models.
//!
//! This crate defines the records that flow through a project health
//! monitor: tasks read from the store, the per-cycle snapshot, detected
//! risks, reported blockers, and the hand-off to downstream learning.

#![warn(missing_docs)]

// Core identities
mod id;

// Tasks and project snapshots
mod task;
mod project;

// Risks and blockers
mod risk;

// Downstream analysis records
mod learning;

// Re-exports
pub use id::*;

pub use task::{Task, TaskStatus, UnknownStatus};
pub use project::{ProjectRef, ProjectState, RiskLevel, VelocityTrend, HistoryEntry};
pub use risk::{Risk, RiskType, BlockerReport};
pub use learning::{TeamMember, QualityAssessment, Pattern, Outcome};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
