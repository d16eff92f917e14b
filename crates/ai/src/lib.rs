//! AI analysis seams.
//!
//! Qualitative health analysis consumed by the monitor loop.

#![warn(missing_docs)]

pub mod r#interface;

pub use r#interface::{HealthAnalysis, HealthAnalyzer, HealthStatus, RuleBasedHealthAnalyzer};
