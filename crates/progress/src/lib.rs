//! Progress Tracking
//!
//! Project metrics, issue detection, and snapshot history.

#![warn(missing_docs)]

pub mod metrics;
pub mod detector;
pub mod history;
pub mod estimator;

pub use metrics::{velocity, velocity_trend, MetricsCalculator, RiskInputs};
pub use detector::{
    DetectionThresholds, IssueDetector, DEFAULT_CAPACITY_THRESHOLD, DEFAULT_STALL_THRESHOLD_HOURS,
};
pub use history::{HistoryRecorder, DEFAULT_HISTORY_CAPACITY};
pub use estimator::CompletionEstimator;
