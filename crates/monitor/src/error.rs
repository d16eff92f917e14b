//! Monitor error taxonomy.

use vigil_storage::StorageError;

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors raised by the monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Invalid configuration. Only returned at construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The task source failed during a cycle. The rest of the cycle is skipped.
    #[error("failed to collect tasks: {0}")]
    TransientCollection(#[from] StorageError),

    /// A downstream analyzer failed. Logged and swallowed by the loop.
    #[error("downstream analysis failed: {0:#}")]
    DownstreamAnalysis(anyhow::Error),
}

impl MonitorError {
    /// Whether the next cycle may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        !matches!(self, MonitorError::Configuration(_))
    }
}
