//! Completion time estimation.

use chrono::Duration;
use vigil_core::Time;

const MILLIS_PER_WEEK: f64 = 7.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Completion time estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionEstimator;

impl CompletionEstimator {
    /// Create a new estimator.
    pub fn new() -> Self {
        Self
    }

    /// Project when the remaining tasks finish at `velocity` tasks per week.
    ///
    /// Returns `None` when nothing remains or nothing is moving.
    pub fn project(&self, remaining_tasks: usize, velocity: f64, now: Time) -> Option<Time> {
        if remaining_tasks == 0 || velocity <= 0.0 || !velocity.is_finite() {
            return None;
        }

        let weeks = remaining_tasks as f64 / velocity;
        let millis = (weeks * MILLIS_PER_WEEK).round();
        if millis >= i64::MAX as f64 {
            return None;
        }
        let offset = Duration::try_milliseconds(millis as i64)?;
        now.checked_add_signed(offset)
    }
}
