//! Project metrics: progress, velocity, trend, and risk.
//!
//! Two risk scales are kept: a continuous `risk_score` and a categorical
//! `risk_level`. Each has its own weight table and they are computed
//! independently; neither is derived from the other.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::{
    HistoryEntry, ProjectRef, ProjectState, RiskLevel, Task, TaskStatus, Time, VelocityTrend,
};

use crate::estimator::CompletionEstimator;

/// Length of the trailing velocity window.
pub const VELOCITY_WINDOW_DAYS: i64 = 7;

/// History entries averaged for the velocity trend.
pub const TREND_SAMPLE_SIZE: usize = 3;

/// Inputs shared by both risk scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Completion percentage
    pub progress_percent: f64,
    /// Overdue task count
    pub overdue_count: usize,
    /// Blocked task count
    pub blocked_count: usize,
    /// Tasks per week
    pub velocity: f64,
}

impl RiskInputs {
    /// Continuous risk score, capped at 1.0.
    ///
    /// Weights are summed in hundredths so equal scores compare equal.
    pub fn score(&self) -> f64 {
        f64::from(self.score_hundredths()) / 100.0
    }

    fn score_hundredths(&self) -> u32 {
        let mut score = 0;

        if self.progress_percent < 25.0 {
            score += 30;
        } else if self.progress_percent < 50.0 {
            score += 15;
        }

        if self.overdue_count > 5 {
            score += 30;
        } else if self.overdue_count > 2 {
            score += 20;
        } else if self.overdue_count > 0 {
            score += 10;
        }

        if self.blocked_count > 3 {
            score += 20;
        } else if self.blocked_count > 0 {
            score += 10;
        }

        if self.velocity < 2.0 {
            score += 20;
        } else if self.velocity < 5.0 {
            score += 10;
        }

        score.min(100)
    }

    /// Integer risk points on the categorical scale.
    pub fn points(&self) -> u32 {
        let mut points = 0;

        if self.progress_percent < 25.0 {
            points += 2;
        } else if self.progress_percent < 50.0 {
            points += 1;
        }

        if self.overdue_count > 5 {
            points += 3;
        } else if self.overdue_count > 2 {
            points += 2;
        } else if self.overdue_count > 0 {
            points += 1;
        }

        if self.blocked_count > 3 {
            points += 2;
        } else if self.blocked_count > 0 {
            points += 1;
        }

        if self.velocity < 2.0 {
            points += 2;
        } else if self.velocity < 5.0 {
            points += 1;
        }

        points
    }

    /// Categorical risk level from the point table.
    pub fn level(&self) -> RiskLevel {
        match self.points() {
            p if p >= 6 => RiskLevel::Critical,
            p if p >= 4 => RiskLevel::High,
            p if p >= 2 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Completed tasks whose last update falls within the trailing week.
pub fn velocity(tasks: &[Task], now: Time) -> f64 {
    let window_start = now - Duration::days(VELOCITY_WINDOW_DAYS);
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .filter(|t| t.updated_at >= window_start && t.updated_at <= now)
        .count() as f64
}

/// Compare `current` against the mean of the last three recorded velocities.
pub fn velocity_trend(current: f64, history: &[HistoryEntry]) -> VelocityTrend {
    if history.len() < TREND_SAMPLE_SIZE {
        return VelocityTrend::Stable;
    }

    let recent = &history[history.len() - TREND_SAMPLE_SIZE..];
    let mean = recent.iter().map(|e| e.velocity).sum::<f64>() / TREND_SAMPLE_SIZE as f64;

    if current > mean * 1.1 {
        VelocityTrend::Increasing
    } else if current < mean * 0.9 {
        VelocityTrend::Decreasing
    } else {
        VelocityTrend::Stable
    }
}

/// Turns a task list into a `ProjectState` snapshot.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    project: ProjectRef,
    estimator: CompletionEstimator,
}

impl MetricsCalculator {
    /// Create a calculator for a project.
    pub fn new(project: ProjectRef) -> Self {
        Self {
            project,
            estimator: CompletionEstimator::new(),
        }
    }

    /// Compute a fresh snapshot at `now`.
    pub fn collect(&self, tasks: &[Task], history: &[HistoryEntry], now: Time) -> ProjectState {
        let total = tasks.len();
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let completed = count(TaskStatus::Done);
        let in_progress = count(TaskStatus::InProgress);
        let blocked = count(TaskStatus::Blocked);

        let overdue_tasks: Vec<_> = tasks
            .iter()
            .filter(|t| t.is_overdue(now))
            .map(|t| t.id.clone())
            .collect();

        let progress_percent = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let velocity = velocity(tasks, now);
        let velocity_trend = velocity_trend(velocity, history);

        let inputs = RiskInputs {
            progress_percent,
            overdue_count: overdue_tasks.len(),
            blocked_count: blocked,
            velocity,
        };
        // An empty board has nothing at risk.
        let (risk_score, risk_level) = if total == 0 {
            (0.0, RiskLevel::Low)
        } else {
            (inputs.score(), inputs.level())
        };

        let projected_completion = self
            .estimator
            .project(total.saturating_sub(completed), velocity, now);

        debug!(
            project = %self.project.project_name,
            total,
            completed,
            progress = progress_percent,
            velocity,
            risk_score,
            risk_level = %risk_level,
            "Collected project metrics"
        );

        ProjectState {
            board_id: self.project.board_id.clone(),
            project_name: self.project.project_name.clone(),
            total_tasks: total,
            completed_tasks: completed,
            in_progress_tasks: in_progress,
            blocked_tasks: blocked,
            overdue_tasks,
            progress_percent,
            velocity,
            velocity_trend,
            risk_level,
            risk_score,
            projected_completion,
            last_updated: now,
        }
    }
}
