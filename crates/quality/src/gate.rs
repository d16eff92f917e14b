//! Completion gate.
//!
//! Decides when a project is done enough to hand off to downstream
//! learning, and debounces the hand-off so it fires once per completion.

use std::sync::Arc;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vigil_core::{
    Outcome, Pattern, ProjectState, QualityAssessment, Task, TeamMember, Time,
};

use crate::assessor::{DownstreamError, PatternLearner, QualityAssessor};

/// Default progress required to count as complete.
pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 95.0;

/// Default cooldown between triggers.
pub const DEFAULT_COOLDOWN_HOURS: u64 = 24;

/// Default cost per team member per day.
pub const DEFAULT_DAILY_RATE: f64 = 1000.0;

/// Project duration assumed when no history is available.
pub const FALLBACK_DURATION_DAYS: f64 = 30.0;

/// Team size assumed for costing when the team is empty.
pub const FALLBACK_TEAM_SIZE: usize = 3;

/// Blocked share of all tasks must stay below this to complete.
pub const MAX_BLOCKED_RATIO: f64 = 0.05;

/// Conditions a snapshot must meet to count as complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionCriteria {
    /// Minimum progress percentage
    pub completion_threshold_percent: f64,
}

impl Default for CompletionCriteria {
    fn default() -> Self {
        Self {
            completion_threshold_percent: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

impl CompletionCriteria {
    /// Whether all completion conditions hold.
    pub fn is_met(&self, state: &ProjectState) -> bool {
        let blocked_ok = if state.total_tasks == 0 {
            true
        } else {
            (state.blocked_tasks as f64 / state.total_tasks as f64) < MAX_BLOCKED_RATIO
        };

        state.progress_percent >= self.completion_threshold_percent
            && state.in_progress_tasks == 0
            && blocked_ok
    }
}

/// Estimate project cost from duration and team size.
pub fn estimate_cost(duration_days: f64, team_size: usize, daily_rate: f64) -> f64 {
    if team_size == 0 {
        duration_days * daily_rate * FALLBACK_TEAM_SIZE as f64
    } else {
        duration_days * team_size as f64 * daily_rate
    }
}

/// Days from the earliest observation to `now`.
pub fn project_duration_days(earliest: Option<Time>, now: Time) -> f64 {
    match earliest {
        Some(start) => now.signed_duration_since(start).num_seconds() as f64 / 86_400.0,
        None => FALLBACK_DURATION_DAYS,
    }
}

/// What the gate decided on a check.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Completion criteria not met
    NotMet,
    /// Criteria met, but a trigger fired recently
    CoolingDown {
        /// When the cooldown ends
        until: Time,
    },
    /// Completion handling ran
    Triggered(CompletionReport),
}

impl GateDecision {
    /// Whether completion handling ran.
    pub fn is_triggered(&self) -> bool {
        matches!(self, GateDecision::Triggered(_))
    }
}

/// Result of completion handling.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    /// When the gate fired
    pub triggered_at: Time,
    /// Project duration in days
    pub duration_days: f64,
    /// Estimated cost
    pub cost: f64,
    /// Quality assessment, if the assessor ran
    pub assessment: Option<QualityAssessment>,
    /// Outcome handed to the learner
    pub outcome: Option<Outcome>,
    /// Learned pattern, if the learner ran
    pub pattern: Option<Pattern>,
    /// Downstream failure, if any
    pub error: Option<String>,
}

/// Evaluates completion criteria and debounces downstream analysis.
///
/// The trigger timestamp is per gate, so each monitored project debounces
/// independently.
pub struct CompletionGate {
    criteria: CompletionCriteria,
    cooldown: Duration,
    daily_rate: f64,
    last_triggered: Option<Time>,
    assessor: Option<Arc<dyn QualityAssessor>>,
    learner: Option<Arc<dyn PatternLearner>>,
}

impl CompletionGate {
    /// Create a gate with default criteria, cooldown, and rate.
    pub fn new() -> Self {
        Self {
            criteria: CompletionCriteria::default(),
            cooldown: Duration::hours(DEFAULT_COOLDOWN_HOURS as i64),
            daily_rate: DEFAULT_DAILY_RATE,
            last_triggered: None,
            assessor: None,
            learner: None,
        }
    }

    /// Set the completion criteria.
    pub fn with_criteria(mut self, criteria: CompletionCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Set the cooldown between triggers.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the daily rate used for cost estimates.
    pub fn with_daily_rate(mut self, daily_rate: f64) -> Self {
        self.daily_rate = daily_rate;
        self
    }

    /// Set the quality assessor.
    pub fn with_assessor(mut self, assessor: Arc<dyn QualityAssessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    /// Set the pattern learner.
    pub fn with_learner(mut self, learner: Arc<dyn PatternLearner>) -> Self {
        self.learner = Some(learner);
        self
    }

    /// When the gate last fired.
    pub fn last_triggered(&self) -> Option<Time> {
        self.last_triggered
    }

    /// Check a snapshot and run completion handling if due.
    ///
    /// Downstream failures are logged and recorded in the report; the
    /// trigger timestamp advances regardless.
    pub async fn check(
        &mut self,
        state: &ProjectState,
        tasks: &[Task],
        team: &[TeamMember],
        history_start: Option<Time>,
        now: Time,
    ) -> GateDecision {
        if !self.criteria.is_met(state) {
            return GateDecision::NotMet;
        }

        if let Some(last) = self.last_triggered {
            let until = last + self.cooldown;
            if now < until {
                return GateDecision::CoolingDown { until };
            }
        }

        self.last_triggered = Some(now);

        let duration_days = project_duration_days(history_start, now);
        let cost = estimate_cost(duration_days, team.len(), self.daily_rate);
        info!(
            project = %state.project_name,
            progress = state.progress_percent,
            duration_days,
            cost,
            "Project completion detected"
        );

        let mut report = CompletionReport {
            triggered_at: now,
            duration_days,
            cost,
            assessment: None,
            outcome: None,
            pattern: None,
            error: None,
        };

        if let Err(e) = self.run_downstream(state, tasks, team, &mut report).await {
            warn!(project = %state.project_name, error = %e, "Completion analysis failed");
            report.error = Some(e.to_string());
        }

        GateDecision::Triggered(report)
    }

    async fn run_downstream(
        &self,
        state: &ProjectState,
        tasks: &[Task],
        team: &[TeamMember],
        report: &mut CompletionReport,
    ) -> Result<(), DownstreamError> {
        let Some(assessor) = &self.assessor else {
            if self.learner.is_some() {
                debug!(
                    project = %state.project_name,
                    "No quality assessor configured, skipping pattern learning"
                );
            }
            return Ok(());
        };

        let assessment = assessor
            .assess(state, tasks, team)
            .await
            .map_err(DownstreamError::Assessment)?;

        let outcome = Outcome {
            successful: assessment.is_successful,
            completion_time_days: report.duration_days,
            quality_score: assessment.overall_score,
            cost: report.cost,
            failure_reasons: if assessment.is_successful {
                Vec::new()
            } else {
                assessment.improvement_areas.clone()
            },
        };
        report.assessment = Some(assessment);
        report.outcome = Some(outcome.clone());

        if let Some(learner) = &self.learner {
            let pattern = learner
                .learn(state, tasks, team, &outcome)
                .await
                .map_err(DownstreamError::Learning)?;
            info!(confidence = pattern.confidence_score, "Learned project pattern");
            report.pattern = Some(pattern);
        }

        Ok(())
    }
}

impl Default for CompletionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vigil_core::{AgentId, RiskLevel, VelocityTrend};

    fn state(total: usize, completed: usize, in_progress: usize, blocked: usize) -> ProjectState {
        let progress = if total == 0 { 0.0 } else { completed as f64 / total as f64 * 100.0 };
        ProjectState {
            board_id: "board".to_string(),
            project_name: "Apollo".to_string(),
            total_tasks: total,
            completed_tasks: completed,
            in_progress_tasks: in_progress,
            blocked_tasks: blocked,
            overdue_tasks: Vec::new(),
            progress_percent: progress,
            velocity: 5.0,
            velocity_trend: VelocityTrend::Stable,
            risk_level: RiskLevel::Low,
            risk_score: 0.0,
            projected_completion: None,
            last_updated: Utc::now(),
        }
    }

    fn team(n: usize) -> Vec<TeamMember> {
        (0..n)
            .map(|i| TeamMember::new(AgentId::new(format!("agent-{}", i)), "Agent", "developer"))
            .collect()
    }

    struct CountingAssessor {
        calls: AtomicUsize,
        fail: bool,
        successful: bool,
    }

    #[async_trait]
    impl QualityAssessor for CountingAssessor {
        async fn assess(
            &self,
            _state: &ProjectState,
            _tasks: &[Task],
            _team: &[TeamMember],
        ) -> anyhow::Result<QualityAssessment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("assessor offline");
            }
            Ok(QualityAssessment {
                overall_score: 0.82,
                is_successful: self.successful,
                improvement_areas: vec!["test coverage".to_string()],
            })
        }
    }

    fn assessor(fail: bool, successful: bool) -> Arc<CountingAssessor> {
        Arc::new(CountingAssessor {
            calls: AtomicUsize::new(0),
            fail,
            successful,
        })
    }

    #[derive(Default)]
    struct RecordingLearner {
        outcomes: Mutex<Vec<Outcome>>,
    }

    #[async_trait]
    impl PatternLearner for RecordingLearner {
        async fn learn(
            &self,
            _state: &ProjectState,
            _tasks: &[Task],
            _team: &[TeamMember],
            outcome: &Outcome,
        ) -> anyhow::Result<Pattern> {
            self.outcomes.lock().unwrap().push(outcome.clone());
            Ok(Pattern {
                confidence_score: 0.7,
                success_factors: vec!["small batches".to_string()],
                risk_factors: Vec::new(),
            })
        }
    }

    #[test]
    fn test_criteria() {
        let criteria = CompletionCriteria::default();
        assert!(criteria.is_met(&state(100, 96, 0, 4)));
        assert!(!criteria.is_met(&state(100, 94, 0, 0)));
        assert!(!criteria.is_met(&state(100, 99, 1, 0)));
        // 5% blocked is not below the limit.
        assert!(!criteria.is_met(&state(20, 19, 0, 1)));
    }

    #[test]
    fn test_empty_project_blocked_ratio_is_satisfied() {
        let criteria = CompletionCriteria {
            completion_threshold_percent: 0.0,
        };
        assert!(criteria.is_met(&state(0, 0, 0, 0)));
        assert!(!CompletionCriteria::default().is_met(&state(0, 0, 0, 0)));
    }

    #[test]
    fn test_cost_estimate() {
        assert_eq!(estimate_cost(10.0, 4, 1000.0), 40_000.0);
        assert_eq!(estimate_cost(10.0, 0, 1000.0), 30_000.0);
    }

    #[test]
    fn test_duration_falls_back_without_history() {
        let now = Utc::now();
        assert_eq!(project_duration_days(None, now), 30.0);
        assert_eq!(project_duration_days(Some(now - Duration::days(12)), now), 12.0);
    }

    #[tokio::test]
    async fn test_learner_without_assessor_is_skipped() {
        let learner = Arc::new(RecordingLearner::default());
        let mut gate = CompletionGate::new().with_learner(learner.clone());

        let decision = gate.check(&state(10, 10, 0, 0), &[], &[], None, Utc::now()).await;
        let GateDecision::Triggered(report) = decision else {
            panic!("expected a trigger");
        };
        assert!(report.assessment.is_none());
        assert!(report.pattern.is_none());
        assert!(report.error.is_none());
        assert!(learner.outcomes.lock().unwrap().is_empty());
        assert!(gate.last_triggered().is_some());
    }

    #[tokio::test]
    async fn test_not_met_does_not_trigger() {
        let assessor = assessor(false, true);
        let mut gate = CompletionGate::new().with_assessor(assessor.clone());
        let decision = gate.check(&state(10, 5, 2, 0), &[], &[], None, Utc::now()).await;

        assert!(matches!(decision, GateDecision::NotMet));
        assert!(gate.last_triggered().is_none());
        assert_eq!(assessor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_triggers_once_within_cooldown() {
        let assessor = assessor(false, true);
        let learner = Arc::new(RecordingLearner::default());
        let mut gate = CompletionGate::new()
            .with_assessor(assessor.clone())
            .with_learner(learner.clone());
        let done = state(20, 20, 0, 0);
        let start = Utc::now();

        let first = gate.check(&done, &[], &team(2), None, start).await;
        assert!(first.is_triggered());

        for hour in 1..24 {
            let decision = gate
                .check(&done, &[], &team(2), None, start + Duration::hours(hour))
                .await;
            assert!(matches!(decision, GateDecision::CoolingDown { .. }));
        }
        assert_eq!(assessor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(learner.outcomes.lock().unwrap().len(), 1);

        let after = gate
            .check(&done, &[], &team(2), None, start + Duration::hours(24))
            .await;
        assert!(after.is_triggered());
        assert_eq!(assessor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_outcome_passed_to_learner() {
        let learner = Arc::new(RecordingLearner::default());
        let mut gate = CompletionGate::new()
            .with_assessor(assessor(false, false))
            .with_learner(learner.clone())
            .with_daily_rate(500.0);
        let now = Utc::now();

        let decision = gate
            .check(&state(20, 20, 0, 0), &[], &team(2), Some(now - Duration::days(10)), now)
            .await;

        let GateDecision::Triggered(report) = decision else {
            panic!("expected trigger");
        };
        assert_eq!(report.duration_days, 10.0);
        assert_eq!(report.cost, 10_000.0);
        assert!(report.pattern.is_some());
        assert!(report.error.is_none());

        let outcomes = learner.outcomes.lock().unwrap();
        let outcome = &outcomes[0];
        assert!(!outcome.successful);
        assert_eq!(outcome.quality_score, 0.82);
        assert_eq!(outcome.cost, 10_000.0);
        assert_eq!(outcome.failure_reasons, vec!["test coverage".to_string()]);
    }

    #[tokio::test]
    async fn test_assessor_failure_is_swallowed_and_debounced() {
        let assessor = assessor(true, true);
        let learner = Arc::new(RecordingLearner::default());
        let mut gate = CompletionGate::new()
            .with_assessor(assessor.clone())
            .with_learner(learner.clone());
        let now = Utc::now();

        let decision = gate.check(&state(20, 20, 0, 0), &[], &[], None, now).await;
        let GateDecision::Triggered(report) = decision else {
            panic!("expected trigger");
        };
        assert!(report.error.unwrap().contains("assessor offline"));
        assert!(report.assessment.is_none());
        assert_eq!(report.cost, 90_000.0);
        assert!(learner.outcomes.lock().unwrap().is_empty());
        assert_eq!(gate.last_triggered(), Some(now));

        let retry = gate
            .check(&state(20, 20, 0, 0), &[], &[], None, now + Duration::minutes(15))
            .await;
        assert!(matches!(retry, GateDecision::CoolingDown { .. }));
        assert_eq!(assessor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gates_debounce_independently() {
        let done = state(20, 20, 0, 0);
        let now = Utc::now();
        let mut first = CompletionGate::new();
        let mut second = CompletionGate::new();

        assert!(first.check(&done, &[], &[], None, now).await.is_triggered());
        assert!(second.check(&done, &[], &[], None, now).await.is_triggered());
    }
}
