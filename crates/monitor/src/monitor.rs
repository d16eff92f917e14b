//! Project monitor.
//!
//! Runs the monitoring cycle on a timer for one project and serves the
//! latest snapshot, risks, blockers, and history to concurrent callers.
//!
//! A cycle is: collect snapshot, health analysis, issue detection,
//! completion gate, history append. Failures inside a cycle are logged and
//! never end the loop.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vigil_ai::{HealthAnalysis, HealthAnalyzer};
use vigil_core::{
    AgentId, BlockerId, BlockerReport, HistoryEntry, ProjectRef, ProjectState, Risk, RiskLevel,
    TaskId, TeamMember, Time,
};
use vigil_progress::{DetectionThresholds, HistoryRecorder, IssueDetector, MetricsCalculator};
use vigil_quality::{
    CompletionCriteria, CompletionGate, CompletionReport, GateDecision, PatternLearner,
    QualityAssessor,
};
use vigil_storage::{DependencyResolver, TaskSnapshotProvider};

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};

/// Lifecycle state of the monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No loop is running
    Stopped,
    /// The loop is running
    Running,
}

impl MonitorState {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorState::Stopped => "stopped",
            MonitorState::Running => "running",
        }
    }
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of the most recent cycle.
#[derive(Default)]
struct Snapshot {
    state: Option<ProjectState>,
    risks: Vec<Risk>,
    analysis: Option<HealthAnalysis>,
    last_completion: Option<CompletionReport>,
}

/// Clears the running flag when the loop exits, even if its task is aborted.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Monitors a single project.
///
/// Each instance owns its own state, including the completion debounce, so
/// several projects can be monitored side by side without interfering.
pub struct ProjectMonitor {
    project: ProjectRef,
    config: MonitorConfig,
    provider: Arc<dyn TaskSnapshotProvider>,
    calculator: MetricsCalculator,
    detector: IssueDetector,
    gate: Mutex<CompletionGate>,
    analyzer: Option<Arc<dyn HealthAnalyzer>>,
    clock: Arc<dyn Clock>,
    team: RwLock<Vec<TeamMember>>,
    snapshot: RwLock<Snapshot>,
    blockers: RwLock<Vec<BlockerReport>>,
    history: RwLock<HistoryRecorder>,
    cycle_lock: Mutex<()>,
    running: AtomicBool,
    stop: watch::Sender<bool>,
    cycles: watch::Sender<u64>,
}

impl ProjectMonitor {
    /// Create a monitor. Fails if the configuration is invalid.
    pub fn new(
        project: ProjectRef,
        config: MonitorConfig,
        provider: Arc<dyn TaskSnapshotProvider>,
        dependencies: Arc<dyn DependencyResolver>,
    ) -> Result<Self> {
        config.validate()?;

        let detector = IssueDetector::new(dependencies).with_thresholds(DetectionThresholds {
            stall_threshold_hours: config.stall_threshold_hours,
            capacity_threshold: config.capacity_threshold,
        });
        let gate = CompletionGate::new()
            .with_criteria(CompletionCriteria {
                completion_threshold_percent: config.completion_threshold_percent,
            })
            .with_cooldown(chrono::Duration::hours(config.completion_cooldown_hours as i64))
            .with_daily_rate(config.daily_rate);
        let (stop, _) = watch::channel(false);
        let (cycles, _) = watch::channel(0);

        Ok(Self {
            calculator: MetricsCalculator::new(project.clone()),
            history: RwLock::new(HistoryRecorder::new(config.history_capacity)),
            project,
            config,
            provider,
            detector,
            gate: Mutex::new(gate),
            analyzer: None,
            clock: Arc::new(SystemClock),
            team: RwLock::new(Vec::new()),
            snapshot: RwLock::new(Snapshot::default()),
            blockers: RwLock::new(Vec::new()),
            cycle_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            stop,
            cycles,
        })
    }

    /// Create a monitor reading tasks and dependents from one store.
    pub fn with_store<S>(project: ProjectRef, config: MonitorConfig, store: Arc<S>) -> Result<Self>
    where
        S: TaskSnapshotProvider + DependencyResolver + 'static,
    {
        Self::new(project, config, store.clone(), store)
    }

    /// Set the qualitative health analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn HealthAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Set the quality assessor run on completion.
    pub fn with_quality_assessor(mut self, assessor: Arc<dyn QualityAssessor>) -> Self {
        self.gate = Mutex::new(self.gate.into_inner().with_assessor(assessor));
        self
    }

    /// Set the pattern learner run on completion.
    pub fn with_pattern_learner(mut self, learner: Arc<dyn PatternLearner>) -> Self {
        self.gate = Mutex::new(self.gate.into_inner().with_learner(learner));
        self
    }

    /// Set the project team.
    pub fn with_team(mut self, team: Vec<TeamMember>) -> Self {
        self.team = RwLock::new(team);
        self
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Monitored project.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// Active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Run the monitoring loop until [`stop`](Self::stop) is called.
    ///
    /// Returns immediately if the loop is already running.
    pub async fn start(&self) {
        if self.begin() {
            self.run_loop().await;
        }
    }

    /// Run the monitoring loop on a new tokio task.
    ///
    /// The monitor is `Running` as soon as this returns, so a following
    /// `stop()` is never lost.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let started = self.begin();
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            if started {
                monitor.run_loop().await;
            }
        })
    }

    /// Ask the loop to exit. The in-flight cycle, if any, completes first.
    ///
    /// Idempotent, and a no-op when the loop is not running.
    pub fn stop(&self) {
        if !self.stop.send_replace(true) {
            debug!(project = %self.project.project_name, "Stop requested");
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        if self.running.load(Ordering::SeqCst) {
            MonitorState::Running
        } else {
            MonitorState::Stopped
        }
    }

    /// Number of cycles the loop has run, failed ones included.
    pub fn cycles_run(&self) -> u64 {
        *self.cycles.borrow()
    }

    /// Subscribe to the cycle counter.
    pub fn cycle_updates(&self) -> watch::Receiver<u64> {
        self.cycles.subscribe()
    }

    fn begin(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(project = %self.project.project_name, "Monitor already running");
            return false;
        }
        self.stop.send_replace(false);
        true
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    async fn run_loop(&self) {
        let _running = RunningGuard(&self.running);
        let interval = chrono::Duration::seconds(self.config.check_interval_seconds as i64);
        let mut stop = self.stop.subscribe();

        info!(
            project = %self.project.project_name,
            board_id = %self.project.board_id,
            interval_seconds = self.config.check_interval_seconds,
            "Project monitor started"
        );

        while !self.stop_requested() {
            let deadline = self
                .clock
                .now()
                .checked_add_signed(interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);

            match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_transient() => {
                    warn!(project = %self.project.project_name, error = %e, "Monitoring cycle failed, retrying next interval");
                }
                Ok(Err(e)) => {
                    error!(project = %self.project.project_name, error = %e, "Monitoring cycle failed");
                }
                Err(_) => {
                    error!(project = %self.project.project_name, "Monitoring cycle panicked");
                }
            }
            self.cycles.send_modify(|n| *n += 1);

            if self.stop_requested() {
                break;
            }

            tokio::select! {
                _ = self.clock.sleep_until(deadline) => {}
                _ = stop.wait_for(|stop| *stop) => {}
            }
        }

        info!(project = %self.project.project_name, "Project monitor stopped");
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    /// Run one monitoring cycle.
    ///
    /// Only a task source failure is returned; it aborts the rest of the
    /// cycle and leaves the previous snapshot in place. Analyzer and
    /// completion failures are logged and the cycle carries on.
    ///
    /// Results are published together with the history entry once the
    /// cycle finishes, so readers see either the previous cycle or this one.
    pub async fn run_cycle(&self) -> Result<()> {
        let _cycle = self.cycle_lock.lock().await;
        let now = self.clock.now();
        debug!(project = %self.project.project_name, "Starting monitoring cycle");

        let tasks = self.provider.get_all_tasks().await?;
        let past = self.history.read().await.entries();
        let state = self.calculator.collect(&tasks, &past, now);
        let team = self.team.read().await.clone();

        let mut analysis = None;
        if let Some(analyzer) = &self.analyzer {
            let blockers = self.get_active_blockers().await;
            match analyzer.analyze(&state, &tasks, &team, &blockers).await {
                Ok(result) => {
                    debug!(health = ?result.overall_health, "Health analysis complete");
                    analysis = Some(result);
                }
                Err(e) => {
                    let e = MonitorError::DownstreamAnalysis(e);
                    warn!(project = %self.project.project_name, error = %e, "Health analysis failed");
                }
            }
        }

        let risks = self.detector.detect(&tasks, now).await;

        let history_start = self.history.read().await.earliest_timestamp();
        let (decision, last_triggered) = {
            let mut gate = self.gate.lock().await;
            let decision = gate.check(&state, &tasks, &team, history_start, now).await;
            (decision, gate.last_triggered())
        };
        let completion = match decision {
            GateDecision::Triggered(report) => Some(report),
            GateDecision::CoolingDown { until } => {
                debug!(%until, last_triggered = ?last_triggered, "Project complete, trigger cooling down");
                None
            }
            GateDecision::NotMet => None,
        };

        let mut history = self.history.write().await;
        let mut snapshot = self.snapshot.write().await;
        if history.record(HistoryEntry::from_state(&state, now)).is_some() {
            debug!(capacity = history.capacity(), "History full, evicted oldest entry");
        }
        if analysis.is_some() {
            snapshot.analysis = analysis;
        }
        if completion.is_some() {
            snapshot.last_completion = completion;
        }
        debug!(
            project = %self.project.project_name,
            progress = state.progress_percent,
            risk_level = %state.risk_level,
            risks = risks.len(),
            history = history.len(),
            "Monitoring cycle complete"
        );
        snapshot.risks = risks;
        snapshot.state = Some(state);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Latest snapshot, collected on demand if no cycle has run yet.
    ///
    /// An on-demand collection is cached but not added to history.
    pub async fn get_project_state(&self) -> Result<ProjectState> {
        if let Some(state) = &self.snapshot.read().await.state {
            return Ok(state.clone());
        }

        let tasks = self.provider.get_all_tasks().await?;
        let history = self.history.read().await.entries();
        let state = self.calculator.collect(&tasks, &history, self.clock.now());

        let mut snapshot = self.snapshot.write().await;
        // A cycle may have finished while we were collecting.
        Ok(snapshot.state.get_or_insert(state).clone())
    }

    /// Risks detected by the latest cycle.
    pub async fn get_current_risks(&self) -> Vec<Risk> {
        self.snapshot.read().await.risks.clone()
    }

    /// Latest health analysis, if an analyzer is set and has succeeded.
    pub async fn get_health_analysis(&self) -> Option<HealthAnalysis> {
        self.snapshot.read().await.analysis.clone()
    }

    /// Recorded history, oldest first.
    pub async fn get_history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.entries()
    }

    /// When completion handling last fired.
    pub async fn last_completion_trigger(&self) -> Option<Time> {
        self.snapshot
            .read()
            .await
            .last_completion
            .as_ref()
            .map(|report| report.triggered_at)
    }

    /// Report from the last completion trigger.
    pub async fn last_completion_report(&self) -> Option<CompletionReport> {
        self.snapshot.read().await.last_completion.clone()
    }

    // ========================================================================
    // Blockers
    // ========================================================================

    /// Unresolved blockers, in report order.
    pub async fn get_active_blockers(&self) -> Vec<BlockerReport> {
        self.blockers
            .read()
            .await
            .iter()
            .filter(|b| !b.resolved)
            .cloned()
            .collect()
    }

    /// Record a blocker with medium severity.
    pub async fn record_blocker(
        &self,
        agent_id: AgentId,
        task_id: TaskId,
        description: impl Into<String>,
    ) -> BlockerReport {
        self.record_blocker_with_severity(agent_id, task_id, description, RiskLevel::Medium)
            .await
    }

    /// Record a blocker.
    pub async fn record_blocker_with_severity(
        &self,
        agent_id: AgentId,
        task_id: TaskId,
        description: impl Into<String>,
        severity: RiskLevel,
    ) -> BlockerReport {
        let blocker = BlockerReport::new(task_id, agent_id, description, severity, self.clock.now());
        info!(
            project = %self.project.project_name,
            blocker_id = %blocker.id,
            task_id = %blocker.task_id,
            reporter = %blocker.reporter_id,
            severity = %blocker.severity,
            "Blocker reported"
        );
        self.blockers.write().await.push(blocker.clone());
        blocker
    }

    /// Mark a blocker resolved.
    ///
    /// Returns `None` if the blocker is unknown or already resolved.
    pub async fn resolve_blocker(&self, blocker_id: BlockerId) -> Option<BlockerReport> {
        let now = self.clock.now();
        let mut blockers = self.blockers.write().await;
        let blocker = blockers
            .iter_mut()
            .find(|b| b.id == blocker_id && !b.resolved)?;
        blocker.resolve(now);
        info!(
            project = %self.project.project_name,
            blocker_id = %blocker.id,
            task_id = %blocker.task_id,
            "Blocker resolved"
        );
        Some(blocker.clone())
    }
}
