//! Monitor an in-memory board for a few cycles.
//!
//! Run with `RUST_LOG=debug cargo run -p vigil-monitor --example in_memory_monitor`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use vigil_ai::RuleBasedHealthAnalyzer;
use vigil_core::{AgentId, ProjectRef, Task, TaskId, TaskStatus, TeamMember};
use vigil_monitor::{MonitorConfig, ProjectMonitor};
use vigil_storage::InMemoryTaskStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let now = Utc::now();
    let store = Arc::new(InMemoryTaskStore::with_tasks(vec![
        Task::new("design", "Design schema", TaskStatus::Done, now - chrono::Duration::days(2)),
        Task::new("api", "Build API", TaskStatus::Blocked, now - chrono::Duration::hours(6)),
        Task::new("ui", "Build UI", TaskStatus::Todo, now)
            .with_dependencies([TaskId::new("api")]),
        Task::new("docs", "Write docs", TaskStatus::Todo, now)
            .with_dependencies([TaskId::new("api")]),
        Task::new("sdk", "Ship SDK", TaskStatus::Todo, now)
            .with_dependencies([TaskId::new("api")]),
        Task::new("infra", "Provision infra", TaskStatus::InProgress, now - chrono::Duration::hours(30)),
    ]));

    let config = MonitorConfig {
        check_interval_seconds: 1,
        ..Default::default()
    };
    let monitor = Arc::new(
        ProjectMonitor::with_store(ProjectRef::new("board-1", "Apollo"), config, store.clone())?
            .with_analyzer(Arc::new(RuleBasedHealthAnalyzer::new()))
            .with_team(vec![TeamMember::new(AgentId::new("ada"), "Ada", "engineer")]),
    );

    let handle = monitor.spawn();
    println!(
        "monitoring {} every {}s",
        monitor.project().project_name,
        monitor.config().check_interval_seconds
    );
    monitor
        .record_blocker(AgentId::new("ada"), TaskId::new("api"), "Waiting on vendor credentials")
        .await;

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let state = monitor.get_project_state().await?;
    println!(
        "{}: {:.1}% complete, velocity {:.1}/week, risk {} ({:.2})",
        state.project_name, state.progress_percent, state.velocity, state.risk_level, state.risk_score
    );
    for risk in monitor.get_current_risks().await {
        println!("  [{}] {} -> {}", risk.severity, risk.description, risk.mitigation);
    }
    if let Some(analysis) = monitor.get_health_analysis().await {
        println!("health: {:?} - {}", analysis.overall_health, analysis.summary);
    }
    println!("active blockers: {}", monitor.get_active_blockers().await.len());

    monitor.stop();
    handle.await?;
    Ok(())
}
