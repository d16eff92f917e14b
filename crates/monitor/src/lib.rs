//! Project health monitoring loop.
//!
//! [`ProjectMonitor`] ties the task source, metrics, issue detection,
//! completion gate, and history together, and runs them on an interval.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vigil_core::ProjectRef;
//! use vigil_monitor::{MonitorConfig, ProjectMonitor};
//! use vigil_storage::InMemoryTaskStore;
//!
//! # async fn run() -> vigil_monitor::Result<()> {
//! let store = Arc::new(InMemoryTaskStore::new());
//! let monitor = Arc::new(ProjectMonitor::with_store(
//!     ProjectRef::new("board-1", "Apollo"),
//!     MonitorConfig::default(),
//!     store,
//! )?);
//!
//! let handle = monitor.spawn();
//! let state = monitor.get_project_state().await?;
//! println!("{}: {:.0}% done", state.project_name, state.progress_percent);
//!
//! monitor.stop();
//! let _ = handle.await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod monitor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MonitorConfig, DEFAULT_CHECK_INTERVAL_SECONDS};
pub use error::{MonitorError, Result};
pub use monitor::{MonitorState, ProjectMonitor};
