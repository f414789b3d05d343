//! Priority- and dependency-aware background parse scheduler.
//!
//! This crate is the Scheduler Core, Parse Task, Change Tracker, and
//! Document Event Bridge components of the Language-Analysis Background
//! Engine: it owns request aggregation, priority-ordered dispatch onto a
//! bounded [`xeno_worker::WorkerPool`], progress aggregation, and the
//! document-lifecycle plumbing that feeds it. The String Interner
//! (`xeno-interner`) and the DU-Chain Lock (`xeno-du-lock`) it depends on
//! live in sibling crates.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod event_bridge;
pub mod notify;
pub mod plan;
pub mod priority;
mod scheduler;
pub mod task;
pub mod tracker;
pub mod url_contract;

pub use collaborators::{Document, DocumentEventListener, DocumentSource, LanguageRegistry, ProgressSink, ProgressSnapshot, ProjectRegistry};
pub use config::{MAX_THREADS_ENV, SchedulerConfig};
pub use error::{InvalidRequest, SchedulerError};
pub use event_bridge::EventBridge;
pub use notify::{NotifyHandle, NotifyTarget, ParseOutcome};
pub use plan::{ParseRequest, Plan, PendingIndex};
pub use priority::{FeatureFlags, SequencingFlags, TaskPriority};
pub use scheduler::Scheduler;
pub use task::{ParseTask, Progress, ProgressHandle};
pub use tracker::{ChangeTracker, TrackerTable};

use std::sync::{Arc, OnceLock};

static GLOBAL_SCHEDULER: OnceLock<Arc<Scheduler>> = OnceLock::new();

/// Installs `scheduler` as the process-wide default, for callers that want
/// the "lazy static singleton" convenience instead of threading an
/// `Arc<Scheduler>` through their own state. Returns the scheduler back if
/// one was already installed.
pub fn install_global_scheduler(scheduler: Arc<Scheduler>) -> Result<(), Arc<Scheduler>> {
	GLOBAL_SCHEDULER.set(scheduler)
}

/// The process-wide default scheduler.
///
/// # Panics
///
/// Panics if [`install_global_scheduler`] was never called; there is no
/// implicit default because a `Scheduler` always needs real collaborators
/// (a `LanguageRegistry`, a `ProjectRegistry`, a `ProgressSink`).
pub fn global_scheduler() -> Arc<Scheduler> {
	GLOBAL_SCHEDULER.get().expect("install_global_scheduler was never called").clone()
}
