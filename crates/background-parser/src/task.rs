//! Parse Task: an opaque unit of work manufactured per (URL, language) pair.

use std::sync::{Arc, Mutex};

use xeno_interner::InternedString;

use crate::notify::NotifyHandle;
use crate::priority::{FeatureFlags, SequencingFlags, TaskPriority};

/// A single progress update: a 0.0..=1.0 fraction plus an optional label
/// shown in the progress UI (e.g. "indexing std").
#[derive(Debug, Clone, Default)]
pub struct Progress {
	pub fraction: f32,
	pub message: Option<String>,
}

/// Shared cell a running [`ParseTask`] writes progress into and the
/// Scheduler reads from while aggregating, without either side needing a
/// reference to the other's concrete type.
#[derive(Clone, Default)]
pub struct ProgressHandle(Arc<Mutex<Progress>>);

impl ProgressHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, fraction: f32, message: Option<String>) {
		*self.0.lock().unwrap() = Progress { fraction: fraction.clamp(0.0, 1.0), message };
	}

	pub fn snapshot(&self) -> Progress {
		self.0.lock().unwrap().clone()
	}
}

/// Opaque unit of work manufactured by a
/// [`crate::collaborators::LanguageRegistry`] for one (URL, language) pair.
/// `run` is invoked exactly once, on a worker thread; it may touch the
/// DU-Lock but must not hold it across a call back into the Scheduler.
pub trait ParseTask: Send {
	fn url(&self) -> InternedString;
	fn set_priority(&mut self, priority: TaskPriority);
	fn set_features(&mut self, features: FeatureFlags);
	fn set_sequencing(&mut self, sequencing: SequencingFlags);
	fn set_notify_targets(&mut self, targets: Vec<NotifyHandle>);
	fn respects_sequencing(&self) -> bool;

	/// The handle this task reports progress through; implementors store
	/// one constructed alongside the task itself.
	fn progress_handle(&self) -> &ProgressHandle;

	fn report_progress(&self, fraction: f32, message: Option<String>) {
		self.progress_handle().set(fraction, message);
	}

	fn run(self: Box<Self>) -> Result<(), String>;
}
