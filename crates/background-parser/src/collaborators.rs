//! Traits for the systems the Scheduler is surrounded by but does not own:
//! the Language Plugin Registry, the Project Registry, the Progress Sink,
//! and the Document Source. Modeling these as traits keeps the core
//! testable without a real editor attached.

use std::sync::Arc;

use xeno_interner::InternedString;

use crate::task::{ParseTask, ProgressHandle};

/// Maps a URL to zero or more language handlers, each manufacturing a
/// concrete [`ParseTask`]. Zero tasks means no language volunteered for the
/// URL (see the no-handler fallback).
pub trait LanguageRegistry: Send + Sync {
	fn create_tasks(&self, url: InternedString, progress: ProgressHandle) -> Vec<Box<dyn ParseTask>>;
}

/// Gates scheduling while workspaces initialize.
pub trait ProjectRegistry: Send + Sync {
	fn any_workspace_loading(&self) -> bool;
}

/// A snapshot of overall progress: `done` is continuous (completed jobs
/// plus the fractional progress of whatever's still running), `max` is the
/// lifetime count of distinct URLs ever requested and not yet retired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
	pub done: f64,
	pub max: u64,
}

/// Receives throttled status updates from the Scheduler.
pub trait ProgressSink: Send + Sync {
	fn update(&self, snapshot: ProgressSnapshot);
}

/// The text a [`crate::tracker::ChangeTracker`] holds a weak reference to.
pub trait Document: Send + Sync {
	fn url(&self) -> InternedString;
}

/// Document lifecycle events delivered by a [`DocumentSource`].
pub trait DocumentEventListener: Send + Sync {
	fn on_open(&self, document: Arc<dyn Document>);
	fn on_close(&self, url: InternedString);
	fn on_url_change(&self, document: Arc<dyn Document>, old_url: InternedString);
}

/// Notifies on open/close/URL-change and yields document text. Implemented
/// by the editor; the Document Event Bridge subscribes to one.
pub trait DocumentSource: Send + Sync {
	fn subscribe(&self, listener: Arc<dyn DocumentEventListener>);
}

#[cfg(test)]
pub(crate) mod test_support {
	use super::*;
	use std::sync::Mutex;

	/// A [`LanguageRegistry`] that always yields zero tasks, for exercising
	/// the no-handler fallback.
	pub struct NoHandlerRegistry;
	impl LanguageRegistry for NoHandlerRegistry {
		fn create_tasks(&self, _url: InternedString, _progress: ProgressHandle) -> Vec<Box<dyn ParseTask>> {
			Vec::new()
		}
	}

	/// Never reports a workspace as loading.
	pub struct AlwaysReady;
	impl ProjectRegistry for AlwaysReady {
		fn any_workspace_loading(&self) -> bool {
			false
		}
	}

	/// Records every snapshot it receives, for assertions.
	#[derive(Default)]
	pub struct RecordingSink(pub Mutex<Vec<ProgressSnapshot>>);
	impl ProgressSink for RecordingSink {
		fn update(&self, snapshot: ProgressSnapshot) {
			self.0.lock().unwrap().push(snapshot);
		}
	}
}
