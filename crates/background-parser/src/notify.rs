//! Notify targets: weak-referenced consumers told once when their requested
//! analysis result is ready.
//!
//! Holding a *strong* reference here would keep a closed editor tab (or any
//! other consumer) alive just because it once asked for a reparse. Targets
//! are compared by pointer identity for request-equality and request
//! de-duplication; a notification attempt on a target that's already gone
//! is silently dropped.

use std::sync::{Arc, Weak};

use xeno_interner::InternedString;

/// Outcome handed to a notify target when its plan's task finishes.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
	/// A language handled the URL and produced a result.
	Completed,
	/// No language plugin volunteered for the URL; see spec §4.E.3.
	NoHandler,
	/// The task's `run()` failed.
	Failed(String),
}

/// A consumer that wants to be told when its analysis request for a URL
/// completes.
pub trait NotifyTarget: Send + Sync {
	fn notify(&self, url: InternedString, outcome: ParseOutcome);
}

/// A weak reference to a [`NotifyTarget`], compared by pointer identity.
#[derive(Clone)]
pub struct NotifyHandle {
	inner: Weak<dyn NotifyTarget>,
}

impl NotifyHandle {
	pub fn new(target: &Arc<dyn NotifyTarget>) -> Self {
		Self { inner: Arc::downgrade(target) }
	}

	/// Upgrades to a strong reference if the target is still alive.
	pub fn upgrade(&self) -> Option<Arc<dyn NotifyTarget>> {
		self.inner.upgrade()
	}

	/// Best-effort notify: silently dropped if the target has been
	/// reclaimed between request and completion.
	pub fn notify(&self, url: InternedString, outcome: ParseOutcome) {
		if let Some(target) = self.upgrade() {
			target.notify(url, outcome);
		}
	}
}

impl PartialEq for NotifyHandle {
	fn eq(&self, other: &Self) -> bool {
		Weak::ptr_eq(&self.inner, &other.inner)
	}
}

impl Eq for NotifyHandle {}
