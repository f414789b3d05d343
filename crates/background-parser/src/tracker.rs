//! Change Tracker: one per open document, holding a weak reference to the
//! backing text and relaying invalidation through the document's URL
//! handle. Born at document-load, destroyed at document-close or
//! URL-change; not transferable between documents.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use xeno_interner::InternedString;

use crate::collaborators::Document;

pub struct ChangeTracker {
	url: InternedString,
	document: Weak<dyn Document>,
	identity: usize,
}

impl ChangeTracker {
	fn new(url: InternedString, document: &Arc<dyn Document>) -> Self {
		Self { url, document: Arc::downgrade(document), identity: identity_of(document) }
	}

	pub fn url(&self) -> InternedString {
		self.url
	}

	/// The backing text, or `None` if the document is gone.
	pub fn document(&self) -> Option<Arc<dyn Document>> {
		self.document.upgrade()
	}
}

fn identity_of(document: &Arc<dyn Document>) -> usize {
	Arc::as_ptr(document) as *const () as usize
}

#[derive(Default)]
struct Inner {
	by_url: HashMap<InternedString, ChangeTracker>,
	by_identity: HashMap<usize, InternedString>,
}

/// Table of [`ChangeTracker`]s, indexed both by URL handle (what the
/// Scheduler needs) and by document identity (what URL-rename handling
/// needs). Guarded by its own mutex, distinct from the scheduler mutex, so
/// the Event Bridge can answer `tracker_for` without contending with
/// dispatch.
#[derive(Default)]
pub struct TrackerTable {
	inner: Mutex<Inner>,
}

impl TrackerTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a tracker for `document` at `url`, replacing any existing
	/// tracker already registered for that URL.
	pub fn insert(&self, url: InternedString, document: &Arc<dyn Document>) {
		let mut inner = self.inner.lock();
		inner.by_identity.insert(identity_of(document), url);
		inner.by_url.insert(url, ChangeTracker::new(url, document));
	}

	/// Removes and returns the tracker for `url`, if any. The identity index
	/// is purged using the identity recorded at tracker construction, not by
	/// re-upgrading the (possibly already-dead) weak document reference —
	/// `on_close` only carries a URL, so by the time it fires the source may
	/// already have dropped its `Arc<dyn Document>`.
	pub fn remove(&self, url: InternedString) -> Option<ChangeTracker> {
		let mut inner = self.inner.lock();
		let removed = inner.by_url.remove(&url);
		if let Some(tracker) = &removed {
			inner.by_identity.remove(&tracker.identity);
		}
		removed
	}

	pub fn contains(&self, url: InternedString) -> bool {
		self.inner.lock().by_url.contains_key(&url)
	}

	/// The URL a given document is currently tracked under, if it has a
	/// live tracker at all — used to detect a rename of an already-tracked
	/// document.
	pub fn url_for_identity(&self, document: &Arc<dyn Document>) -> Option<InternedString> {
		self.inner.lock().by_identity.get(&identity_of(document)).copied()
	}
}
