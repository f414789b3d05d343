//! Document Event Bridge: observes the Document Source and translates
//! document lifecycle events into Change Tracker creation/removal. See spec
//! §4.G.

use std::sync::Arc;

use xeno_interner::InternedString;

use crate::collaborators::{Document, DocumentEventListener, DocumentSource};
use crate::tracker::TrackerTable;

/// Subscribes to a [`DocumentSource`] and keeps a [`TrackerTable`] in sync
/// with document open/close/URL-change events.
pub struct EventBridge {
	trackers: Arc<TrackerTable>,
}

impl EventBridge {
	/// Builds a bridge over `trackers` and subscribes it to `source`.
	pub fn attach(source: &dyn DocumentSource, trackers: Arc<TrackerTable>) -> Arc<Self> {
		let bridge = Arc::new(Self { trackers });
		source.subscribe(bridge.clone());
		bridge
	}
}

impl DocumentEventListener for EventBridge {
	fn on_open(&self, document: Arc<dyn Document>) {
		let url = document.url();
		if self.trackers.contains(url) {
			tracing::debug!(?url, "on_open: tracker already exists, ignoring");
			return;
		}
		tracing::debug!(?url, "on_open: creating change tracker");
		self.trackers.insert(url, &document);
	}

	fn on_close(&self, url: InternedString) {
		tracing::debug!(?url, "on_close: destroying change tracker");
		self.trackers.remove(url);
	}

	fn on_url_change(&self, document: Arc<dyn Document>, old_url: InternedString) {
		tracing::debug!(?old_url, new_url = ?document.url(), "on_url_change: synthesizing close-then-open");
		self.on_close(old_url);
		// Suppress the synthetic open if the new URL is already tracked
		// (e.g. another document already occupies it).
		self.on_open(document);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	struct Doc(Mutex<InternedString>);
	impl Document for Doc {
		fn url(&self) -> InternedString {
			*self.0.lock().unwrap()
		}
	}

	struct NullSource;
	impl DocumentSource for NullSource {
		fn subscribe(&self, _listener: Arc<dyn DocumentEventListener>) {}
	}

	#[test]
	fn open_then_close_round_trips_through_the_tracker_table() {
		let trackers = Arc::new(TrackerTable::new());
		let bridge = EventBridge::attach(&NullSource, trackers.clone());
		let url = InternedString::from_u32(3);
		let doc: Arc<dyn Document> = Arc::new(Doc(Mutex::new(url)));

		bridge.on_open(doc.clone());
		assert!(trackers.contains(url));

		bridge.on_close(url);
		assert!(!trackers.contains(url));
	}

	#[test]
	fn reopening_an_already_tracked_url_is_a_noop() {
		let trackers = Arc::new(TrackerTable::new());
		let bridge = EventBridge::attach(&NullSource, trackers.clone());
		let url = InternedString::from_u32(5);
		let first: Arc<dyn Document> = Arc::new(Doc(Mutex::new(url)));
		let second: Arc<dyn Document> = Arc::new(Doc(Mutex::new(url)));

		bridge.on_open(first.clone());
		bridge.on_open(second.clone());

		assert_eq!(trackers.url_for_identity(&first), Some(url));
		assert_eq!(trackers.url_for_identity(&second), None);
	}

	#[test]
	fn url_change_migrates_the_tracker_to_the_new_url() {
		let trackers = Arc::new(TrackerTable::new());
		let bridge = EventBridge::attach(&NullSource, trackers.clone());
		let old_url = InternedString::from_u32(11);
		let new_url = InternedString::from_u32(12);
		let concrete = Arc::new(Doc(Mutex::new(old_url)));
		let doc: Arc<dyn Document> = concrete.clone();

		bridge.on_open(doc.clone());
		*concrete.0.lock().unwrap() = new_url;
		bridge.on_url_change(doc, old_url);

		assert!(!trackers.contains(old_url));
		assert!(trackers.contains(new_url));
	}
}
