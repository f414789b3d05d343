//! Plans: the aggregated set of outstanding requests for one URL, and the
//! priority-ordered index used to find the next dispatch candidate.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use xeno_interner::InternedString;

use crate::notify::NotifyHandle;
use crate::priority::{FeatureFlags, SequencingFlags, TaskPriority};

/// `(priority, features, sequencing, notify)` — the url is implicit in
/// which [`Plan`] a request lives in.
///
/// Two requests compare equal iff they agree on priority, features, and the
/// notify target; a second request from the same notify target replaces the
/// first rather than accumulating as a duplicate.
#[derive(Clone)]
pub struct ParseRequest {
	pub priority: TaskPriority,
	pub features: FeatureFlags,
	pub sequencing: SequencingFlags,
	pub notify: NotifyHandle,
}

impl PartialEq for ParseRequest {
	fn eq(&self, other: &Self) -> bool {
		self.priority == other.priority && self.features == other.features && self.notify == other.notify
	}
}

/// Aggregated set of outstanding requests for a single URL.
#[derive(Default)]
pub struct Plan {
	requests: Vec<ParseRequest>,
}

impl Plan {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.requests.is_empty()
	}

	/// Adds `request`, replacing any existing request from the same notify
	/// target (a second request from one caller supersedes its first,
	/// rather than piling up).
	pub fn add_request(&mut self, request: ParseRequest) {
		if let Some(slot) = self.requests.iter_mut().find(|r| r.notify == request.notify) {
			*slot = request;
		} else {
			self.requests.push(request);
		}
	}

	/// Removes every request from `notify`. Returns `true` if the plan is
	/// now empty and should be dropped.
	pub fn remove_requests_from(&mut self, notify: &NotifyHandle) -> bool {
		self.requests.retain(|r| &r.notify != notify);
		self.requests.is_empty()
	}

	pub fn effective_priority(&self) -> TaskPriority {
		self.requests.iter().map(|r| r.priority).min().unwrap_or(TaskPriority::WORST)
	}

	pub fn effective_features(&self) -> FeatureFlags {
		self.requests.iter().fold(FeatureFlags::empty(), |acc, r| acc | r.features)
	}

	pub fn effective_sequencing(&self) -> SequencingFlags {
		self.requests.iter().fold(SequencingFlags::Ignores, |acc, r| acc.union(r.sequencing))
	}

	/// Live notify targets, in the order their requests were added.
	pub fn notify_list(&self) -> Vec<NotifyHandle> {
		self.requests.iter().map(|r| r.notify.clone()).filter(|n| n.upgrade().is_some()).collect()
	}

	pub fn requires_sequencing(&self) -> bool {
		self.effective_sequencing() == SequencingFlags::Requires
	}
}

/// Priority-sorted view of URLs whose plans have not yet been dispatched:
/// an ordered map from priority to the set of URLs currently at that
/// priority, kept in lock-step with the primary URL → [`Plan`] table.
#[derive(Default)]
pub struct PendingIndex {
	by_priority: BTreeMap<TaskPriority, IndexSet<InternedString>>,
}

impl PendingIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, priority: TaskPriority, url: InternedString) {
		self.by_priority.entry(priority).or_default().insert(url);
	}

	pub fn remove(&mut self, priority: TaskPriority, url: InternedString) {
		if let Some(bucket) = self.by_priority.get_mut(&priority) {
			bucket.shift_remove(&url);
			if bucket.is_empty() {
				self.by_priority.remove(&priority);
			}
		}
	}

	/// Moves `url` from `old` to `new` priority, no-op if they're equal.
	pub fn reinsert(&mut self, old: TaskPriority, new: TaskPriority, url: InternedString) {
		if old == new {
			return;
		}
		self.remove(old, url);
		self.insert(new, url);
	}

	/// Priority buckets in ascending (most-urgent-first) order.
	pub fn buckets_ascending(&self) -> impl Iterator<Item = (TaskPriority, &IndexSet<InternedString>)> {
		self.by_priority.iter().map(|(p, set)| (*p, set))
	}

	pub fn is_empty(&self) -> bool {
		self.by_priority.is_empty()
	}

	pub fn len(&self) -> usize {
		self.by_priority.values().map(|set| set.len()).sum()
	}
}
