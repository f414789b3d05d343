//! Priority, feature, and sequencing values attached to a parse request.

use bitflags::bitflags;

/// Lower numeric value is more urgent. `WORST` means "do not schedule"; a
/// needed-priority threshold of `BEST` disables dispatch entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskPriority(pub i32);

impl TaskPriority {
	/// Most urgent priority; always eligible and always gets the reserved
	/// worker-pool slot.
	pub const BEST: TaskPriority = TaskPriority(i32::MIN);
	/// Default priority for ordinary reparse requests.
	pub const NORMAL: TaskPriority = TaskPriority(0);
	/// "Do not schedule": raising the needed-priority threshold to `BEST`
	/// and setting a request's priority to `WORST` both use this sentinel,
	/// for different purposes (see [`crate::Scheduler::disable_processing`]).
	pub const WORST: TaskPriority = TaskPriority(i32::MAX);

	pub fn is_above_normal(self) -> bool {
		self < TaskPriority::NORMAL
	}
}

impl Default for TaskPriority {
	fn default() -> Self {
		TaskPriority::NORMAL
	}
}

bitflags! {
	/// Bit-set of analysis features a caller is asking for (e.g. "just
	/// highlighting" vs "full semantic analysis"). Newer requests combine
	/// with bitwise OR.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct FeatureFlags: u32 {
		const SYNTAX_ONLY = 1 << 0;
		const SEMANTIC = 1 << 1;
		const FORCE_UPDATE = 1 << 2;
	}
}

/// A task's self-declared cooperation with priority-based dependency
/// ordering. Ordered so that "union" (used when a document has multiple
/// outstanding requests) is simply `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SequencingFlags {
	/// Runs whenever a worker slot is free, regardless of what else is
	/// in flight.
	#[default]
	Ignores,
	/// Prefers to run after better-priority work, but isn't blocked on it.
	Respects,
	/// Must not start until every in-flight task of strictly better
	/// priority has finished.
	Requires,
}

impl SequencingFlags {
	pub fn union(self, other: SequencingFlags) -> SequencingFlags {
		self.max(other)
	}
}
