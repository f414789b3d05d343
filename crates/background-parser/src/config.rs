//! Scheduler configuration: read once at startup, re-readable, with an
//! environment override that wins over stored configuration, which in turn
//! wins over these defaults.

use serde::{Deserialize, Serialize};

fn default_delay_ms() -> u64 {
	500
}

fn default_enabled() -> bool {
	true
}

fn default_thread_count() -> usize {
	std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// `{delay_ms, thread_count, enabled}`, serializable the way the rest of
/// this codebase's options are (plain `serde`/`serde_json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
	#[serde(default = "default_delay_ms")]
	pub delay_ms: u64,
	#[serde(default = "default_thread_count")]
	pub thread_count: usize,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self { delay_ms: default_delay_ms(), thread_count: default_thread_count(), enabled: default_enabled() }
	}
}

/// Name of the environment variable that overrides `thread_count`
/// regardless of stored configuration.
pub const MAX_THREADS_ENV: &str = "MAX_THREADS";

impl SchedulerConfig {
	/// Resolves the effective thread count: `MAX_THREADS` env var wins over
	/// `self.thread_count`, which wins over the platform default.
	pub fn effective_thread_count(&self) -> usize {
		std::env::var(MAX_THREADS_ENV)
			.ok()
			.and_then(|v| v.parse::<usize>().ok())
			.filter(|n| *n > 0)
			.unwrap_or_else(|| self.thread_count.max(1))
	}

	/// Worker pool capacity: `effective_thread_count() + 1`, the extra slot
	/// reserved for above-`NORMAL`-priority work.
	pub fn pool_capacity(&self) -> usize {
		self.effective_thread_count() + 1
	}
}
