//! Error kinds surfaced synchronously to callers.
//!
//! Background failures (a task's `run()` failing, a language plugin
//! declining a URL) are never returned from an entry point — they go out
//! through the notify-target listeners instead (see [`crate::notify`]).
//! Only requests rejected at entry produce an [`InvalidRequest`].

use thiserror::Error;

/// Rejected at entry; no scheduler state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
	#[error("url must be absolute and non-empty: {0:?}")]
	NotAbsolute(String),
	#[error("url path is not normalized (contains `.` or `..` segments): {0:?}")]
	NotNormalized(String),
	#[error("thread_count must be positive, got {0}")]
	NonPositiveThreadCount(i64),
}

/// Top-level error type for fallible `Scheduler` entry points. `ShuttingDown`
/// and `NoHandler` from spec's error-kinds list are deliberately absent: the
/// former is a silent no-op and the latter is delivered through notify
/// targets, never returned to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
	#[error(transparent)]
	InvalidRequest(#[from] InvalidRequest),
}
