//! Per-thread "persistent mode" flag.
//!
//! The semantic-graph serializer sets this while it walks interned strings
//! that are about to be written to disk; `inc_ref`/`dec_ref` on
//! [`crate::Interner`] are no-ops everywhere else, since refcounts only
//! matter to decide whether a disk-persisted reference keeps a table entry
//! alive.

use std::cell::Cell;

thread_local! {
	static PERSISTENT: Cell<bool> = const { Cell::new(false) };
}

/// True if the calling thread is currently inside a [`enter`] scope.
pub fn is_active() -> bool {
	PERSISTENT.with(|flag| flag.get())
}

/// RAII scope that marks the calling thread as being in persistent mode.
///
/// Nested scopes are supported: the flag is restored to its previous value
/// on drop, not unconditionally cleared.
pub struct Scope {
	previous: bool,
}

/// Enter persistent mode for the current thread until the returned guard is
/// dropped.
pub fn enter() -> Scope {
	let previous = PERSISTENT.with(|flag| flag.replace(true));
	Scope { previous }
}

impl Drop for Scope {
	fn drop(&mut self) {
		PERSISTENT.with(|flag| flag.set(self.previous));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nested_scopes_restore_previous_value() {
		assert!(!is_active());
		{
			let _outer = enter();
			assert!(is_active());
			{
				let _inner = enter();
				assert!(is_active());
			}
			assert!(is_active());
		}
		assert!(!is_active());
	}
}
