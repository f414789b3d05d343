//! Process-wide content-addressed string interner.
//!
//! Mirrors `IndexedString` from the original analysis engine this crate is
//! derived from: a 32-bit [`InternedString`] handle that either encodes the
//! empty string, a single BMP code point, or an index into an append-only,
//! mutex-protected table of UTF-16 payloads.
//!
//! # Handle encoding
//!
//! - `0` is the empty string.
//! - `0xFFFF_0000 | cp` encodes a single code point `cp <= 0xFFFF` directly
//!   in the handle; no table entry is allocated.
//! - Any other value is `1 + index` into the table.
//!
//! Equality of handles is equivalence of the underlying text, and the handle
//! itself is directly usable as a hash key.

mod persistent;

pub use persistent::{Scope as PersistentModeScope, enter as enter_persistent_mode, is_active as persistent_mode_active};

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// High 16 bits set on every handle that encodes a code point inline.
const INLINE_TAG: u32 = 0xFFFF_0000;
/// Mask for the low 16 bits of an inline-encoded handle.
const INLINE_MASK: u32 = 0x0000_FFFF;

/// A 32-bit handle identifying an interned string for the life of the
/// process. Stable, `Copy`, hashable directly, and ordered by numeric index
/// (not by the text it denotes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternedString(u32);

impl InternedString {
	/// The handle of the empty string.
	pub const EMPTY: InternedString = InternedString(0);

	/// Raw numeric value of the handle, for callers that need a stable
	/// process-local key (e.g. as a map key) without caring about the text.
	pub fn as_u32(self) -> u32 {
		self.0
	}

	/// Reconstructs a handle from a raw value previously returned by
	/// [`InternedString::as_u32`] *within the same process*. Handles must
	/// never be persisted or sent across processes without remapping.
	pub fn from_u32(raw: u32) -> InternedString {
		InternedString(raw)
	}

	fn is_empty_handle(self) -> bool {
		self.0 == 0
	}

	fn is_inline(self) -> bool {
		self.0 != 0 && (self.0 & INLINE_TAG) == INLINE_TAG
	}

	fn inline_code_point(self) -> Option<char> {
		if self.is_inline() {
			char::from_u32(self.0 & INLINE_MASK)
		} else {
			None
		}
	}

	fn table_index(self) -> Option<usize> {
		if self.0 == 0 || self.is_inline() {
			None
		} else {
			Some((self.0 - 1) as usize)
		}
	}
}

impl fmt::Debug for InternedString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "InternedString({:#010x})", self.0)
	}
}

struct Entry {
	units: Box<[u16]>,
	/// Reference count honored only while a thread is in "persistent mode";
	/// see [`persistent`].
	refcount: AtomicU32,
}

struct Table {
	entries: Vec<Entry>,
	by_units: FxHashMap<Box<[u16]>, u32>,
}

impl Table {
	fn new() -> Self {
		Self { entries: Vec::new(), by_units: FxHashMap::default() }
	}
}

/// A process-wide string interner.
///
/// `intern` is expected O(1): a single lock guards a hash map from UTF-16
/// payload to handle plus the append-only backing table. Distinct texts
/// always yield distinct handles; identical texts always yield the same
/// handle, for the life of the process.
pub struct Interner {
	table: Mutex<Table>,
}

impl Default for Interner {
	fn default() -> Self {
		Self::new()
	}
}

impl Interner {
	pub fn new() -> Self {
		Self { table: Mutex::new(Table::new()) }
	}

	/// Interns `text`, returning its stable handle.
	pub fn intern(&self, text: &str) -> InternedString {
		if text.is_empty() {
			return InternedString::EMPTY;
		}

		let mut chars = text.chars();
		if let (Some(c), None) = (chars.next(), chars.next()) {
			return self.intern_char(c);
		}

		self.intern_units(&text.encode_utf16().collect::<Vec<u16>>())
	}

	/// Interns a single `char`. Code points that fit in 16 bits never
	/// allocate a table entry; code points above the BMP fall back to a
	/// full table entry (stored as a UTF-16 surrogate pair).
	pub fn intern_char(&self, c: char) -> InternedString {
		let cp = c as u32;
		if cp <= 0xFFFF {
			return InternedString(INLINE_TAG | cp);
		}
		let mut buf = [0u16; 2];
		self.intern_units(c.encode_utf16(&mut buf))
	}

	fn intern_units(&self, units: &[u16]) -> InternedString {
		let mut table = self.table.lock();
		if let Some(&handle) = table.by_units.get(units) {
			return InternedString(handle);
		}
		let boxed: Box<[u16]> = units.into();
		let index = table.entries.len() as u32;
		let handle = index + 1;
		debug_assert!(handle < INLINE_TAG, "interner table exhausted its handle space");
		table.entries.push(Entry { units: boxed.clone(), refcount: AtomicU32::new(0) });
		table.by_units.insert(boxed, handle);
		InternedString(handle)
	}

	/// Recovers the text denoted by `handle`.
	///
	/// # Panics
	///
	/// Panics if `handle` was never produced by this interner — bad handles
	/// are a programmer error, not a recoverable failure.
	pub fn lookup(&self, handle: InternedString) -> String {
		if handle.is_empty_handle() {
			return String::new();
		}
		if let Some(c) = handle.inline_code_point() {
			return c.to_string();
		}
		let index = handle.table_index().expect("inline handle already handled above");
		let table = self.table.lock();
		let entry = &table.entries[index];
		String::from_utf16(&entry.units).expect("interner table holds well-formed UTF-16")
	}

	/// Number of UTF-16 code units in the string denoted by `handle`.
	pub fn length(&self, handle: InternedString) -> usize {
		if handle.is_empty_handle() {
			return 0;
		}
		if handle.is_inline() {
			return 1;
		}
		let index = handle.table_index().expect("inline handle already handled above");
		self.table.lock().entries[index].units.len()
	}

	/// Increments the on-disk reference count for `handle`.
	///
	/// No-op for the empty handle, for inline single-char handles (neither
	/// ever allocates a table entry to keep alive), and for callers not
	/// currently inside [`enter_persistent_mode`].
	pub fn inc_ref(&self, handle: InternedString) {
		let Some(index) = handle.table_index() else { return };
		if !persistent_mode_active() {
			return;
		}
		self.table.lock().entries[index].refcount.fetch_add(1, Ordering::AcqRel);
	}

	/// Decrements the on-disk reference count for `handle`. Saturates at
	/// zero rather than underflowing; see [`Interner::inc_ref`] for the
	/// no-op conditions this mirrors.
	pub fn dec_ref(&self, handle: InternedString) {
		let Some(index) = handle.table_index() else { return };
		if !persistent_mode_active() {
			return;
		}
		let table = self.table.lock();
		let counter = &table.entries[index].refcount;
		let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)));
	}

	/// Current reference count for `handle`, or `0` for trivially-encoded
	/// handles. Exposed for tests and diagnostics.
	pub fn ref_count(&self, handle: InternedString) -> u32 {
		let Some(index) = handle.table_index() else { return 0 };
		self.table.lock().entries[index].refcount.load(Ordering::Acquire)
	}
}
