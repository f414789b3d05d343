//! `DuLock`: a reentrant, timed reader/writer lock protecting the shared
//! semantic graph.
//!
//! Unlike [`parking_lot::RwLock`] or `std::sync::RwLock`, the writer may
//! recursively take further read *or* write locks (the recursion counts
//! balance), which is required because analysis code that already holds the
//! write lock sometimes needs to call back into code that takes a read lock
//! on the same graph. A thread that holds only read locks must never try to
//! escalate to a write lock — that is a programmer error and is asserted in
//! debug builds, matching the contract this lock is modeled on.
//!
//! Fairness is not guaranteed: under steady read pressure a writer can be
//! starved indefinitely. Readers do yield their spin once a writer is
//! waiting, which bounds writer starvation in practice without requiring a
//! fair (and slower) queueing discipline.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Returned when a lock acquisition exceeds its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimeout;

/// `None` waits forever; `Some(d)` gives up after `d` has elapsed.
pub type Timeout = Option<Duration>;

fn current_thread_id() -> u64 {
	std::thread::current().id().as_u64().get()
}

/// Per-thread read-lock recursion depth for one [`DuLock`] instance.
///
/// A bare `thread_local!` can't be parameterized per lock instance, so each
/// `DuLock` instead owns a small fixed-size, lock-free association table
/// keyed by thread id, fast-pathing the common case of a handful of live
/// threads. `tokio::task::spawn_blocking`'s pool recycles and spins up new
/// blocking threads under load, so a long-running process can see far more
/// than 64 distinct thread ids touch one lock over its lifetime; threads
/// that lose the race for a fixed slot fall back to a `Mutex<HashMap<_,_>>`
/// rather than being silently untracked.
struct ThreadCounterTable {
	slots: [AtomicU64; 64],
	counts: [AtomicU32; 64],
	overflow: StdMutex<HashMap<u64, u32>>,
}

impl ThreadCounterTable {
	fn new() -> Self {
		Self {
			slots: std::array::from_fn(|_| AtomicU64::new(0)),
			counts: std::array::from_fn(|_| AtomicU32::new(0)),
			overflow: StdMutex::new(HashMap::new()),
		}
	}

	fn slot_for(&self, thread: u64) -> usize {
		(thread as usize) % self.slots.len()
	}

	/// Finds (or claims) the fixed-size slot for `thread`, linear-probing
	/// past collisions. Returns `None` once every slot is claimed by some
	/// other still-live thread id; callers fall back to `overflow`.
	fn find_slot(&self, thread: u64) -> Option<usize> {
		let start = self.slot_for(thread);
		for offset in 0..self.slots.len() {
			let idx = (start + offset) % self.slots.len();
			let existing = self.slots[idx].load(Ordering::Acquire);
			if existing == thread {
				return Some(idx);
			}
			if existing == 0 {
				match self.slots[idx].compare_exchange(0, thread, Ordering::AcqRel, Ordering::Acquire) {
					Ok(_) => return Some(idx),
					Err(now) if now == thread => return Some(idx),
					Err(_) => continue,
				}
			}
		}
		None
	}

	fn get(&self, thread: u64) -> u32 {
		match self.find_slot(thread) {
			Some(idx) => self.counts[idx].load(Ordering::Acquire),
			None => self.overflow.lock().unwrap().get(&thread).copied().unwrap_or(0),
		}
	}

	fn increment(&self, thread: u64) {
		match self.find_slot(thread) {
			Some(idx) => {
				self.counts[idx].fetch_add(1, Ordering::AcqRel);
			}
			None => {
				*self.overflow.lock().unwrap().entry(thread).or_insert(0) += 1;
			}
		}
	}

	fn decrement(&self, thread: u64) {
		match self.find_slot(thread) {
			Some(idx) => {
				self.counts[idx].fetch_sub(1, Ordering::AcqRel);
			}
			None => {
				let mut overflow = self.overflow.lock().unwrap();
				if let Some(count) = overflow.get_mut(&thread) {
					*count = count.saturating_sub(1);
					if *count == 0 {
						overflow.remove(&thread);
					}
				}
			}
		}
	}
}

/// Reentrant multi-reader / single-writer lock with millisecond timeouts.
pub struct DuLock {
	writer: AtomicU64,
	writer_recursion: AtomicU32,
	total_readers: AtomicU32,
	writer_waiting: AtomicBool,
	reader_depth: ThreadCounterTable,
}

impl Default for DuLock {
	fn default() -> Self {
		Self::new()
	}
}

impl DuLock {
	pub fn new() -> Self {
		Self {
			writer: AtomicU64::new(0),
			writer_recursion: AtomicU32::new(0),
			total_readers: AtomicU32::new(0),
			writer_waiting: AtomicBool::new(false),
			reader_depth: ThreadCounterTable::new(),
		}
	}

	pub fn current_thread_has_read_lock(&self) -> bool {
		self.reader_depth.get(current_thread_id()) > 0
	}

	pub fn current_thread_has_write_lock(&self) -> bool {
		self.writer.load(Ordering::Acquire) == current_thread_id()
	}

	/// Acquires a read lock, blocking (with spin/yield backoff) until
	/// acquired or `timeout` elapses.
	pub fn read_lock(&self, timeout: Timeout) -> Result<ReadGuard<'_>, LockTimeout> {
		let me = current_thread_id();
		let deadline = timeout.map(|d| Instant::now() + d);

		loop {
			// The current writer may always take a nested read lock.
			if self.writer.load(Ordering::Acquire) == me {
				self.total_readers.fetch_add(1, Ordering::AcqRel);
				self.reader_depth.increment(me);
				return Ok(ReadGuard { lock: self, thread: me, _not_send: PhantomData });
			}

			self.total_readers.fetch_add(1, Ordering::AcqRel);
			let writer = self.writer.load(Ordering::Acquire);
			if writer == 0 {
				self.reader_depth.increment(me);
				return Ok(ReadGuard { lock: self, thread: me, _not_send: PhantomData });
			}

			// Someone else holds (or is racing to take) the write lock: roll
			// back and wait.
			self.total_readers.fetch_sub(1, Ordering::AcqRel);

			if let Some(deadline) = deadline
				&& Instant::now() >= deadline
			{
				return Err(LockTimeout);
			}

			if self.writer_waiting.load(Ordering::Acquire) {
				std::thread::yield_now();
			} else {
				std::hint::spin_loop();
			}
		}
	}

	/// Acquires the write lock, blocking until acquired or `timeout`
	/// elapses.
	///
	/// # Panics
	///
	/// Panics (debug builds) if the calling thread currently holds a read
	/// lock without also holding the write lock — escalating read-to-write
	/// is a programmer error, not something this lock arbitrates.
	pub fn write_lock(&self, timeout: Timeout) -> Result<WriteGuard<'_>, LockTimeout> {
		let me = current_thread_id();
		let deadline = timeout.map(|d| Instant::now() + d);

		if self.writer.load(Ordering::Acquire) == me {
			self.writer_recursion.fetch_add(1, Ordering::AcqRel);
			return Ok(WriteGuard { lock: self, thread: me, _not_send: PhantomData });
		}

		debug_assert!(
			self.reader_depth.get(me) == 0,
			"thread already holding a read lock must not request the write lock"
		);

		self.writer_waiting.store(true, Ordering::Release);
		let result = loop {
			if self.total_readers.load(Ordering::Acquire) == 0
				&& self.writer.compare_exchange(0, me, Ordering::AcqRel, Ordering::Acquire).is_ok()
			{
				// Re-verify nobody snuck a read lock in between our reader
				// check and winning the CAS; if they did, roll back and
				// retry rather than proceeding unsafely.
				if self.total_readers.load(Ordering::Acquire) == 0 {
					self.writer_recursion.store(1, Ordering::Release);
					break Ok(());
				}
				self.writer.store(0, Ordering::Release);
			}

			if let Some(deadline) = deadline
				&& Instant::now() >= deadline
			{
				tracing::debug!(thread = me, "write_lock timed out waiting for readers to drain");
				break Err(LockTimeout);
			}
			std::thread::yield_now();
		};
		self.writer_waiting.store(false, Ordering::Release);

		result.map(|()| WriteGuard { lock: self, thread: me, _not_send: PhantomData })
	}
}

/// RAII read-lock guard. Non-`Clone`; releases on every exit path via
/// `Drop`, including early returns and panics. `PhantomData<*const ()>`
/// forbids the guard from crossing to another thread — the reader depth it
/// releases on drop is tracked per the acquiring thread's id, so dropping it
/// from elsewhere would decrement the wrong thread's count.
pub struct ReadGuard<'a> {
	lock: &'a DuLock,
	thread: u64,
	_not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
	fn drop(&mut self) {
		self.lock.total_readers.fetch_sub(1, Ordering::AcqRel);
		self.lock.reader_depth.decrement(self.thread);
	}
}

/// RAII write-lock guard. Non-`Clone`; releases on every exit path via
/// `Drop`. `PhantomData<*const ()>` forbids the guard from crossing to
/// another thread, for the same reason as [`ReadGuard`].
pub struct WriteGuard<'a> {
	lock: &'a DuLock,
	thread: u64,
	_not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
	fn drop(&mut self) {
		let remaining = self.lock.writer_recursion.fetch_sub(1, Ordering::AcqRel) - 1;
		if remaining == 0 {
			self.lock.writer.store(0, Ordering::Release);
		}
		let _ = self.thread;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use std::sync::atomic::AtomicUsize;

	#[test]
	fn multiple_readers_proceed_concurrently() {
		let lock = DuLock::new();
		let a = lock.read_lock(None).unwrap();
		let b = lock.read_lock(None).unwrap();
		drop(a);
		drop(b);
	}

	#[test]
	fn writer_excludes_readers() {
		let lock = Arc::new(DuLock::new());
		let _w = lock.write_lock(None).unwrap();
		assert!(lock.read_lock(Some(Duration::from_millis(10))).is_err());
	}

	#[test]
	fn writer_can_reenter_read_and_write() {
		let lock = DuLock::new();
		let w1 = lock.write_lock(None).unwrap();
		let w2 = lock.write_lock(None).unwrap();
		let r = lock.read_lock(None).unwrap();
		drop(r);
		drop(w2);
		assert!(lock.current_thread_has_write_lock());
		drop(w1);
		assert!(!lock.current_thread_has_write_lock());
	}

	#[test]
	#[should_panic]
	fn read_then_write_is_a_programmer_error() {
		let lock = DuLock::new();
		let _r = lock.read_lock(None).unwrap();
		let _ = lock.write_lock(Some(Duration::from_millis(1)));
	}

	#[test]
	fn exclusion_holds_across_threads() {
		let lock = Arc::new(DuLock::new());
		let violations = Arc::new(AtomicUsize::new(0));
		let in_critical = Arc::new(AtomicUsize::new(0));

		let mut handles = Vec::new();
		for _ in 0..8 {
			let lock = Arc::clone(&lock);
			let violations = Arc::clone(&violations);
			let in_critical = Arc::clone(&in_critical);
			handles.push(std::thread::spawn(move || {
				for _ in 0..200 {
					let _g = lock.write_lock(None).unwrap();
					let now = in_critical.fetch_add(1, Ordering::SeqCst) + 1;
					if now != 1 {
						violations.fetch_add(1, Ordering::SeqCst);
					}
					in_critical.fetch_sub(1, Ordering::SeqCst);
				}
			}));
		}
		for h in handles {
			h.join().unwrap();
		}
		assert_eq!(violations.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn timeout_returns_err_without_blocking_forever() {
		let lock = Arc::new(DuLock::new());
		let _w = lock.write_lock(None).unwrap();
		let start = Instant::now();
		let result = lock.write_lock(Some(Duration::from_millis(20)));
		assert!(result.is_err());
		assert!(start.elapsed() >= Duration::from_millis(20));
	}
}
