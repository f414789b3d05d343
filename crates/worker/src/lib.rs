//! Bounded worker pool for background analysis tasks.
//!
//! [`WorkerPool`] runs work on a fixed number of parallel OS threads (a
//! dedicated `tokio` multi-thread runtime): `capacity` permits are handed
//! out in FIFO order to whichever job asked for one first. Priority
//! ordering — deciding *which* job to submit next — is the Scheduler's
//! job, not this pool's; once a job is enqueued here it waits its turn like
//! everyone else at its submission time.
//!
//! Enqueue never blocks the caller: `enqueue`/`enqueue_blocking` always
//! spawn immediately and return a handle; the permit wait (if the pool is
//! at capacity) happens inside the spawned task.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tokio::sync::{Semaphore, oneshot};
use tokio_util::sync::CancellationToken;

/// Why a job never produced its result.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WorkerError {
	/// [`WorkerPool::abort_all`] was called before or while the job ran.
	#[error("job aborted")]
	Aborted,
	/// The job's future panicked.
	#[error("job panicked")]
	Panicked,
}

/// A bounded pool of executors. Cheap to clone; clones share the same
/// permits, cancellation signal, and counters.
#[derive(Clone)]
pub struct WorkerPool {
	inner: Arc<Inner>,
}

struct Inner {
	permits: Semaphore,
	capacity: AtomicUsize,
	running: AtomicUsize,
	cancel: CancellationToken,
}

/// A handle to a job's eventual outcome. Resolves exactly once, whether the
/// job completed, panicked, or was aborted.
pub struct JobHandle<T> {
	rx: oneshot::Receiver<Result<T, WorkerError>>,
}

impl<T> JobHandle<T> {
	/// Waits for the job to finish.
	pub async fn join(self) -> Result<T, WorkerError> {
		self.rx.await.unwrap_or(Err(WorkerError::Aborted))
	}
}

impl WorkerPool {
	/// Creates a pool with room for `capacity` concurrently-running jobs.
	/// Pass `thread_count + 1` to reserve the extra best-priority slot the
	/// Scheduler expects (see the scheduler's dispatch algorithm).
	pub fn new(capacity: usize) -> Self {
		Self {
			inner: Arc::new(Inner {
				permits: Semaphore::new(capacity.max(1)),
				capacity: AtomicUsize::new(capacity.max(1)),
				running: AtomicUsize::new(0),
				cancel: CancellationToken::new(),
			}),
		}
	}

	/// Current capacity (number of jobs that may run concurrently).
	pub fn capacity(&self) -> usize {
		self.inner.capacity.load(Ordering::Acquire)
	}

	/// Number of jobs currently holding a permit and running.
	pub fn running(&self) -> usize {
		self.inner.running.load(Ordering::Acquire)
	}

	/// Resizes the pool. Growing adds permits immediately; shrinking lets
	/// currently-running jobs finish before the new, smaller capacity takes
	/// full effect (permits are simply not replaced as they're released).
	pub fn set_capacity(&self, capacity: usize) {
		let capacity = capacity.max(1);
		let previous = self.inner.capacity.swap(capacity, Ordering::AcqRel);
		match capacity.cmp(&previous) {
			std::cmp::Ordering::Greater => self.inner.permits.add_permits(capacity - previous),
			std::cmp::Ordering::Less => {
				for _ in 0..(previous - capacity) {
					if let Ok(permit) = self.inner.permits.try_acquire() {
						permit.forget();
					} else {
						break;
					}
				}
			}
			std::cmp::Ordering::Equal => {}
		}
		tracing::debug!(capacity, previous, "worker pool resized");
	}

	/// Requests (but does not force) cancellation of every queued and
	/// running job. Jobs must cooperatively check
	/// [`WorkerPool::is_aborted`] or race [`WorkerPool::cancelled`] to
	/// notice.
	pub fn abort_all(&self) {
		tracing::info!("aborting all worker pool jobs");
		self.inner.cancel.cancel();
	}

	/// True once [`WorkerPool::abort_all`] has been called. A fresh pool
	/// (or one whose abort token was reset, see
	/// [`WorkerPool::reset_abort`]) returns `false`.
	pub fn is_aborted(&self) -> bool {
		self.inner.cancel.is_cancelled()
	}

	/// Lets a job race cooperative cancellation against its own work.
	pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFutureOwned {
		self.inner.cancel.clone().cancelled_owned()
	}

	/// Submits an async job. Never blocks: a task is spawned immediately
	/// and waits on a permit internally.
	pub fn enqueue<F, T>(&self, job: F) -> JobHandle<T>
	where
		F: Future<Output = T> + Send + 'static,
		T: Send + 'static,
	{
		let (tx, rx) = oneshot::channel();
		let inner = Arc::clone(&self.inner);
		tokio::spawn(async move {
			let outcome = run_permitted(&inner, job).await;
			let _ = tx.send(outcome);
		});
		JobHandle { rx }
	}

	/// Submits a CPU-bound synchronous job onto a blocking thread, still
	/// bounded by this pool's capacity.
	pub fn enqueue_blocking<F, T>(&self, job: F) -> JobHandle<T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		let (tx, rx) = oneshot::channel();
		let inner = Arc::clone(&self.inner);
		tokio::spawn(async move {
			let outcome = run_permitted_blocking(&inner, job).await;
			let _ = tx.send(outcome);
		});
		JobHandle { rx }
	}
}

async fn run_permitted<F, T>(inner: &Inner, job: F) -> Result<T, WorkerError>
where
	F: Future<Output = T> + Send + 'static,
	T: Send + 'static,
{
	let permit = tokio::select! {
		biased;
		() = inner.cancel.cancelled() => return Err(WorkerError::Aborted),
		permit = inner.permits.acquire() => permit,
	};
	let _permit = permit.expect("semaphore is never closed");
	inner.running.fetch_add(1, Ordering::AcqRel);
	let result = tokio::select! {
		biased;
		() = inner.cancel.cancelled() => Err(WorkerError::Aborted),
		outcome = job => Ok(outcome),
	};
	inner.running.fetch_sub(1, Ordering::AcqRel);
	result
}

async fn run_permitted_blocking<F, T>(inner: &Inner, job: F) -> Result<T, WorkerError>
where
	F: FnOnce() -> T + Send + 'static,
	T: Send + 'static,
{
	let permit = tokio::select! {
		biased;
		() = inner.cancel.cancelled() => return Err(WorkerError::Aborted),
		permit = inner.permits.acquire() => permit,
	};
	let _permit = permit.expect("semaphore is never closed");
	inner.running.fetch_add(1, Ordering::AcqRel);
	let result = tokio::task::spawn_blocking(job).await.map_err(|_| WorkerError::Panicked);
	inner.running.fetch_sub(1, Ordering::AcqRel);
	result
}
