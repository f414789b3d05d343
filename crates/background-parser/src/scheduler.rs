//! Scheduler Core: request aggregation, priority ordering, dependency
//! waiting, worker dispatch, progress aggregation. See spec §4.E.
//!
//! The scheduler mutex (`Inner`, behind `self.inner`) is innermost: it is
//! never held across a call to the Language Registry, because that call may
//! touch the semantic graph and acquire the DU-Lock, which is outermost.
//! Every dispatch candidate is chosen, then released-and-revalidated before
//! being moved into `ActiveJobs` — see [`Scheduler::dispatch`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant as TokioInstant;
use xeno_interner::{Interner, InternedString};

use crate::collaborators::{LanguageRegistry, ProgressSink, ProgressSnapshot, ProjectRegistry};
use crate::config::SchedulerConfig;
use crate::error::{InvalidRequest, SchedulerError};
use crate::notify::{NotifyHandle, NotifyTarget, ParseOutcome};
use crate::plan::{ParseRequest, Plan, PendingIndex};
use crate::priority::{FeatureFlags, SequencingFlags, TaskPriority};
use crate::task::{ParseTask, ProgressHandle};
use crate::url_contract;
use xeno_worker::{WorkerError, WorkerPool};

struct ActiveJob {
	priority: TaskPriority,
	sequencing: SequencingFlags,
	progress: ProgressHandle,
	notify: Vec<NotifyHandle>,
}

struct Inner {
	plans: HashMap<InternedString, Plan>,
	pending: PendingIndex,
	active: HashMap<InternedString, ActiveJob>,
	max_jobs: u64,
	done_jobs: u64,
	needed_priority: TaskPriority,
	suspended: bool,
	shutdown: bool,
	last_progress_emit: Option<Instant>,
}

impl Inner {
	fn new() -> Self {
		Self {
			plans: HashMap::new(),
			pending: PendingIndex::new(),
			active: HashMap::new(),
			max_jobs: 0,
			done_jobs: 0,
			needed_priority: TaskPriority::WORST,
			suspended: false,
			shutdown: false,
			last_progress_emit: None,
		}
	}
}

/// The background parse scheduler. Owns the Pending Index, ActiveJobs, and
/// progress counters; delegates URL→task synthesis, workspace readiness,
/// and progress display to injected collaborators.
pub struct Scheduler {
	config: Mutex<SchedulerConfig>,
	interner: Arc<Interner>,
	languages: Arc<dyn LanguageRegistry>,
	projects: Arc<dyn ProjectRegistry>,
	progress_sink: Arc<dyn ProgressSink>,
	pool: WorkerPool,
	inner: Mutex<Inner>,
	timer_deadline: Mutex<Option<TokioInstant>>,
	timer_notify: Notify,
}

impl Scheduler {
	pub fn new(
		config: SchedulerConfig,
		interner: Arc<Interner>,
		languages: Arc<dyn LanguageRegistry>,
		projects: Arc<dyn ProjectRegistry>,
		progress_sink: Arc<dyn ProgressSink>,
	) -> Arc<Self> {
		let pool = WorkerPool::new(config.pool_capacity());
		let scheduler = Arc::new(Self {
			config: Mutex::new(config),
			interner,
			languages,
			projects,
			progress_sink,
			pool,
			inner: Mutex::new(Inner::new()),
			timer_deadline: Mutex::new(None),
			timer_notify: Notify::new(),
		});
		Self::spawn_timer_task(&scheduler);
		scheduler
	}

	fn spawn_timer_task(scheduler: &Arc<Scheduler>) {
		let weak = Arc::downgrade(scheduler);
		tokio::spawn(async move {
			loop {
				let Some(scheduler) = weak.upgrade() else { return };
				let deadline = *scheduler.timer_deadline.lock();
				match deadline {
					None => scheduler.timer_notify.notified().await,
					Some(deadline) => {
						tokio::select! {
							biased;
							() = scheduler.timer_notify.notified() => {}
							_ = tokio::time::sleep_until(deadline) => {
								let mut current = scheduler.timer_deadline.lock();
								if *current == Some(deadline) {
									*current = None;
								}
								drop(current);
								let scheduler = Arc::clone(&scheduler);
								scheduler.dispatch().await;
							}
						}
					}
				}
			}
		});
	}

	fn schedule_timer(&self, delay_ms: u64) {
		let deadline = TokioInstant::now() + Duration::from_millis(delay_ms);
		let mut current = self.timer_deadline.lock();
		let sooner = current.is_none_or(|existing| deadline < existing);
		if sooner {
			*current = Some(deadline);
		}
		drop(current);
		self.timer_notify.notify_one();
	}

	fn intern_url(&self, raw: &str) -> Result<InternedString, InvalidRequest> {
		let parsed = url_contract::validate(raw)?;
		Ok(self.interner.intern(parsed.as_str()))
	}

	// ---- 4.E.1 Request aggregation ----------------------------------------

	/// Adds (or merges into an existing plan) a request that `url` be
	/// reparsed. `notify` is held weakly; see [`crate::notify`].
	pub fn add_document(
		self: &Arc<Self>,
		url: &str,
		priority: TaskPriority,
		features: FeatureFlags,
		sequencing: SequencingFlags,
		notify: &Arc<dyn NotifyTarget>,
		delay_ms: u64,
	) -> Result<(), SchedulerError> {
		let handle = self.intern_url(url)?;
		let request = ParseRequest { priority, features, sequencing, notify: NotifyHandle::new(notify) };

		{
			let mut inner = self.inner.lock();
			if inner.shutdown {
				return Ok(());
			}
			match inner.plans.get_mut(&handle) {
				Some(plan) => {
					let old_priority = plan.effective_priority();
					plan.add_request(request);
					let new_priority = plan.effective_priority();
					inner.pending.reinsert(old_priority, new_priority, handle);
				}
				None => {
					let mut plan = Plan::new();
					plan.add_request(request);
					let priority = plan.effective_priority();
					inner.plans.insert(handle, plan);
					inner.pending.insert(priority, handle);
					inner.max_jobs += 1;
				}
			}
		}

		tracing::debug!(url, delay_ms, "add_document: plan updated, scheduling dispatch timer");
		self.schedule_timer(delay_ms);
		Ok(())
	}

	/// Withdraws `notify`'s request for `url`. If the plan empties, it is
	/// dropped and the outstanding-jobs counter decremented.
	pub fn remove_document(self: &Arc<Self>, url: &str, notify: &Arc<dyn NotifyTarget>) -> Result<(), SchedulerError> {
		let handle = self.intern_url(url)?;
		let notify = NotifyHandle::new(notify);
		let mut inner = self.inner.lock();
		if inner.shutdown {
			return Ok(());
		}
		if let Some(plan) = inner.plans.get_mut(&handle) {
			let priority = plan.effective_priority();
			if plan.remove_requests_from(&notify) {
				inner.plans.remove(&handle);
				inner.pending.remove(priority, handle);
				inner.max_jobs = inner.max_jobs.saturating_sub(1);
			}
		}
		Ok(())
	}

	/// Removes every outstanding request from `notify`, across every plan.
	pub fn revert_all_requests(&self, notify: &Arc<dyn NotifyTarget>) {
		let notify = NotifyHandle::new(notify);
		let mut inner = self.inner.lock();
		let emptied: Vec<(InternedString, TaskPriority)> = inner
			.plans
			.iter_mut()
			.filter_map(|(url, plan)| {
				let priority = plan.effective_priority();
				plan.remove_requests_from(&notify).then_some((*url, priority))
			})
			.collect();
		for (url, priority) in emptied {
			inner.plans.remove(&url);
			inner.pending.remove(priority, url);
			inner.max_jobs = inner.max_jobs.saturating_sub(1);
		}
	}

	// ---- §6 queries ---------------------------------------------------

	pub fn is_queued(&self, url: &str) -> bool {
		let Ok(handle) = self.intern_url(url) else { return false };
		self.inner.lock().plans.contains_key(&handle)
	}

	pub fn queued_count(&self) -> usize {
		self.inner.lock().pending.len()
	}

	pub fn priority_of(&self, url: &str) -> Option<TaskPriority> {
		let handle = self.intern_url(url).ok()?;
		self.inner.lock().plans.get(&handle).map(Plan::effective_priority)
	}

	pub fn is_idle(&self) -> bool {
		self.inner.lock().active.is_empty()
	}

	pub fn managed_documents(&self) -> Vec<InternedString> {
		let inner = self.inner.lock();
		let mut urls: Vec<InternedString> = inner.plans.keys().copied().collect();
		urls.extend(inner.active.keys().copied());
		urls.sort_unstable();
		urls.dedup();
		urls
	}

	// ---- 4.E.6 configuration -------------------------------------------

	pub fn set_thread_count(self: &Arc<Self>, n: i64) -> Result<(), SchedulerError> {
		if n <= 0 {
			return Err(SchedulerError::InvalidRequest(InvalidRequest::NonPositiveThreadCount(n)));
		}
		let capacity = {
			let mut config = self.config.lock();
			config.thread_count = n as usize;
			config.pool_capacity()
		};
		self.pool.set_capacity(capacity);
		self.kick_dispatch();
		Ok(())
	}

	pub fn set_delay(&self, delay_ms: u64) {
		self.config.lock().delay_ms = delay_ms;
	}

	pub fn set_needed_priority(self: &Arc<Self>, priority: TaskPriority) {
		self.inner.lock().needed_priority = priority;
		self.kick_dispatch();
	}

	/// Raises the needed-priority threshold to [`TaskPriority::BEST`],
	/// freezing dispatch of everything but the most urgent work.
	pub fn disable_processing(self: &Arc<Self>) {
		self.set_needed_priority(TaskPriority::BEST);
	}

	/// Lowers the needed-priority threshold to [`TaskPriority::WORST`],
	/// admitting every priority again.
	pub fn enable_processing(self: &Arc<Self>) {
		self.set_needed_priority(TaskPriority::WORST);
	}

	// ---- 4.E.5 suspend / resume -----------------------------------------

	pub fn suspend(&self) {
		self.inner.lock().suspended = true;
	}

	pub fn resume(self: &Arc<Self>) {
		self.inner.lock().suspended = false;
		self.kick_dispatch();
	}

	/// Requests (does not force) cancellation of every queued and running
	/// task.
	pub fn abort_all_jobs(&self) {
		self.pool.abort_all();
	}

	/// Cooperative shutdown: every entry point becomes a silent no-op.
	pub fn shutdown(&self) {
		self.inner.lock().shutdown = true;
	}

	/// Polls until `ActiveJobs` is empty, yielding between checks. Intended
	/// for test harnesses, not production control flow.
	pub async fn wait_for_idle(&self) {
		loop {
			if self.inner.lock().active.is_empty() {
				return;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	}

	fn kick_dispatch(self: &Arc<Self>) {
		let scheduler = Arc::clone(self);
		tokio::spawn(async move { scheduler.dispatch().await });
	}

	// ---- 4.E.2 dispatch ---------------------------------------------------

	async fn dispatch(self: Arc<Self>) {
		if self.projects.any_workspace_loading() {
			let delay = self.config.lock().delay_ms;
			tracing::debug!("dispatch: a workspace is still loading, rescheduling");
			self.schedule_timer(delay);
			return;
		}

		let (thread_count, enabled) = {
			let config = self.config.lock();
			(config.thread_count.max(1), config.enabled)
		};

		let candidate = {
			let mut inner = self.inner.lock();
			if inner.shutdown || inner.suspended || !enabled {
				return;
			}

			let running_best_priority = inner
				.active
				.values()
				.filter(|job| job.sequencing != SequencingFlags::Ignores)
				.map(|job| job.priority)
				.min()
				.unwrap_or(TaskPriority::WORST);
			let needed = inner.needed_priority;
			let running_jobs = inner.active.len();
			let reserved_slot_taken = inner.active.values().any(|job| job.priority.is_above_normal());

			let mut found = None;
			'buckets: for (priority, urls) in inner.pending.buckets_ascending() {
				if priority > needed {
					break;
				}
				if running_jobs >= thread_count + 1 {
					break;
				}
				if running_jobs >= thread_count && priority > TaskPriority::NORMAL && reserved_slot_taken {
					break;
				}
				for &url in urls.iter() {
					if inner.active.contains_key(&url) {
						continue;
					}
					let Some(plan) = inner.plans.get(&url) else { continue };
					if plan.requires_sequencing() && priority > running_best_priority {
						continue;
					}
					found = Some(url);
					break 'buckets;
				}
			}
			found
		};

		let Some(url) = candidate else { return };

		// Release the scheduler mutex before calling into the Language
		// Registry: task synthesis may touch the semantic graph and acquire
		// the DU-Lock, which must never nest inside this mutex.
		let progress = ProgressHandle::new();
		let mut tasks = self.languages.create_tasks(url, progress.clone());

		let mut inner = self.inner.lock();
		let Some(plan) = inner.plans.remove(&url) else {
			// Known quirk, preserved from the original: if the URL's plan
			// vanished while we were unlocked, the partially-built task set
			// is discarded without notifying anyone.
			tracing::warn!(?url, "dispatch: plan vanished during unlocked task creation, discarding");
			drop(inner);
			self.kick_dispatch();
			return;
		};
		let priority = plan.effective_priority();
		let sequencing = plan.effective_sequencing();
		let notify = plan.notify_list();
		inner.pending.remove(priority, url);

		if tasks.is_empty() {
			inner.done_jobs += 1;
			self.maybe_emit_progress(&mut inner);
			drop(inner);
			tracing::debug!(?url, "dispatch: no language volunteered, firing no-handler fallback");
			for target in &notify {
				target.notify(url, ParseOutcome::NoHandler);
			}
			self.kick_dispatch();
			return;
		}

		inner.active.insert(
			url,
			ActiveJob { priority, sequencing, progress: progress.clone(), notify: notify.clone() },
		);
		drop(inner);

		for task in tasks.iter_mut() {
			task.set_priority(priority);
			task.set_sequencing(sequencing);
			task.set_notify_targets(notify.clone());
		}

		let handle = self.pool.enqueue_blocking(move || {
			let mut outcome = Ok(());
			for task in tasks {
				if let Err(message) = task.run() {
					outcome = Err(message);
					break;
				}
			}
			outcome
		});

		let scheduler = Arc::clone(&self);
		tokio::spawn(async move {
			let outcome = handle.join().await;
			scheduler.on_task_finished(url, outcome).await;
		});

		self.kick_dispatch();
	}

	async fn on_task_finished(self: Arc<Self>, url: InternedString, outcome: Result<Result<(), String>, WorkerError>) {
		let notify = {
			let mut inner = self.inner.lock();
			let Some(job) = inner.active.remove(&url) else { return };
			inner.done_jobs += 1;
			self.maybe_emit_progress(&mut inner);
			job.notify
		};

		let parse_outcome = match outcome {
			Ok(Ok(())) => ParseOutcome::Completed,
			Ok(Err(message)) => ParseOutcome::Failed(message),
			Err(WorkerError::Aborted) => ParseOutcome::Failed("aborted".to_string()),
			Err(WorkerError::Panicked) => ParseOutcome::Failed("panicked".to_string()),
		};
		for target in &notify {
			target.notify(url, parse_outcome.clone());
		}
		self.kick_dispatch();
	}

	// ---- 4.E.4 progress aggregation ---------------------------------------

	fn maybe_emit_progress(&self, inner: &mut Inner) {
		if inner.max_jobs > 0 && inner.done_jobs >= inner.max_jobs {
			inner.done_jobs = 0;
			inner.max_jobs = 0;
			inner.last_progress_emit = Some(Instant::now());
			self.progress_sink.update(ProgressSnapshot { done: 0.0, max: 0 });
			return;
		}

		let now = Instant::now();
		let throttled =
			inner.last_progress_emit.is_some_and(|last| now.duration_since(last) < Duration::from_millis(500));
		if throttled {
			return;
		}

		let fractional: f64 = inner.active.values().map(|job| job.progress.snapshot().fraction as f64).sum();
		inner.last_progress_emit = Some(now);
		self.progress_sink.update(ProgressSnapshot { done: inner.done_jobs as f64 + fractional, max: inner.max_jobs });
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::collaborators::test_support::{AlwaysReady, NoHandlerRegistry, RecordingSink};
	use crate::config::SchedulerConfig;
	use std::sync::Mutex as StdMutex;

	struct Recorder(StdMutex<Vec<(InternedString, String)>>);
	impl NotifyTarget for Recorder {
		fn notify(&self, url: InternedString, outcome: ParseOutcome) {
			let label = match outcome {
				ParseOutcome::Completed => "completed".to_string(),
				ParseOutcome::NoHandler => "no-handler".to_string(),
				ParseOutcome::Failed(e) => format!("failed: {e}"),
			};
			self.0.lock().unwrap().push((url, label));
		}
	}

	fn test_scheduler() -> Arc<Scheduler> {
		Scheduler::new(
			SchedulerConfig { delay_ms: 5, thread_count: 2, enabled: true },
			Arc::new(Interner::new()),
			Arc::new(NoHandlerRegistry),
			Arc::new(AlwaysReady),
			Arc::new(RecordingSink::default()),
		)
	}

	#[tokio::test]
	async fn add_document_then_remove_clears_the_queue() {
		let scheduler = test_scheduler();
		let notify: Arc<dyn NotifyTarget> = Arc::new(Recorder(StdMutex::new(Vec::new())));
		scheduler
			.add_document("file:///a.rs", TaskPriority::NORMAL, FeatureFlags::SYNTAX_ONLY, SequencingFlags::Ignores, &notify, 0)
			.unwrap();
		assert!(scheduler.is_queued("file:///a.rs"));
		scheduler.remove_document("file:///a.rs", &notify).unwrap();
		assert!(!scheduler.is_queued("file:///a.rs"));
		assert_eq!(scheduler.queued_count(), 0);
	}

	#[tokio::test]
	async fn invalid_url_is_rejected_without_state_change() {
		let scheduler = test_scheduler();
		let notify: Arc<dyn NotifyTarget> = Arc::new(Recorder(StdMutex::new(Vec::new())));
		let result =
			scheduler.add_document("not-a-url", TaskPriority::NORMAL, FeatureFlags::empty(), SequencingFlags::Ignores, &notify, 0);
		assert!(result.is_err());
		assert_eq!(scheduler.queued_count(), 0);
	}

	#[tokio::test]
	async fn no_handler_fallback_notifies_exactly_once() {
		let scheduler = test_scheduler();
		let recorder = Arc::new(Recorder(StdMutex::new(Vec::new())));
		let notify: Arc<dyn NotifyTarget> = recorder.clone();
		scheduler
			.add_document("file:///b.rs", TaskPriority::NORMAL, FeatureFlags::empty(), SequencingFlags::Ignores, &notify, 0)
			.unwrap();
		scheduler.wait_for_idle().await;
		tokio::time::sleep(Duration::from_millis(50)).await;
		let received = recorder.0.lock().unwrap();
		assert_eq!(received.len(), 1);
		assert_eq!(received[0].1, "no-handler");
		assert_eq!(scheduler.queued_count(), 0);
	}

	#[tokio::test]
	async fn set_thread_count_rejects_non_positive() {
		let scheduler = test_scheduler();
		assert!(scheduler.set_thread_count(0).is_err());
		assert!(scheduler.set_thread_count(-3).is_err());
		assert!(scheduler.set_thread_count(4).is_ok());
	}

	#[tokio::test]
	async fn disable_processing_freezes_normal_priority_dispatch() {
		let scheduler = test_scheduler();
		scheduler.disable_processing();
		let notify: Arc<dyn NotifyTarget> = Arc::new(Recorder(StdMutex::new(Vec::new())));
		scheduler
			.add_document("file:///c.rs", TaskPriority::NORMAL, FeatureFlags::empty(), SequencingFlags::Ignores, &notify, 0)
			.unwrap();
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(scheduler.is_queued("file:///c.rs"));
	}

	struct DelayedTask {
		url: InternedString,
		priority: TaskPriority,
		sequencing: SequencingFlags,
		progress: ProgressHandle,
		sleep_ms: u64,
		started: Arc<StdMutex<Vec<InternedString>>>,
	}

	impl ParseTask for DelayedTask {
		fn url(&self) -> InternedString {
			self.url
		}
		fn set_priority(&mut self, priority: TaskPriority) {
			self.priority = priority;
		}
		fn set_features(&mut self, _features: FeatureFlags) {}
		fn set_sequencing(&mut self, sequencing: SequencingFlags) {
			self.sequencing = sequencing;
		}
		fn set_notify_targets(&mut self, _targets: Vec<NotifyHandle>) {}
		fn respects_sequencing(&self) -> bool {
			self.sequencing != SequencingFlags::Ignores
		}
		fn progress_handle(&self) -> &ProgressHandle {
			&self.progress
		}
		fn run(self: Box<Self>) -> Result<(), String> {
			self.started.lock().unwrap().push(self.url);
			std::thread::sleep(Duration::from_millis(self.sleep_ms));
			Ok(())
		}
	}

	/// A [`LanguageRegistry`] whose tasks take `sleep_ms` to run, so tests can
	/// observe `ActiveJobs` while a job is actually in flight (unlike
	/// [`NoHandlerRegistry`], which never populates `ActiveJobs` at all).
	struct DelayedRegistry {
		sleep_ms: u64,
		started: Arc<StdMutex<Vec<InternedString>>>,
	}

	impl LanguageRegistry for DelayedRegistry {
		fn create_tasks(&self, url: InternedString, progress: ProgressHandle) -> Vec<Box<dyn ParseTask>> {
			vec![Box::new(DelayedTask {
				url,
				priority: TaskPriority::NORMAL,
				sequencing: SequencingFlags::Ignores,
				progress,
				sleep_ms: self.sleep_ms,
				started: self.started.clone(),
			})]
		}
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn shutdown_blocks_new_jobs_from_entering_active_jobs() {
		let started = Arc::new(StdMutex::new(Vec::new()));
		let registry = Arc::new(DelayedRegistry { sleep_ms: 80, started: started.clone() });
		let scheduler = Scheduler::new(
			SchedulerConfig { delay_ms: 5, thread_count: 2, enabled: true },
			Arc::new(Interner::new()),
			registry,
			Arc::new(AlwaysReady),
			Arc::new(RecordingSink::default()),
		);
		let notify: Arc<dyn NotifyTarget> = Arc::new(Recorder(StdMutex::new(Vec::new())));

		scheduler
			.add_document(
				"file:///shutdown-a.rs",
				TaskPriority::NORMAL,
				FeatureFlags::empty(),
				SequencingFlags::Ignores,
				&notify,
				0,
			)
			.unwrap();
		// Give the coalescing timer a chance to move the job into ActiveJobs
		// before we shut down.
		tokio::time::sleep(Duration::from_millis(40)).await;
		assert!(!scheduler.inner.lock().active.is_empty(), "job should already be running before shutdown");

		scheduler.shutdown();

		// Requests arriving after shutdown must never reach ActiveJobs, even
		// once the in-flight job above finishes and frees its slot.
		scheduler
			.add_document(
				"file:///shutdown-b.rs",
				TaskPriority::NORMAL,
				FeatureFlags::empty(),
				SequencingFlags::Ignores,
				&notify,
				0,
			)
			.unwrap();
		assert!(!scheduler.is_queued("file:///shutdown-b.rs"), "shutdown must reject new requests outright");

		scheduler.wait_for_idle().await;
		tokio::time::sleep(Duration::from_millis(150)).await;

		assert!(scheduler.inner.lock().active.is_empty());
		assert_eq!(scheduler.queued_count(), 0);
		assert_eq!(*started.lock().unwrap(), vec![scheduler_url(&scheduler, "file:///shutdown-a.rs")]);
	}

	fn scheduler_url(scheduler: &Arc<Scheduler>, url: &str) -> InternedString {
		scheduler.intern_url(url).unwrap()
	}

	proptest::proptest! {
		#[test]
		fn max_jobs_never_falls_below_done_jobs(ops in proptest::collection::vec(0..4usize, 1..20)) {
			// `Scheduler::new` and `add_document` both spawn tasks onto the
			// ambient tokio runtime; `rt.enter()` supplies that context
			// without driving the reactor, so this test body stays fully
			// synchronous and `prop_assert!`'s macro-generated `return`s work
			// as proptest expects. `dispatch()` is driven explicitly via
			// `rt.block_on` whenever the randomized sequence picks it.
			let rt = tokio::runtime::Runtime::new().unwrap();
			let _guard = rt.enter();
			let scheduler = test_scheduler();
			let notify: Arc<dyn NotifyTarget> = Arc::new(Recorder(StdMutex::new(Vec::new())));
			let urls = ["file:///prop-x.rs", "file:///prop-y.rs", "file:///prop-z.rs"];

			for (i, op) in ops.iter().enumerate() {
				let url = urls[i % urls.len()];
				match op {
					0 => {
						let _ = scheduler.add_document(
							url,
							TaskPriority::NORMAL,
							FeatureFlags::empty(),
							SequencingFlags::Ignores,
							&notify,
							0,
						);
					}
					1 => {
						let _ = scheduler.remove_document(url, &notify);
					}
					2 => scheduler.revert_all_requests(&notify),
					_ => rt.block_on(Arc::clone(&scheduler).dispatch()),
				}

				let inner = scheduler.inner.lock();
				proptest::prop_assert!(inner.max_jobs >= inner.done_jobs);
			}
		}
	}
}
