//! Worker pool implementation

use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
use crate::pool::config::{ThreadPoolConfig, MIN_WORKERS};
use crate::pool::worker::{join_handle, Worker, WorkerStatSnapshot};
use crate::queue::JobQueue;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Point-in-time view of a pool
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// When the snapshot was taken
    pub captured_at: DateTime<Utc>,
    /// Number of registered workers
    pub worker_count: usize,
    /// Registered workers whose thread has not exited
    pub live_workers: usize,
    /// Jobs waiting in the queue (advisory)
    pub pending_jobs: usize,
    /// Jobs accepted by the pool since it was built
    pub total_jobs_submitted: u64,
    /// Per-worker state, in registration order
    pub workers: Vec<WorkerStatSnapshot>,
}

impl PoolStats {
    /// Jobs completed successfully by the registered workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_processed).sum()
    }

    /// Jobs that returned an error on the registered workers
    pub fn total_jobs_failed(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_failed).sum()
    }

    /// Jobs that panicked on the registered workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.workers.iter().map(|w| w.jobs_panicked).sum()
    }
}

/// A bounded, resizable pool of worker threads sharing one FIFO job queue
///
/// # Capacity
///
/// The number of registered workers always lies in
/// `[MIN_WORKERS, max_workers]` (`[1, 10]` by default). It is the size of the
/// worker registry itself, so it cannot drift from the set of workers.
///
/// # Shutdown
///
/// [`shutdown`](Self::shutdown) is cooperative: each worker finishes the job
/// it is running and then exits; idle workers are woken and exit at once.
/// Pending jobs stay in the queue and are never run. [`join`](Self::join)
/// waits for the threads to exit.
///
/// # Example
///
/// ```rust
/// use bounded_worker_pool::prelude::*;
///
/// # fn main() -> Result<()> {
/// let pool = ThreadPool::with_workers(2)?;
/// pool.execute(|| {
///     println!("hello from a worker");
///     Ok(())
/// });
///
/// pool.add_workers(3)?;
/// assert_eq!(pool.worker_count(), 5);
///
/// pool.shutdown();
/// pool.join()?;
/// # Ok(())
/// # }
/// ```
pub struct ThreadPool {
    config: ThreadPoolConfig,
    queue: Arc<JobQueue>,
    workers: Mutex<BTreeMap<usize, Worker>>,
    retired: Mutex<Vec<Worker>>,
    next_worker_id: AtomicUsize,
    shut_down: AtomicBool,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("worker_count", &self.worker_count())
            .field("pending_jobs", &self.job_size())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool with [`DEFAULT_WORKERS`](crate::pool::DEFAULT_WORKERS) workers
    pub fn new() -> Result<Self> {
        Self::with_config(ThreadPoolConfig::default())
    }

    /// Create a pool with `num_workers` workers, clamped to `[1, 10]`
    pub fn with_workers(num_workers: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_workers))
    }

    /// Create a pool with custom configuration
    ///
    /// Workers are started immediately.
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        config.validate()?;

        let pool = Self {
            config,
            queue: Arc::new(JobQueue::new()),
            workers: Mutex::new(BTreeMap::new()),
            retired: Mutex::new(Vec::new()),
            next_worker_id: AtomicUsize::new(1),
            shut_down: AtomicBool::new(false),
            total_jobs_submitted: AtomicU64::new(0),
        };

        let initial = pool.config.initial_workers();
        {
            let mut workers = pool.workers.lock();
            for _ in 0..initial {
                pool.spawn_worker(&mut workers)?;
            }
        }

        log::info!(
            "{}: started {} workers (requested {}, max {})",
            pool.config.thread_name_prefix,
            initial,
            pool.config.num_workers,
            pool.config.max_workers
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(initial, pool.config.max_workers);

        Ok(pool)
    }

    /// Spawn one worker and register it under the next id
    fn spawn_worker(&self, workers: &mut BTreeMap<usize, Worker>) -> Result<()> {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let worker = Worker::spawn(
            id,
            format!("{}-{}", self.config.thread_name_prefix, id),
            Arc::clone(&self.queue),
            self.config.error_sink(),
            self.config.join_timeout,
        )?;
        workers.insert(id, worker);
        Ok(())
    }

    /// Submit a job to the pool
    ///
    /// Never blocks beyond a short lock hold and never rejects: the queue is
    /// unbounded, and jobs submitted after [`shutdown`](Self::shutdown) are
    /// queued but never run.
    pub fn submit<J: Job + 'static>(&self, job: J) {
        self.submit_boxed(Box::new(job));
    }

    /// Submit a job that runs under the caller's current tracing span
    ///
    /// The time the job waits in the queue is recorded when it starts.
    #[cfg(feature = "tracing")]
    pub fn submit_traced<J: Job + 'static>(&self, job: J) {
        self.submit(crate::tracing::TracedJob::new(job));
    }

    /// Submit an already boxed job
    pub fn submit_boxed(&self, job: BoxedJob) {
        self.queue.enqueue(job);
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.queue.len());
    }

    /// Submit a job that may be absent
    ///
    /// `None` is ignored without error. Returns whether a job was queued.
    pub fn submit_optional<J: Job + 'static>(&self, job: Option<J>) -> bool {
        match job {
            Some(job) => {
                self.submit(job);
                true
            }
            None => {
                log::debug!(
                    "{}: ignoring empty job submission",
                    self.config.thread_name_prefix
                );
                false
            }
        }
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.submit(ClosureJob::new(f));
    }

    /// Add up to `n` workers
    ///
    /// The request is silently reduced so the pool never exceeds
    /// `max_workers`. Returns the number of workers actually added.
    ///
    /// # Errors
    ///
    /// - `ThreadError::ShutDown` - the pool has been shut down
    /// - `ThreadError::SpawnError` - a thread could not be created; workers
    ///   spawned before the failure stay registered
    pub fn add_workers(&self, n: usize) -> Result<usize> {
        let mut workers = self.workers.lock();
        if self.is_shut_down() {
            return Err(ThreadError::ShutDown);
        }
        self.reap_retired(&mut self.retired.lock());

        let available = self.config.max_workers.saturating_sub(workers.len());
        let to_add = n.min(available);
        if to_add < n {
            log::debug!(
                "{}: add_workers({}) clamped to {} (max {})",
                self.config.thread_name_prefix,
                n,
                to_add,
                self.config.max_workers
            );
        }

        for _ in 0..to_add {
            self.spawn_worker(&mut workers)?;
        }
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_workers_added(to_add, workers.len());

        log::debug!(
            "{}: added {} workers, now {}",
            self.config.thread_name_prefix,
            to_add,
            workers.len()
        );
        Ok(to_add)
    }

    /// Stop and unregister the `n` earliest registered workers
    ///
    /// Selection follows registration order only: a worker that is in the
    /// middle of a job may be chosen, and it finishes that job before exiting.
    ///
    /// # Errors
    ///
    /// `ThreadError::InvalidArgument` if `n` is not smaller than the current
    /// worker count. Nothing is changed in that case.
    pub fn remove_workers(&self, n: usize) -> Result<()> {
        let mut workers = self.workers.lock();
        let count = workers.len();
        if n >= count {
            return Err(ThreadError::invalid_argument("remove_workers", n, count));
        }
        if n == 0 {
            return Ok(());
        }

        // n < count, so the cutoff key always exists.
        let kept = match workers.keys().nth(n).copied() {
            Some(cutoff) => workers.split_off(&cutoff),
            None => BTreeMap::new(),
        };
        let removed = std::mem::replace(&mut *workers, kept);
        debug_assert!(workers.len() >= MIN_WORKERS);

        for worker in removed.values() {
            worker.shutdown();
        }
        log::debug!(
            "{}: removed workers {:?}, now {}",
            self.config.thread_name_prefix,
            removed.keys().collect::<Vec<_>>(),
            workers.len()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_workers_removed(removed.len(), workers.len());

        let mut retired = self.retired.lock();
        self.reap_retired(&mut retired);
        retired.extend(removed.into_values());
        Ok(())
    }

    /// Join and drop retired workers whose thread has already exited
    fn reap_retired(&self, retired: &mut Vec<Worker>) {
        let before = retired.len();
        retired.retain_mut(|worker| {
            if !worker.is_finished() {
                return true;
            }
            if let Err(e) = worker.join() {
                log::error!("{}: {}", self.config.thread_name_prefix, e);
            }
            false
        });
        if retired.len() < before {
            log::trace!(
                "{}: reaped {} retired workers, {} still exiting",
                self.config.thread_name_prefix,
                before - retired.len(),
                retired.len()
            );
        }
    }

    /// Ask every worker to stop
    ///
    /// Idempotent and non-blocking. Workers stay registered; queued jobs stay
    /// queued and are never run.
    pub fn shutdown(&self) {
        let workers = self.workers.lock();
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            log::info!(
                "{}: shutting down {} workers, {} jobs left pending",
                self.config.thread_name_prefix,
                workers.len(),
                self.queue.len()
            );
            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_pool_shutdown(workers.len(), self.queue.len());
        }
        for worker in workers.values() {
            worker.shutdown();
        }
    }

    /// Deliver an external interrupt to one worker
    ///
    /// The worker exits the next time it waits for a job but stays registered,
    /// so it keeps counting toward [`worker_count`](Self::worker_count).
    ///
    /// # Errors
    ///
    /// `ThreadError::UnknownWorker` if no registered worker has this id.
    pub fn interrupt_worker(&self, worker_id: usize) -> Result<()> {
        let workers = self.workers.lock();
        let worker = workers
            .get(&worker_id)
            .ok_or_else(|| ThreadError::unknown_worker(worker_id))?;
        worker.interrupt();
        Ok(())
    }

    /// Wait for stopped workers to exit
    ///
    /// Joins every worker retired by [`remove_workers`](Self::remove_workers)
    /// and, once the pool has been shut down, every registered worker. On a
    /// running pool the registered workers are left alone. Returns the first
    /// join failure after attempting all joins.
    pub fn join(&self) -> Result<()> {
        let mut handles = Vec::new();
        let retired = std::mem::take(&mut *self.retired.lock());
        for mut worker in retired {
            if let Some(handle) = worker.take_handle() {
                handles.push((worker.id(), handle));
            }
        }
        if self.is_shut_down() {
            for worker in self.workers.lock().values_mut() {
                if let Some(handle) = worker.take_handle() {
                    handles.push((worker.id(), handle));
                }
            }
        }

        let mut first_error = None;
        for (id, handle) in handles {
            if let Err(e) = join_handle(id, handle) {
                log::error!("{}: {}", self.config.thread_name_prefix, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of jobs waiting to be picked up
    ///
    /// Advisory: the value may be stale by the time the caller sees it.
    pub fn job_size(&self) -> usize {
        self.queue.len()
    }

    /// Number of registered workers
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// IDs of the registered workers, in registration order
    pub fn worker_ids(&self) -> Vec<usize> {
        self.workers.lock().keys().copied().collect()
    }

    /// Number of registered workers whose thread is still running
    pub fn live_workers(&self) -> usize {
        self.workers
            .lock()
            .values()
            .filter(|w| !w.is_finished())
            .count()
    }

    /// Upper bound on the number of workers
    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Get total number of jobs submitted
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Snapshot of the pool and its registered workers
    pub fn stats(&self) -> PoolStats {
        let workers = self.workers.lock();
        let snapshots: Vec<WorkerStatSnapshot> = workers.values().map(Worker::snapshot).collect();
        PoolStats {
            captured_at: Utc::now(),
            worker_count: workers.len(),
            live_workers: snapshots.iter().filter(|w| !w.finished).count(),
            pending_jobs: self.queue.len(),
            total_jobs_submitted: self.total_jobs_submitted(),
            workers: snapshots,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
        let pending = self.queue.len();
        if pending > 0 {
            log::warn!(
                "{}: dropping pool with {} unexecuted jobs",
                self.config.thread_name_prefix,
                pending
            );
        }

        // Every worker is already cancelled; they share a single deadline.
        let deadline = Instant::now() + self.config.join_timeout;
        let mut stopping: Vec<Worker> = std::mem::take(self.workers.get_mut())
            .into_values()
            .collect();
        stopping.append(self.retired.get_mut());

        for mut worker in stopping {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match worker.join_timeout(remaining) {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!(
                        "{} did not finish within {:?} of pool drop; detaching thread",
                        worker.name(),
                        self.config.join_timeout
                    );
                    drop(worker.take_handle());
                }
                Err(e) => log::error!("{}: {}", self.config.thread_name_prefix, e),
            }
        }
    }
}
