//! Worker thread implementation

use crate::core::{BoxedJob, CancellationReason, CancellationToken, Result, ThreadError};
use crate::pool::sink::{ErrorSink, FailureKind, JobFailure};
use crate::queue::{Dequeue, JobQueue};
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::tracing::JobOutcome;
#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that completed successfully
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that returned an error
    pub jobs_failed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs failed counter
    pub fn increment_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs failed
    pub fn get_jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Total number of jobs this worker has run, whatever the outcome
    pub fn get_jobs_executed(&self) -> u64 {
        self.get_jobs_processed() + self.get_jobs_failed() + self.get_jobs_panicked()
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_executed();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time copy of one worker's state and counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatSnapshot {
    /// Worker ID (registration order)
    pub worker_id: usize,
    /// Thread name
    pub name: String,
    /// Whether the worker has not been asked to shut down
    pub running: bool,
    /// Whether the worker thread has exited
    pub finished: bool,
    /// Jobs completed successfully
    pub jobs_processed: u64,
    /// Jobs that returned an error
    pub jobs_failed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Average time per job in microseconds
    pub average_processing_time_us: f64,
}

/// A long-lived worker thread consuming jobs from the pool's queue
///
/// # Lifecycle
///
/// `Running` until [`shutdown`](Self::shutdown) or [`interrupt`](Self::interrupt)
/// is called, then `Exiting`: the thread finishes the job it is running (if
/// any), takes no further job, and returns. Both calls wake the thread if it
/// is blocked waiting for work.
#[derive(Debug)]
pub struct Worker {
    id: usize,
    name: String,
    thread: Option<thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
    token: CancellationToken,
    stats: Arc<WorkerStats>,
    drop_timeout: Duration,
}

/// State moved onto the worker thread
struct WorkerContext {
    id: usize,
    name: String,
    queue: Arc<JobQueue>,
    sink: Arc<dyn ErrorSink>,
    running: Arc<AtomicBool>,
    token: CancellationToken,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a named worker thread bound to `queue`
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this worker
    /// * `name` - Thread name
    /// * `queue` - Queue shared with the pool and the other workers
    /// * `sink` - Destination for failures of jobs run by this worker
    /// * `drop_timeout` - How long `Drop` waits for the thread to exit
    pub fn spawn(
        id: usize,
        name: String,
        queue: Arc<JobQueue>,
        sink: Arc<dyn ErrorSink>,
        drop_timeout: Duration,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let running = Arc::new(AtomicBool::new(true));
        let token = CancellationToken::new();

        let waker = Arc::clone(&queue);
        token.on_cancel(move || waker.wake_all());

        let context = WorkerContext {
            id,
            name: name.clone(),
            queue,
            sink,
            running: Arc::clone(&running),
            token: token.clone(),
            stats: Arc::clone(&stats),
        };

        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || context.run())
            .map_err(|e| ThreadError::spawn_with_source(id, "cannot create worker thread", e))?;

        Ok(Self {
            id,
            name,
            thread: Some(thread),
            running,
            token,
            stats,
            drop_timeout,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the worker's thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Returns `false` once [`shutdown`](Self::shutdown) has been called
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns `true` if the worker thread has exited (or has been joined)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Why the worker was told to stop, if it was
    pub fn stop_reason(&self) -> Option<CancellationReason> {
        self.token.reason()
    }

    /// Ask the worker to stop after its current job
    ///
    /// Idempotent. Does not wait for the thread to exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
        self.token.cancel_with_reason(CancellationReason::Shutdown);
    }

    /// Deliver an external interrupt to the worker
    ///
    /// The worker exits the next time it waits for a job. Unlike
    /// [`shutdown`](Self::shutdown) the running flag is left untouched, so
    /// [`is_running`](Self::is_running) keeps reporting `true`.
    pub fn interrupt(&self) {
        self.token.cancel_with_reason(CancellationReason::Interrupted);
    }

    /// Snapshot of this worker's state and counters
    pub fn snapshot(&self) -> WorkerStatSnapshot {
        WorkerStatSnapshot {
            worker_id: self.id,
            name: self.name.clone(),
            running: self.is_running(),
            finished: self.is_finished(),
            jobs_processed: self.stats.get_jobs_processed(),
            jobs_failed: self.stats.get_jobs_failed(),
            jobs_panicked: self.stats.get_jobs_panicked(),
            average_processing_time_us: self.stats.get_average_processing_time_us(),
        }
    }

    /// Wait for the worker thread to exit
    ///
    /// Blocks until the thread returns, so call it only after
    /// [`shutdown`](Self::shutdown) or [`interrupt`](Self::interrupt).
    /// Joining an already joined worker is a no-op.
    pub fn join(&mut self) -> Result<()> {
        match self.take_handle() {
            Some(thread) => join_handle(self.id, thread),
            None => Ok(()),
        }
    }

    /// Take the thread handle so it can be joined without borrowing the worker
    pub(crate) fn take_handle(&mut self) -> Option<thread::JoinHandle<()>> {
        self.thread.take()
    }

    /// Join the thread if it exits within `timeout`
    ///
    /// Returns `false` if the thread is still running when the timeout expires;
    /// the handle is then kept so a later join can retry.
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<bool> {
        let start = Instant::now();
        loop {
            if self.is_finished() {
                self.join()?;
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl WorkerContext {
    /// Main worker loop
    fn run(self) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = self.id, name = %self.name);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("{} started", self.name);

        while self.running.load(Ordering::Acquire) {
            match self.queue.dequeue_blocking(&self.token) {
                Dequeue::Job(mut job) => self.execute_job(&mut job),
                Dequeue::Cancelled => break,
            }
        }

        #[cfg(feature = "tracing")]
        debug!(
            jobs_processed = self.stats.get_jobs_processed(),
            jobs_failed = self.stats.get_jobs_failed(),
            "worker shutting down"
        );

        let reason = self
            .token
            .reason()
            .map_or_else(|| "running flag cleared".to_string(), |r| r.to_string());
        log::debug!(
            "{} exiting ({}) after {} jobs",
            self.name,
            reason,
            self.stats.get_jobs_executed()
        );
    }

    /// Execute a single job with panic protection
    fn execute_job(&self, job: &mut BoxedJob) {
        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = job.job_type());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_job_started(&self.name, job.job_type());

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| job.execute()));
        let elapsed = start.elapsed();

        let kind = match outcome {
            Ok(Ok(())) => {
                self.stats.increment_processed();
                #[cfg(feature = "tracing")]
                self.trace_finished(job, elapsed, JobOutcome::Completed);
                None
            }
            Ok(Err(e)) => {
                self.stats.increment_failed();
                #[cfg(feature = "tracing")]
                self.trace_finished(job, elapsed, JobOutcome::Failed);
                Some(FailureKind::Error(e))
            }
            Err(panic_info) => {
                self.stats.increment_panicked();
                #[cfg(feature = "tracing")]
                self.trace_finished(job, elapsed, JobOutcome::Panicked);
                Some(FailureKind::Panic(panic_message(&*panic_info)))
            }
        };

        self.stats.add_processing_time(elapsed.as_micros() as u64);

        if let Some(kind) = kind {
            self.sink.report(&JobFailure {
                worker_id: self.id,
                worker_name: self.name.clone(),
                job_type: job.job_type().to_string(),
                kind,
            });
        }
    }

    #[cfg(feature = "tracing")]
    fn trace_finished(&self, job: &BoxedJob, elapsed: Duration, outcome: JobOutcome) {
        crate::tracing::metrics::record_job_finished(&self.name, job.job_type(), elapsed, outcome);
    }
}

/// Join a worker thread, turning a panic into a [`ThreadError::JoinError`]
pub(crate) fn join_handle(id: usize, thread: thread::JoinHandle<()>) -> Result<()> {
    thread
        .join()
        .map_err(|panic_info| ThreadError::join(id, panic_message(&*panic_info)))
}

/// Extract the message carried by a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.thread.is_none() {
            return;
        }
        self.shutdown();

        match self.join_timeout(self.drop_timeout) {
            Ok(true) => {}
            Ok(false) => log::warn!(
                "{} did not finish within {:?} during drop; thread may be leaked",
                self.name,
                self.drop_timeout
            ),
            Err(e) => log::error!("{} panicked during shutdown: {}", self.name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use crate::pool::sink::LogSink;
    use parking_lot::Mutex;
    use std::sync::mpsc;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn spawn_worker(id: usize, queue: &Arc<JobQueue>) -> Worker {
        Worker::spawn(
            id,
            format!("test-worker-{}", id),
            Arc::clone(queue),
            Arc::new(LogSink),
            TIMEOUT,
        )
        .expect("Failed to create worker")
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < TIMEOUT {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_worker_creation() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(1, &queue);
        assert_eq!(worker.id(), 1);
        assert_eq!(worker.name(), "test-worker-1");
        assert!(worker.is_running());

        worker.shutdown();
        assert!(!worker.is_running());
        assert!(worker.join_timeout(TIMEOUT).unwrap());
        assert_eq!(worker.stop_reason(), Some(CancellationReason::Shutdown));
    }

    #[test]
    fn test_worker_runs_on_named_thread() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(7, &queue);
        let (tx, rx) = mpsc::channel();

        queue.enqueue(Box::new(ClosureJob::new(move || {
            tx.send(thread::current().name().map(str::to_string)).unwrap();
            Ok(())
        })));

        assert_eq!(
            rx.recv_timeout(TIMEOUT).unwrap().as_deref(),
            Some("test-worker-7")
        );
        worker.shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_job_execution() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(1, &queue);
        let stats = worker.stats();

        queue.enqueue(Box::new(ClosureJob::new(|| Ok(()))));
        assert!(wait_for(|| stats.get_jobs_processed() == 1));
        assert_eq!(stats.get_jobs_failed(), 0);

        worker.shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_survives_failures() {
        let queue = Arc::new(JobQueue::new());
        let failures = Arc::new(Mutex::new(Vec::new()));
        let failures_clone = Arc::clone(&failures);
        let mut worker = Worker::spawn(
            1,
            "test-worker-1".to_string(),
            Arc::clone(&queue),
            Arc::new(move |f: &JobFailure| failures_clone.lock().push(f.is_panic())),
            TIMEOUT,
        )
        .unwrap();
        let stats = worker.stats();

        queue.enqueue(Box::new(ClosureJob::new(|| {
            panic!("Intentional panic for testing");
        })));
        queue.enqueue(Box::new(ClosureJob::new(|| {
            Err(ThreadError::other("Intentional failure"))
        })));
        queue.enqueue(Box::new(ClosureJob::new(|| Ok(()))));

        assert!(wait_for(|| stats.get_jobs_executed() == 3));
        assert_eq!(stats.get_jobs_panicked(), 1);
        assert_eq!(stats.get_jobs_failed(), 1);
        assert_eq!(stats.get_jobs_processed(), 1);
        assert_eq!(*failures.lock(), vec![true, false]);

        worker.shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn test_shutdown_wakes_idle_worker() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(1, &queue);
        thread::sleep(Duration::from_millis(50));

        worker.shutdown();
        assert!(worker.join_timeout(TIMEOUT).unwrap());
    }

    #[test]
    fn test_shutdown_lets_current_job_finish() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(1, &queue);
        let stats = worker.stats();
        let (started_tx, started_rx) = mpsc::channel();

        queue.enqueue(Box::new(ClosureJob::new(move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(100));
            Ok(())
        })));
        queue.enqueue(Box::new(ClosureJob::new(|| Ok(()))));

        started_rx.recv_timeout(TIMEOUT).unwrap();
        worker.shutdown();
        worker.join().unwrap();

        assert_eq!(stats.get_jobs_processed(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_interrupt_stops_worker_but_keeps_running_flag() {
        let queue = Arc::new(JobQueue::new());
        let mut worker = spawn_worker(1, &queue);

        worker.interrupt();
        assert!(worker.join_timeout(TIMEOUT).unwrap());
        assert!(worker.is_running());
        assert!(worker.is_finished());
        assert_eq!(worker.stop_reason(), Some(CancellationReason::Interrupted));

        // Jobs enqueued afterwards are left for other consumers.
        queue.enqueue(Box::new(ClosureJob::new(|| Ok(()))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let queue = Arc::new(JobQueue::new());
        let worker = spawn_worker(4, &queue);
        let snapshot = worker.snapshot();
        assert_eq!(snapshot.worker_id, 4);
        assert!(snapshot.running);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["name"], "test-worker-4");
        assert_eq!(json["jobs_processed"], 0);
    }
}
