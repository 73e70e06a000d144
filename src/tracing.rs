//! Tracing integration for observability.
//!
//! Available with the `tracing` feature. Workers open a `worker` span for
//! their whole life and a `job_execution` span per job. The functions in
//! [`metrics`] emit the pool's lifecycle, resize and per-job events, tagged
//! with the worker's thread name so a subscriber can attribute them.
//!
//! # Example
//!
//! ```rust,ignore
//! use bounded_worker_pool::prelude::*;
//!
//! let pool = ThreadPool::with_workers(4)?;
//!
//! let span = tracing::info_span!("request", id = 42);
//! let _enter = span.enter();
//! // Runs inside `request` on a worker thread; its queue wait is recorded.
//! pool.submit_traced(ClosureJob::with_name(|| Ok(()), "Render"));
//! ```

use crate::core::{Job, Result};
use std::time::{Duration, Instant};

/// A job that carries the submitter's span onto the worker thread
///
/// The span current when the job is wrapped becomes the parent of a
/// `queued_job` span entered while the job runs. The time the job spent
/// waiting in the FIFO queue is recorded when it starts.
pub struct TracedJob<J: Job> {
    inner: J,
    parent: tracing::Span,
    enqueued_at: Instant,
}

impl<J: Job> TracedJob<J> {
    /// Wrap `job` under the current span
    pub fn new(job: J) -> Self {
        Self::in_span(job, tracing::Span::current())
    }

    /// Wrap `job` under `parent`
    pub fn in_span(job: J, parent: tracing::Span) -> Self {
        Self {
            inner: job,
            parent,
            enqueued_at: Instant::now(),
        }
    }

    /// How long ago the job was wrapped
    pub fn queued_for(&self) -> Duration {
        self.enqueued_at.elapsed()
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) -> Result<()> {
        let waited = self.queued_for();
        let span = tracing::debug_span!(
            parent: &self.parent,
            "queued_job",
            job_type = self.inner.job_type(),
            queued_us = waited.as_micros() as u64
        );
        let _guard = span.enter();
        metrics::record_queue_wait(self.inner.job_type(), waited);
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// How a job ended, as seen by the worker that ran it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Returned `Ok`
    Completed,
    /// Returned an error
    Failed,
    /// Panicked
    Panicked,
}

impl JobOutcome {
    fn as_str(self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Failed => "failed",
            JobOutcome::Panicked => "panicked",
        }
    }
}

/// Trace events emitted by the pool and its workers
///
/// Field names follow the `counter.*` / `gauge.*` / `histogram.*` convention
/// understood by metrics layers built on `tracing`.
pub mod metrics {
    use super::JobOutcome;
    use std::time::Duration;

    /// A job entered the queue
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as u64,
            "job submitted"
        );
    }

    /// A traced job left the queue after `waited`
    #[inline]
    pub fn record_queue_wait(job_type: &str, waited: Duration) {
        tracing::trace!(
            job_type,
            histogram.queue_wait_us = waited.as_micros() as u64,
            "job dequeued"
        );
    }

    /// `worker` picked up a job
    #[inline]
    pub fn record_job_started(worker: &str, job_type: &str) {
        tracing::trace!(worker, job_type, gauge.workers_busy = 1i64, "job started");
    }

    /// `worker` finished a job, one way or another
    #[inline]
    pub fn record_job_finished(worker: &str, job_type: &str, elapsed: Duration, outcome: JobOutcome) {
        let duration_us = elapsed.as_micros() as u64;
        match outcome {
            JobOutcome::Completed => tracing::trace!(
                worker,
                job_type,
                counter.jobs_completed = 1,
                gauge.workers_busy = -1i64,
                histogram.job_duration_us = duration_us,
                "job completed"
            ),
            JobOutcome::Failed | JobOutcome::Panicked => tracing::debug!(
                worker,
                job_type,
                outcome = outcome.as_str(),
                counter.jobs_failed = 1,
                gauge.workers_busy = -1i64,
                histogram.job_duration_us = duration_us,
                "job did not complete"
            ),
        }
    }

    /// Workers were spawned by a resize
    #[inline]
    pub fn record_workers_added(added: usize, worker_count: usize) {
        tracing::debug!(
            counter.workers_added = added as u64,
            gauge.worker_count = worker_count as u64,
            "workers added"
        );
    }

    /// The earliest registered workers were retired by a resize
    #[inline]
    pub fn record_workers_removed(removed: usize, worker_count: usize) {
        tracing::debug!(
            counter.workers_removed = removed as u64,
            gauge.worker_count = worker_count as u64,
            "workers removed"
        );
    }

    /// The pool came up with `num_workers` of at most `max_workers`
    #[inline]
    pub fn record_pool_start(num_workers: usize, max_workers: usize) {
        tracing::info!(
            workers = num_workers,
            max_workers = max_workers,
            "worker pool started"
        );
    }

    /// Shutdown was requested, leaving `pending_jobs` unexecuted
    #[inline]
    pub fn record_pool_shutdown(num_workers: usize, pending_jobs: usize) {
        tracing::info!(
            workers = num_workers,
            pending_jobs = pending_jobs,
            "worker pool shutdown requested"
        );
    }
}
