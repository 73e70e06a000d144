//! Pluggable reporting of job failures
//!
//! Jobs are fire-and-forget: a failing job never reaches the code that
//! submitted it. Instead the worker that ran it hands a [`JobFailure`] to the
//! pool's [`ErrorSink`] and moves on to the next job.

use crate::core::ThreadError;
use std::fmt;

/// How a job failed
#[derive(Debug)]
pub enum FailureKind {
    /// The job returned an error
    Error(ThreadError),
    /// The job panicked; carries the panic message
    Panic(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error(e) => write!(f, "error: {}", e),
            FailureKind::Panic(msg) => write!(f, "panic: {}", msg),
        }
    }
}

/// A failed job, as observed by the worker that ran it
#[derive(Debug)]
pub struct JobFailure {
    /// ID of the worker that ran the job
    pub worker_id: usize,
    /// Thread name of the worker
    pub worker_name: String,
    /// [`Job::job_type`](crate::core::Job::job_type) of the failed job
    pub job_type: String,
    /// What went wrong
    pub kind: FailureKind,
}

impl JobFailure {
    /// Returns `true` if the job panicked rather than returning an error
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panic(_))
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed on {} (#{}): {}",
            self.job_type, self.worker_name, self.worker_id, self.kind
        )
    }
}

/// Destination for job failures
///
/// Called on the worker thread, after the job has finished and without any
/// pool lock held. Implementations must not panic.
///
/// Any `Fn(&JobFailure) + Send + Sync` closure is a sink:
///
/// ```rust
/// use bounded_worker_pool::prelude::*;
/// use std::sync::Arc;
///
/// let config = ThreadPoolConfig::new(2)
///     .with_error_sink(Arc::new(|failure: &JobFailure| eprintln!("{}", failure)));
/// # let _ = config;
/// ```
pub trait ErrorSink: Send + Sync {
    /// Report one failed job
    fn report(&self, failure: &JobFailure);
}

impl<F> ErrorSink for F
where
    F: Fn(&JobFailure) + Send + Sync,
{
    fn report(&self, failure: &JobFailure) {
        self(failure)
    }
}

/// Default sink: writes failures to the `log` facade
///
/// Errors are logged at `warn`, panics at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report(&self, failure: &JobFailure) {
        match &failure.kind {
            FailureKind::Error(e) => log::warn!(
                "{}: job {} failed: {}",
                failure.worker_name,
                failure.job_type,
                e
            ),
            FailureKind::Panic(msg) => log::error!(
                "{}: job {} panicked: {}",
                failure.worker_name,
                failure.job_type,
                msg
            ),
        }
    }
}
