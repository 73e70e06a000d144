//! Pool configuration

use crate::core::{Result, ThreadError};
use crate::pool::sink::{ErrorSink, LogSink};
use std::sync::Arc;
use std::time::Duration;

/// Smallest number of workers a pool ever runs with
pub const MIN_WORKERS: usize = 1;
/// Number of workers created by [`ThreadPool::new`](crate::ThreadPool::new)
pub const DEFAULT_WORKERS: usize = 5;
/// Largest number of workers a pool ever runs with
pub const MAX_WORKERS: usize = 10;

/// Configuration for a worker pool
#[derive(Clone)]
pub struct ThreadPoolConfig {
    /// Requested number of workers, clamped to `[MIN_WORKERS, max_workers]`
    /// when the pool is built
    pub num_workers: usize,
    /// Upper bound on the number of registered workers, at most
    /// [`MAX_WORKERS`]. Default: [`MAX_WORKERS`]
    pub max_workers: usize,
    /// Thread name prefix; worker threads are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// How long dropping a worker waits for its thread to exit.
    /// Default: 5s
    pub join_timeout: Duration,
    error_sink: Arc<dyn ErrorSink>,
}

impl std::fmt::Debug for ThreadPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolConfig")
            .field("num_workers", &self.num_workers)
            .field("max_workers", &self.max_workers)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("join_timeout", &self.join_timeout)
            .field("error_sink", &"<error sink>")
            .finish()
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            max_workers: MAX_WORKERS,
            thread_name_prefix: "ThreadPool-Worker".to_string(),
            join_timeout: Duration::from_secs(5),
            error_sink: Arc::new(LogSink),
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration requesting `num_workers` workers
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    /// Set the upper bound on the number of workers
    ///
    /// Values above [`MAX_WORKERS`] are rejected by [`validate`](Self::validate).
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set how long dropping a worker waits for its thread to exit
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set where job failures are reported. Default: [`LogSink`]
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = sink;
        self
    }

    pub(crate) fn error_sink(&self) -> Arc<dyn ErrorSink> {
        Arc::clone(&self.error_sink)
    }

    /// Number of workers a pool built from this configuration starts with
    pub fn initial_workers(&self) -> usize {
        self.num_workers
            .clamp(MIN_WORKERS, self.max_workers.max(MIN_WORKERS))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.max_workers) {
            return Err(ThreadError::invalid_config(
                "max_workers",
                format!("must be between {} and {}", MIN_WORKERS, MAX_WORKERS),
            ));
        }
        if self.join_timeout.is_zero() {
            return Err(ThreadError::invalid_config(
                "join_timeout",
                "join timeout must be non-zero",
            ));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ThreadError::invalid_config(
                "thread_name_prefix",
                "thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}
