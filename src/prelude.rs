//! Convenient re-exports for common types and traits

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, Result, ThreadError,
};
pub use crate::pool::{
    ErrorSink, FailureKind, JobFailure, LogSink, PoolStats, ThreadPool, ThreadPoolConfig,
    DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS,
};
