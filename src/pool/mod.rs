//! Worker pool, its workers and configuration

pub mod config;
pub mod sink;
pub mod thread_pool;
pub mod worker;

pub use config::{ThreadPoolConfig, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS};
pub use sink::{ErrorSink, FailureKind, JobFailure, LogSink};
pub use thread_pool::{PoolStats, ThreadPool};
pub use worker::{Worker, WorkerStatSnapshot, WorkerStats};
