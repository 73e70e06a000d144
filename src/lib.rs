//! # Bounded Worker Pool
//!
//! A fixed-capacity pool of long-lived worker threads consuming jobs from a
//! shared FIFO queue, with a worker count that can be changed at runtime and
//! cooperative shutdown.
//!
//! ## Features
//!
//! - **Bounded**: between [`MIN_WORKERS`] and `max_workers` ([`MAX_WORKERS`]
//!   by default) workers at all times
//! - **Resizable**: [`ThreadPool::add_workers`] clamps to capacity,
//!   [`ThreadPool::remove_workers`] retires the earliest registered workers
//! - **FIFO**: jobs start in submission order; each job runs exactly once
//! - **Fire-and-forget**: failing or panicking jobs are reported to an
//!   [`ErrorSink`] and never stop the worker
//! - **Cooperative shutdown**: running jobs finish, idle workers exit at once,
//!   pending jobs are left in the queue
//!
//! ## Quick Start
//!
//! ```rust
//! use bounded_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new()?;
//! assert_eq!(pool.worker_count(), DEFAULT_WORKERS);
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!         Ok(())
//!     });
//! }
//!
//! pool.shutdown();
//! pool.join()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Resizing
//!
//! ```rust
//! use bounded_worker_pool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::with_workers(5)?;
//!
//! // Only 5 more fit under the default maximum of 10.
//! assert_eq!(pool.add_workers(8)?, 5);
//!
//! // Removing every worker is rejected and changes nothing.
//! assert!(pool.remove_workers(10).is_err());
//! pool.remove_workers(4)?;
//! assert_eq!(pool.worker_ids(), vec![5, 6, 7, 8, 9, 10]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use bounded_worker_pool::prelude::*;
//!
//! struct Resize {
//!     path: String,
//! }
//!
//! impl Job for Resize {
//!     fn execute(&mut self) -> Result<()> {
//!         println!("Resizing {}", self.path);
//!         Ok(())
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "Resize"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::with_workers(2)?;
//! pool.submit(Resize {
//!     path: "cat.png".to_string(),
//! });
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{
    BoxedJob, CancellationReason, CancellationToken, ClosureJob, Job, Result, ThreadError,
};
pub use crate::pool::{
    ErrorSink, FailureKind, JobFailure, LogSink, PoolStats, ThreadPool, ThreadPoolConfig,
    WorkerStats, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS,
};
