//! Core types and traits for the worker pool

pub mod cancellation;
pub mod error;
pub mod job;

pub use cancellation::{CancellationReason, CancellationToken};
pub use error::{Result, ThreadError};
pub use job::{BoxedJob, ClosureJob, Job};
