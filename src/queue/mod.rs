//! The shared job queue consumed by pool workers.
//!
//! [`JobQueue`] is a strict FIFO: insertion order is execution-start order
//! for any single consumer, jobs are never reordered or deduplicated, and each
//! job is handed to exactly one consumer. It has no capacity limit, so
//! producers are never rejected; nothing applies backpressure when no
//! consumer is left.

mod fifo;

pub use fifo::{Dequeue, JobQueue};
