//! Unbounded FIFO guarded by a mutex and a condition variable.

use crate::core::{BoxedJob, CancellationToken};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Outcome of [`JobQueue::dequeue_blocking`].
#[derive(Debug)]
pub enum Dequeue {
    /// The job at the head of the queue, now owned by the caller
    Job(BoxedJob),
    /// The caller's token was cancelled; the queue was left untouched
    Cancelled,
}

/// The pool's pending work, in submission order.
///
/// Producers never block beyond a short lock hold. Consumers suspend in
/// [`dequeue_blocking`](Self::dequeue_blocking) until a job arrives or their
/// token is cancelled.
///
/// # Example
///
/// ```rust
/// use bounded_worker_pool::core::{CancellationToken, ClosureJob};
/// use bounded_worker_pool::queue::{Dequeue, JobQueue};
///
/// let queue = JobQueue::new();
/// queue.enqueue(Box::new(ClosureJob::new(|| Ok(()))));
/// assert_eq!(queue.len(), 1);
///
/// let token = CancellationToken::new();
/// assert!(matches!(queue.dequeue_blocking(&token), Dequeue::Job(_)));
/// assert!(queue.is_empty());
/// ```
#[derive(Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<BoxedJob>>,
    available: Condvar,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue").field("len", &self.len()).finish()
    }
}

impl JobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job to the tail and wakes one waiting consumer.
    pub fn enqueue(&self, job: BoxedJob) {
        let mut jobs = self.jobs.lock();
        jobs.push_back(job);
        self.available.notify_one();
    }

    /// Removes the head of the queue, waiting while the queue is empty.
    ///
    /// Returns [`Dequeue::Cancelled`] as soon as `token` is observed cancelled,
    /// even when jobs are pending; a cancelled consumer never takes a job. The
    /// token's owner must call [`wake_all`](Self::wake_all) after cancelling,
    /// otherwise a consumer already asleep only notices at its next wake-up.
    pub fn dequeue_blocking(&self, token: &CancellationToken) -> Dequeue {
        let mut jobs = self.jobs.lock();
        loop {
            if token.is_cancelled() {
                // Pass on a wake-up this consumer may have swallowed.
                if !jobs.is_empty() {
                    self.available.notify_one();
                }
                return Dequeue::Cancelled;
            }
            if let Some(job) = jobs.pop_front() {
                return Dequeue::Job(job);
            }
            self.available.wait(&mut jobs);
        }
    }

    /// Wakes every waiting consumer so each re-checks its token.
    pub fn wake_all(&self) {
        let _jobs = self.jobs.lock();
        self.available.notify_all();
    }

    /// Number of pending jobs.
    ///
    /// Advisory only: concurrent producers and consumers may change it before
    /// the caller acts on it.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Returns `true` if no job is pending.
    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}
