//! Stop signal shared between a worker thread and its owner
//!
//! Rust threads cannot be interrupted from outside, so every worker carries a
//! [`CancellationToken`]. Cancelling the token is the interrupt: the worker's
//! blocking wait on the job queue observes it, and the callbacks registered
//! with [`CancellationToken::on_cancel`] are used to wake that wait.
//!
//! # Example
//!
//! ```rust
//! use bounded_worker_pool::{CancellationReason, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let observer = token.clone();
//!
//! token.cancel_with_reason(CancellationReason::Interrupted);
//!
//! assert!(observer.is_cancelled());
//! assert_eq!(observer.reason(), Some(CancellationReason::Interrupted));
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reason for cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancellationReason {
    /// The owning pool asked the worker to stop
    Shutdown,
    /// An external interrupt was delivered to the worker
    Interrupted,
    /// Explicitly cancelled via [`CancellationToken::cancel`]
    Manual,
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancellationReason::Shutdown => write!(f, "shutdown requested"),
            CancellationReason::Interrupted => write!(f, "interrupted"),
            CancellationReason::Manual => write!(f, "manually cancelled"),
        }
    }
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct TokenState {
    reason: Option<CancellationReason>,
    callbacks: Vec<Callback>,
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    state: Mutex<TokenState>,
}

/// A thread-safe, one-shot cancellation flag with wake-up callbacks
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                state: Mutex::new(TokenState::default()),
            }),
        }
    }

    /// Cancel this token with default reason (Manual)
    pub fn cancel(&self) {
        self.cancel_with_reason(CancellationReason::Manual);
    }

    /// Cancel this token with a specific reason
    ///
    /// Only the first call has an effect: it records the reason and runs every
    /// registered callback on the calling thread. Later calls are no-ops.
    pub fn cancel_with_reason(&self, reason: CancellationReason) {
        let callbacks = {
            let mut state = self.inner.state.lock();
            if state.reason.is_some() {
                return;
            }
            state.reason = Some(reason);
            self.inner.cancelled.store(true, Ordering::Release);
            std::mem::take(&mut state.callbacks)
        };

        for callback in callbacks {
            callback();
        }
    }

    /// Check if this token has been cancelled
    ///
    /// Lock-free; safe to call while holding other locks.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the cancellation reason (if cancelled)
    pub fn reason(&self) -> Option<CancellationReason> {
        self.inner.state.lock().reason.clone()
    }

    /// Registers a callback to run when cancelled
    ///
    /// If the token is already cancelled the callback runs immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            if state.reason.is_none() {
                state.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
