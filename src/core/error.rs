//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// A resize request was rejected before any mutation took place
    #[error("Invalid argument to {operation}: requested {requested} with {worker_count} workers")]
    InvalidArgument {
        /// Name of the rejected operation
        operation: &'static str,
        /// Number of workers requested
        requested: usize,
        /// Number of workers registered when the request was made
        worker_count: usize,
    },

    /// The pool has been shut down
    #[error("Worker pool has been shut down")]
    ShutDown,

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Job execution failed
    #[error("Job execution failed ({job_type}): {message}")]
    ExecutionError {
        /// Type name of the failed job
        job_type: String,
        /// Error message
        message: String,
    },

    /// No worker with the given id is registered
    #[error("No worker #{worker_id} is registered with the pool")]
    UnknownWorker {
        /// ID that was looked up
        worker_id: usize,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ThreadError {
    /// Create an invalid argument error
    pub fn invalid_argument(operation: &'static str, requested: usize, worker_count: usize) -> Self {
        ThreadError::InvalidArgument {
            operation,
            requested,
            worker_count,
        }
    }

    /// Create a spawn error carrying the OS error
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source,
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(job_type: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::ExecutionError {
            job_type: job_type.into(),
            message: message.into(),
        }
    }

    /// Create an unknown worker error
    pub fn unknown_worker(worker_id: usize) -> Self {
        ThreadError::UnknownWorker { worker_id }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ThreadError::Other(msg.into())
    }
}
