//! Job error types.

use freestays_core::FreestaysError;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed.
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Job was cancelled.
    #[error("Job was cancelled")]
    Cancelled,

    /// Another run holds the job's lock.
    #[error("Job is already running: {0}")]
    AlreadyRunning(String),

    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Job not found.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Returns true if the next scheduled run may succeed without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            JobError::ExecutionFailed(_)
                | JobError::AlreadyRunning(_)
                | JobError::Redis(_)
                | JobError::Pool(_)
        )
    }
}

impl From<FreestaysError> for JobError {
    fn from(err: FreestaysError) -> Self {
        match err {
            FreestaysError::Conflict(message) => JobError::AlreadyRunning(message),
            FreestaysError::Configuration(message) => JobError::Configuration(message),
            other if other.is_retriable() => JobError::ExecutionFailed(other.to_string()),
            other => JobError::Internal(other.to_string()),
        }
    }
}
