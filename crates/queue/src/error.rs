//! Queue error types.

use std::time::Duration;

use thiserror::Error;

use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The allocator handed out an id that is still registered.
    #[error("task id {0} already registered")]
    IdCollision(TaskId),

    /// A second outcome was sent to a completed handle.
    #[error("duplicate outcome delivery for task {0}")]
    DuplicateDelivery(TaskId),

    /// The completion handle was dropped before an outcome arrived.
    #[error("task {0} abandoned without an outcome")]
    Abandoned(TaskId),

    #[error("task {id} timed out after {after:?}")]
    Timeout { id: TaskId, after: Duration },

    #[error("wire encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("wire decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The executor panicked; the task was abandoned.
    #[error("executor panicked on task {id}: {message}")]
    ExecutorPanicked { id: TaskId, message: String },

    #[error("dispatcher pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("scheduler is shut down")]
    ShutDown,
}

impl QueueError {
    /// Invariant violations. Callers must not retry or swallow these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, QueueError::IdCollision(_) | QueueError::DuplicateDelivery(_))
    }
}
