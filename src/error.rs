//! Error types shared by the engine, page and sync layers

use thiserror::Error;

use crate::page::TaskId;

/// Errors raised by the task timer engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Duration text or seconds value that cannot be decoded
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// No countdown display is registered for the task
    #[error("no counter found for task {0}")]
    CounterNotFound(TaskId),

    /// No control button in the requested mode is registered for the task
    #[error("no {mode} button found for task {task_id}")]
    ButtonNotFound { task_id: TaskId, mode: &'static str },

    /// Timer was started while already running
    #[error("timer is already running")]
    AlreadyRunning,

    /// Task has completed and accepts no further activations
    #[error("task {0} is already completed")]
    TaskCompleted(TaskId),

    /// Task id is not part of the page
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// Backend mirroring failed
    #[error("failed to notify backend: {0}")]
    NotifyFailed(String),

    /// A shared lock was poisoned by a panicking holder
    #[error("failed to lock {0}")]
    StatePoisoned(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Task seed could not be read or decoded
    #[error("failed to load tasks: {0}")]
    Seed(String),
}

impl EngineError {
    /// Whether the error is a benign lookup miss that callers treat as a no-op
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            EngineError::CounterNotFound(_)
                | EngineError::ButtonNotFound { .. }
                | EngineError::AlreadyRunning
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
