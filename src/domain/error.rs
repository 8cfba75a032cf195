use thiserror::Error;

use super::storage::StorageError;
use super::task::TaskId;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Rejected input; the store is unchanged.
    #[error("{0}")]
    Validation(String),

    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Every id above the highest stored one is taken.
    #[error("no task ids left above {0}")]
    IdsExhausted(TaskId),

    /// The stored collection could not be read; nothing was loaded.
    #[error("failed to load tasks: {0}")]
    Load(#[source] StorageError),

    /// The in-memory change was applied but could not be written to storage.
    #[error("failed to persist tasks: {0}")]
    Persistence(#[source] StorageError),
}

impl TaskError {
    pub fn title_required() -> Self { TaskError::Validation("Title is required.".to_string()) }

    pub fn invalid_priority(value: &str) -> Self {
        TaskError::Validation(format!("Priority must be high, normal or low, got \"{value}\"."))
    }
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;
