//! Error type shared by the task workflow services.

use crate::task::{
    domain::{ErrorKind, Revision, StepId, TaskDomainError, TaskId},
    ports::{
        ArtifactStorageError, DirectoryError, TaskRepositoryError, TaskStepRepositoryError,
    },
};
use thiserror::Error;

/// Service-level errors for the review workflow.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// Domain validation or a state rule failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The checklist step does not exist.
    #[error("step not found: {0}")]
    StepNotFound(StepId),

    /// Another writer committed to the task first.
    #[error("task {task_id} was modified concurrently (expected {expected}, found {actual})")]
    Concurrency {
        /// Task identifier.
        task_id: TaskId,
        /// Revision the operation read.
        expected: Revision,
        /// Revision that was stored.
        actual: Revision,
    },

    /// Task persistence failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),

    /// Step persistence failed.
    #[error(transparent)]
    Steps(TaskStepRepositoryError),

    /// Artifact upload or deletion failed.
    #[error(transparent)]
    Storage(#[from] ArtifactStorageError),

    /// The membership directory failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl WorkflowError {
    /// Classifies the error into the engine taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::TaskNotFound(_) | Self::StepNotFound(_) => ErrorKind::NotFound,
            Self::Concurrency { .. } => ErrorKind::Concurrency,
            Self::Repository(err) => err.kind(),
            Self::Steps(TaskStepRepositoryError::DuplicateStep(_)) => ErrorKind::InvalidState,
            Self::Steps(_) | Self::Directory(_) => ErrorKind::Persistence,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<TaskRepositoryError> for WorkflowError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            TaskRepositoryError::RevisionConflict {
                task_id,
                expected,
                actual,
            } => Self::Concurrency {
                task_id,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}

impl From<TaskStepRepositoryError> for WorkflowError {
    fn from(err: TaskStepRepositoryError) -> Self {
        match err {
            TaskStepRepositoryError::NotFound(step_id) => Self::StepNotFound(step_id),
            other => Self::Steps(other),
        }
    }
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
