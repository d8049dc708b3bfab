//! Repository port for the task aggregate with revision-checked writes.

use crate::task::domain::{ErrorKind, Revision, Task, TaskId, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every write after the initial insert is a compare-and-swap on
/// [`Task::revision`]: the stored revision must equal the one the caller
/// read, and the committed row carries the next revision.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists all embedded state of an existing task.
    ///
    /// Returns the committed task stamped with its new revision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::RevisionConflict`] when another writer
    /// committed since `task` was read.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task>;

    /// Closes `original` and inserts `replacement` in one atomic write.
    ///
    /// Returns the committed original.
    ///
    /// # Errors
    ///
    /// Same as [`TaskRepository::update`] for the original, plus
    /// [`TaskRepositoryError::DuplicateTask`] for the replacement. Nothing
    /// is written when either fails.
    async fn commit_reassignment(
        &self,
        original: &Task,
        replacement: &Task,
    ) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns tasks assigned to `user`, newest first.
    async fn find_by_assignee(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Another writer committed first.
    #[error("task {task_id} was modified concurrently (expected {expected}, found {actual})")]
    RevisionConflict {
        /// Task identifier.
        task_id: TaskId,
        /// Revision the writer read.
        expected: Revision,
        /// Revision currently stored.
        actual: Revision,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Classifies the error into the engine taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTask(_) => ErrorKind::InvalidState,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RevisionConflict { .. } => ErrorKind::Concurrency,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
