//! Repository ports for checklist steps and effort submissions.

use crate::task::domain::{PhaseId, StepId, Submission, TaskId, TaskStep, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for step repository operations.
pub type TaskStepRepositoryResult<T> = Result<T, TaskStepRepositoryError>;

/// Checklist step persistence contract.
#[async_trait]
pub trait TaskStepRepository: Send + Sync {
    /// Stores a new step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStepRepositoryError::DuplicateStep`] when the ID exists.
    async fn store(&self, step: &TaskStep) -> TaskStepRepositoryResult<()>;

    /// Replaces an existing step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStepRepositoryError::NotFound`] when the step is absent.
    async fn update(&self, step: &TaskStep) -> TaskStepRepositoryResult<()>;

    /// Deletes a step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStepRepositoryError::NotFound`] when the step is absent.
    async fn delete(&self, id: StepId) -> TaskStepRepositoryResult<()>;

    /// Finds a step by identifier.
    async fn find_by_id(&self, id: StepId) -> TaskStepRepositoryResult<Option<TaskStep>>;

    /// Returns every step of a task ordered by phase then `order_index`.
    async fn list_for_task(&self, task_id: TaskId) -> TaskStepRepositoryResult<Vec<TaskStep>>;

    /// Returns the steps of one phase ordered by `order_index`.
    async fn list_for_phase(
        &self,
        task_id: TaskId,
        phase: PhaseId,
    ) -> TaskStepRepositoryResult<Vec<TaskStep>>;
}

/// Errors returned by step repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStepRepositoryError {
    /// A step with the same identifier already exists.
    #[error("duplicate step identifier: {0}")]
    DuplicateStep(StepId),

    /// The step was not found.
    #[error("step not found: {0}")]
    NotFound(StepId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStepRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Result type for submission repository operations.
pub type SubmissionRepositoryResult<T> = Result<T, SubmissionRepositoryError>;

/// Effort submission persistence contract.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Inserts or replaces the submission keyed by `(task_id, user_id)`.
    ///
    /// Returns the stored row, including any feedback the store attached.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionRepositoryError::Persistence`] on store failure.
    async fn upsert(&self, submission: &Submission) -> SubmissionRepositoryResult<Submission>;

    /// Finds the submission of `user_id` on `task_id`.
    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> SubmissionRepositoryResult<Option<Submission>>;
}

/// Errors returned by submission repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SubmissionRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SubmissionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
