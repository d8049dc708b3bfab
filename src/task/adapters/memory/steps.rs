//! In-memory step and submission repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{PhaseId, PointFeedback, StepId, Submission, TaskId, TaskStep, UserId},
    ports::{
        SubmissionRepository, SubmissionRepositoryError, SubmissionRepositoryResult,
        TaskStepRepository, TaskStepRepositoryError, TaskStepRepositoryResult,
    },
};

/// Thread-safe in-memory checklist step repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStepRepository {
    steps: Arc<RwLock<HashMap<StepId, TaskStep>>>,
}

impl InMemoryTaskStepRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_sorted(
        &self,
        filter: impl Fn(&TaskStep) -> bool,
    ) -> TaskStepRepositoryResult<Vec<TaskStep>> {
        let steps = self.steps.read().map_err(poisoned_steps)?;
        let mut selected: Vec<TaskStep> = steps.values().filter(|step| filter(step)).cloned().collect();
        selected.sort_by_key(|step| (step.phase(), step.order_index(), step.created_at()));
        Ok(selected)
    }
}

fn poisoned_steps(err: impl ToString) -> TaskStepRepositoryError {
    TaskStepRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskStepRepository for InMemoryTaskStepRepository {
    async fn store(&self, step: &TaskStep) -> TaskStepRepositoryResult<()> {
        let mut steps = self.steps.write().map_err(poisoned_steps)?;
        if steps.contains_key(&step.id()) {
            return Err(TaskStepRepositoryError::DuplicateStep(step.id()));
        }
        steps.insert(step.id(), step.clone());
        Ok(())
    }

    async fn update(&self, step: &TaskStep) -> TaskStepRepositoryResult<()> {
        let mut steps = self.steps.write().map_err(poisoned_steps)?;
        let slot = steps
            .get_mut(&step.id())
            .ok_or(TaskStepRepositoryError::NotFound(step.id()))?;
        *slot = step.clone();
        Ok(())
    }

    async fn delete(&self, id: StepId) -> TaskStepRepositoryResult<()> {
        let mut steps = self.steps.write().map_err(poisoned_steps)?;
        steps
            .remove(&id)
            .map(|_| ())
            .ok_or(TaskStepRepositoryError::NotFound(id))
    }

    async fn find_by_id(&self, id: StepId) -> TaskStepRepositoryResult<Option<TaskStep>> {
        let steps = self.steps.read().map_err(poisoned_steps)?;
        Ok(steps.get(&id).cloned())
    }

    async fn list_for_task(&self, task_id: TaskId) -> TaskStepRepositoryResult<Vec<TaskStep>> {
        self.collect_sorted(|step| step.task_id() == task_id)
    }

    async fn list_for_phase(
        &self,
        task_id: TaskId,
        phase: PhaseId,
    ) -> TaskStepRepositoryResult<Vec<TaskStep>> {
        self.collect_sorted(|step| step.task_id() == task_id && step.phase() == phase)
    }
}

/// Thread-safe in-memory submission repository.
///
/// Optionally attaches fixed point feedback to every stored row and can be
/// switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubmissionRepository {
    state: Arc<RwLock<SubmissionState>>,
}

#[derive(Debug, Default)]
struct SubmissionState {
    rows: HashMap<(TaskId, UserId), Submission>,
    feedback: Option<PointFeedback>,
    failing: bool,
}

impl InMemorySubmissionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `feedback` to every subsequently stored submission.
    #[must_use]
    pub fn with_feedback(self, feedback: PointFeedback) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.feedback = Some(feedback);
        }
        self
    }

    /// Makes every subsequent upsert fail.
    pub fn fail_upserts(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failing = true;
        }
    }
}

fn poisoned_submissions(err: impl ToString) -> SubmissionRepositoryError {
    SubmissionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn upsert(&self, submission: &Submission) -> SubmissionRepositoryResult<Submission> {
        let mut state = self.state.write().map_err(poisoned_submissions)?;
        if state.failing {
            return Err(poisoned_submissions("submission store unavailable"));
        }
        let stored = match state.feedback.clone() {
            Some(feedback) => submission.clone().with_feedback(feedback),
            None => submission.clone(),
        };
        state
            .rows
            .insert((stored.task_id(), stored.user_id()), stored.clone());
        Ok(stored)
    }

    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> SubmissionRepositoryResult<Option<Submission>> {
        let state = self.state.read().map_err(poisoned_submissions)?;
        Ok(state.rows.get(&(task_id, user_id)).cloned())
    }
}
