//! Reviewer decisions on submitted proof and active-phase editing.

use super::{
    WorkflowResult,
    support::{load_task, resolve_actor},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{ActivePhases, PhaseDecision, PhaseId, Task, TaskId, UserId},
    ports::{MembershipDirectory, TaskRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// A committed approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// The committed task.
    pub task: Task,
    /// Sub-state and completion after the approval.
    pub decision: PhaseDecision,
}

/// Phase review orchestration service.
#[derive(Clone)]
pub struct PhaseReviewService<R, D, C>
where
    R: TaskRepository,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    directory: Arc<D>,
    clock: Arc<C>,
    config: Arc<EngineConfig>,
}

impl<R, D, C> PhaseReviewService<R, D, C>
where
    R: TaskRepository,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new phase review service.
    #[must_use]
    pub const fn new(
        tasks: Arc<R>,
        directory: Arc<D>,
        clock: Arc<C>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tasks,
            directory,
            clock,
            config,
        }
    }

    /// Approves the proof submitted for `phase`.
    ///
    /// Approving the final active phase completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the reviewer lacks the role,
    /// the task is closed, the phase has no proof or another writer
    /// committed first.
    pub async fn approve_phase(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        phase: PhaseId,
    ) -> WorkflowResult<ReviewOutcome> {
        let mut task = self.load_for_review(reviewer, task_id, "approve phases").await?;
        let decision = task.approve_phase(phase, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(
            task_id = %task_id,
            %phase,
            sub_state = %decision.sub_state,
            task_completed = decision.task_completed,
            revision = %committed.revision(),
            "phase approved"
        );
        Ok(ReviewOutcome {
            task: committed,
            decision,
        })
    }

    /// Rejects the proof submitted for `phase`, reopening it.
    ///
    /// # Errors
    ///
    /// As [`PhaseReviewService::approve_phase`].
    pub async fn reject_phase(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        phase: PhaseId,
    ) -> WorkflowResult<Task> {
        let mut task = self.load_for_review(reviewer, task_id, "reject phases").await?;
        task.reject_phase(phase, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(task_id = %task_id, %phase, revision = %committed.revision(), "phase rejected");
        Ok(committed)
    }

    /// Replaces the task's active phases.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the list is not an ordered
    /// subsequence of the catalog, the task is closed, the reviewer lacks
    /// the role or the write conflicts.
    pub async fn edit_active_phases(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        phases: Vec<PhaseId>,
    ) -> WorkflowResult<Task> {
        let mut task = self
            .load_for_review(reviewer, task_id, "edit active phases")
            .await?;
        let active = ActivePhases::new(phases, self.config.catalog())?;
        task.replace_active_phases(active, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(
            task_id = %task_id,
            phases = committed.active_phases().len(),
            lifecycle_state = %committed.lifecycle_state(),
            "active phases replaced"
        );
        Ok(committed)
    }

    async fn load_for_review(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        action: &'static str,
    ) -> WorkflowResult<Task> {
        let task = load_task(&*self.tasks, task_id).await?;
        let actor = resolve_actor(&*self.directory, task.org_id(), reviewer, action).await?;
        actor.require_reviewer(action)?;
        Ok(task)
    }
}
