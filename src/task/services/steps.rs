//! Checklist step management and the step gate.

use super::{
    WorkflowError, WorkflowResult,
    support::{load_task, resolve_actor},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        Actor, Effort, EffortProgress, NewStep, PhaseId, StepGate, StepId, StepStatus, Task,
        TaskDomainError, TaskId, TaskStep, UserId,
    },
    ports::{MembershipDirectory, TaskRepository, TaskStepRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Checklist orchestration service.
#[derive(Clone)]
pub struct StepService<R, S, D, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    steps: Arc<S>,
    directory: Arc<D>,
    clock: Arc<C>,
    config: Arc<EngineConfig>,
}

impl<R, S, D, C> StepService<R, S, D, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new step service.
    #[must_use]
    pub const fn new(
        tasks: Arc<R>,
        steps: Arc<S>,
        directory: Arc<D>,
        clock: Arc<C>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tasks,
            steps,
            directory,
            clock,
            config,
        }
    }

    /// Appends a step to a phase's checklist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the task is missing or closed, the
    /// phase is inactive, the title is blank or the actor is neither the
    /// assignee nor a reviewer.
    pub async fn add_step(
        &self,
        user: UserId,
        task_id: TaskId,
        phase: PhaseId,
        title: &str,
        estimate: Option<Effort>,
    ) -> WorkflowResult<TaskStep> {
        let task = load_task(&*self.tasks, task_id).await?;
        let actor = self.authorise(&task, user, "add steps").await?;
        task.ensure_open()?;
        if !task.active_phases().contains(phase) {
            return Err(TaskDomainError::PhaseNotActive { task_id, phase }.into());
        }

        let existing = self.steps.list_for_phase(task_id, phase).await?;
        let step = TaskStep::new(
            NewStep {
                task_id,
                phase,
                title: title.to_owned(),
                estimated: estimate.unwrap_or_else(|| self.config.default_step_effort()),
                created_by: user,
                created_by_role: actor.role(),
                order_index: u32::try_from(existing.len()).unwrap_or(u32::MAX),
            },
            &*self.clock,
        )?;
        self.steps.store(&step).await?;
        debug!(task_id = %task_id, step_id = %step.id(), %phase, "step added");
        Ok(step)
    }

    /// Marks a step completed or back to pending.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] for a skipped or missing step or an
    /// unauthorised actor.
    pub async fn toggle_step(
        &self,
        user: UserId,
        step_id: StepId,
        completed: bool,
    ) -> WorkflowResult<TaskStep> {
        let (_, mut step) = self.load_for_change(user, step_id, "toggle steps").await?;
        step.set_completed(completed, &*self.clock)?;
        self.steps.update(&step).await?;
        debug!(step_id = %step_id, status = %step.status(), "step toggled");
        Ok(step)
    }

    /// Skips a step with a mandatory reason.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] for a blank reason, an already skipped or
    /// missing step, or an unauthorised actor.
    pub async fn skip_step(
        &self,
        user: UserId,
        step_id: StepId,
        reason: &str,
    ) -> WorkflowResult<TaskStep> {
        let (_, mut step) = self.load_for_change(user, step_id, "skip steps").await?;
        step.skip(reason, &*self.clock)?;
        self.steps.update(&step).await?;
        debug!(step_id = %step_id, "step skipped");
        Ok(step)
    }

    /// Renames a pending step. Only its creator or a reviewer may do so.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the step is not pending, the title is
    /// blank or the actor is not allowed.
    pub async fn rename_step(
        &self,
        user: UserId,
        step_id: StepId,
        title: &str,
    ) -> WorkflowResult<TaskStep> {
        let (actor, mut step) = self.load_for_change(user, step_id, "rename steps").await?;
        if !actor.role().is_reviewer() && step.created_by() != user {
            return Err(TaskDomainError::Forbidden {
                user_id: user,
                action: "rename steps created by others",
            }
            .into());
        }
        step.rename(title, &*self.clock)?;
        self.steps.update(&step).await?;
        Ok(step)
    }

    /// Deletes a step.
    ///
    /// Reviewers may delete any step. Other users may delete only pending
    /// steps they created.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the step is missing or the actor is
    /// not allowed.
    pub async fn delete_step(&self, user: UserId, step_id: StepId) -> WorkflowResult<()> {
        let (actor, step) = self.load_for_change(user, step_id, "delete steps").await?;
        if !actor.role().is_reviewer() {
            if step.created_by() != user {
                return Err(TaskDomainError::Forbidden {
                    user_id: user,
                    action: "delete steps created by others",
                }
                .into());
            }
            if step.status() != StepStatus::Pending {
                return Err(TaskDomainError::StepNotPending(step_id).into());
            }
        }
        self.steps.delete(step_id).await?;
        info!(step_id = %step_id, task_id = %step.task_id(), "step deleted");
        Ok(())
    }

    /// Returns `true` when the task's current phase has pending steps.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the task or its steps cannot be read.
    pub async fn has_pending_steps(&self, task_id: TaskId) -> WorkflowResult<bool> {
        let task = load_task(&*self.tasks, task_id).await?;
        let steps = self
            .steps
            .list_for_phase(task_id, task.lifecycle_state())
            .await?;
        Ok(StepGate::has_pending_steps(&task, &steps))
    }

    /// Returns the steps of one phase in checklist order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the steps cannot be read.
    pub async fn steps_for_phase(
        &self,
        task_id: TaskId,
        phase: PhaseId,
    ) -> WorkflowResult<Vec<TaskStep>> {
        Ok(self.steps.list_for_phase(task_id, phase).await?)
    }

    /// Returns effort progress for one phase, or the whole task when
    /// `phase` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the steps cannot be read.
    pub async fn progress(
        &self,
        task_id: TaskId,
        phase: Option<PhaseId>,
    ) -> WorkflowResult<EffortProgress> {
        let steps = match phase {
            Some(selected) => self.steps.list_for_phase(task_id, selected).await?,
            None => self.steps.list_for_task(task_id).await?,
        };
        Ok(EffortProgress::of(&steps))
    }

    async fn authorise(
        &self,
        task: &Task,
        user: UserId,
        action: &'static str,
    ) -> WorkflowResult<Actor> {
        let actor = resolve_actor(&*self.directory, task.org_id(), user, action).await?;
        actor.require_assignee_or_reviewer(task, action)?;
        Ok(actor)
    }

    async fn load_for_change(
        &self,
        user: UserId,
        step_id: StepId,
        action: &'static str,
    ) -> WorkflowResult<(Actor, TaskStep)> {
        let step = self
            .steps
            .find_by_id(step_id)
            .await?
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        let task = load_task(&*self.tasks, step.task_id()).await?;
        let actor = self.authorise(&task, user, action).await?;
        task.ensure_open()?;
        Ok((actor, step))
    }
}
