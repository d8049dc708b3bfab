//! Service layer for task creation, retrieval and archiving.

use super::{
    WorkflowResult,
    support::{Notifier, load_task, resolve_actor},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        ActivePhases, DueSchedule, Effort, NewStep, NewTaskData, OrgId, PhaseId, ProjectId, Task,
        TaskDetails, TaskDomainError, TaskId, TaskStep, UserId,
    },
    ports::{
        MembershipDirectory, NotificationKind, NotificationSink, TaskRepository,
        TaskStepRepository,
    },
};
use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// A checklist step to create together with a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialStep {
    /// Phase the step belongs to.
    pub phase: PhaseId,
    /// Step title.
    pub title: String,
    /// Estimate; the configured default applies when absent.
    pub estimate: Option<Effort>,
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    org_id: OrgId,
    details: TaskDetails,
    project_id: Option<ProjectId>,
    assigned_to: Option<UserId>,
    phases: Option<Vec<PhaseId>>,
    schedule: DueSchedule,
    steps: Vec<InitialStep>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(org_id: OrgId, details: TaskDetails) -> Self {
        Self {
            org_id,
            details,
            project_id: None,
            assigned_to: None,
            phases: None,
            schedule: DueSchedule::none(),
            steps: Vec::new(),
        }
    }

    /// Sets the project.
    #[must_use]
    pub const fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, user: UserId) -> Self {
        self.assigned_to = Some(user);
        self
    }

    /// Restricts the task to `phases`; the whole catalog applies otherwise.
    #[must_use]
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = PhaseId>) -> Self {
        self.phases = Some(phases.into_iter().collect());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn with_schedule(mut self, schedule: DueSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Adds an initial checklist step.
    #[must_use]
    pub fn with_step(
        mut self,
        phase: PhaseId,
        title: impl Into<String>,
        estimate: Option<Effort>,
    ) -> Self {
        self.steps.push(InitialStep {
            phase,
            title: title.into(),
            estimate,
        });
        self
    }
}

/// A created task and its initial checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    /// The stored task.
    pub task: Task,
    /// Steps created with it, in request order.
    pub steps: Vec<TaskStep>,
}

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, S, D, N, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    D: MembershipDirectory,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    steps: Arc<S>,
    directory: Arc<D>,
    notifier: Notifier<N>,
    clock: Arc<C>,
    config: Arc<EngineConfig>,
}

impl<R, S, D, N, C> TaskLifecycleService<R, S, D, N, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    D: MembershipDirectory,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(
        tasks: Arc<R>,
        steps: Arc<S>,
        directory: Arc<D>,
        notifications: Arc<N>,
        clock: Arc<C>,
        config: Arc<EngineConfig>,
    ) -> Self {
        let notifier = Notifier::new(notifications, config.templates().clone());
        Self {
            tasks,
            steps,
            directory,
            notifier,
            clock,
            config,
        }
    }

    /// Creates a task with its initial checklist and notifies the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the creator is not a reviewer,
    /// the phase list or a step is invalid, or persistence fails.
    pub async fn create_task(
        &self,
        creator: UserId,
        request: CreateTaskRequest,
    ) -> WorkflowResult<CreatedTask> {
        let actor =
            resolve_actor(&*self.directory, request.org_id, creator, "create tasks").await?;
        actor.require_reviewer("create tasks")?;

        let active_phases = match request.phases {
            Some(phases) => ActivePhases::new(phases, self.config.catalog())?,
            None => self.config.catalog().all_active(),
        };
        let task = Task::new(
            NewTaskData {
                org_id: request.org_id,
                project_id: request.project_id,
                assigned_to: request.assigned_to,
                assigned_by: creator,
                details: request.details,
                active_phases,
                schedule: request.schedule,
            },
            &*self.clock,
        )?;

        let mut next_index: BTreeMap<PhaseId, u32> = BTreeMap::new();
        let mut steps = Vec::with_capacity(request.steps.len());
        for initial in request.steps {
            if !task.active_phases().contains(initial.phase) {
                return Err(TaskDomainError::PhaseNotActive {
                    task_id: task.id(),
                    phase: initial.phase,
                }
                .into());
            }
            let order_index = next_index.entry(initial.phase).or_insert(0);
            steps.push(TaskStep::new(
                NewStep {
                    task_id: task.id(),
                    phase: initial.phase,
                    title: initial.title,
                    estimated: initial
                        .estimate
                        .unwrap_or_else(|| self.config.default_step_effort()),
                    created_by: creator,
                    created_by_role: actor.role(),
                    order_index: *order_index,
                },
                &*self.clock,
            )?);
            *order_index = order_index.saturating_add(1);
        }

        self.tasks.store(&task).await?;
        for step in &steps {
            self.steps.store(step).await?;
        }
        info!(
            task_id = %task.id(),
            phases = task.active_phases().len(),
            steps = steps.len(),
            "task created"
        );

        self.notifier
            .send(task.assigned_to(), NotificationKind::TaskAssigned, &task, None)
            .await;
        Ok(CreatedTask { task, steps })
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::Repository`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> WorkflowResult<Option<Task>> {
        Ok(self.tasks.find_by_id(task_id).await?)
    }

    /// Lists the tasks assigned to `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::Repository`] when the lookup fails.
    pub async fn tasks_for(&self, user: UserId) -> WorkflowResult<Vec<Task>> {
        Ok(self.tasks.find_by_assignee(user).await?)
    }

    /// Archives an unfinished task.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the task is missing or closed,
    /// the actor is not a reviewer, or the write conflicts.
    pub async fn archive_task(&self, user: UserId, task_id: TaskId) -> WorkflowResult<Task> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor = resolve_actor(&*self.directory, task.org_id(), user, "archive tasks").await?;
        actor.require_reviewer("archive tasks")?;

        task.archive(&*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(task_id = %task_id, revision = %committed.revision(), "task archived");
        Ok(committed)
    }
}
