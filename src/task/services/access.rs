//! Lock evaluation, access requests and access review decisions.

use super::{
    WorkflowResult,
    support::{Notifier, load_task, resolve_actor},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{AccessReviewAction, Task, TaskId, UserId},
    ports::{MembershipDirectory, NotificationKind, NotificationSink, TaskRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of an access review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReviewOutcome {
    /// The committed task the review acted on.
    pub task: Task,
    /// Task created for the new assignee on reassignment.
    pub replacement: Option<Task>,
}

/// Lock and access workflow service.
pub struct AccessWorkflowService<R, D, N, C>
where
    R: TaskRepository,
    D: MembershipDirectory,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    directory: Arc<D>,
    notifier: Notifier<N>,
    clock: Arc<C>,
    config: Arc<EngineConfig>,
}

impl<R, D, N, C> AccessWorkflowService<R, D, N, C>
where
    R: TaskRepository,
    D: MembershipDirectory,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a new access workflow service.
    #[must_use]
    pub fn new(
        tasks: Arc<R>,
        directory: Arc<D>,
        notifications: Arc<N>,
        clock: Arc<C>,
        config: Arc<EngineConfig>,
    ) -> Self {
        let notifier = Notifier::new(notifications, config.templates().clone());
        Self {
            tasks,
            directory,
            notifier,
            clock,
            config,
        }
    }

    /// Evaluates the effective lock of `task` now.
    #[must_use]
    pub fn is_locked(&self, task: &Task) -> bool {
        let locked = task.is_locked_at(self.clock.utc(), &self.config.lock_policy());
        debug!(
            task_id = %task.id(),
            locked,
            explicit = task.access().is_locked,
            "lock evaluated"
        );
        locked
    }

    /// Loads a task and evaluates its lock.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::TaskNotFound`] for unknown tasks.
    pub async fn is_task_locked(&self, task_id: TaskId) -> WorkflowResult<bool> {
        let task = load_task(&*self.tasks, task_id).await?;
        Ok(self.is_locked(&task))
    }

    /// Records the assignee's request for access and notifies the
    /// assigning reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] for a blank reason, a closed task,
    /// a requester other than the assignee or a conflicting write.
    pub async fn request_access(
        &self,
        requester: UserId,
        task_id: TaskId,
        reason: &str,
    ) -> WorkflowResult<Task> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor =
            resolve_actor(&*self.directory, task.org_id(), requester, "request access").await?;
        actor.require_assignee(&task, "request access")?;

        task.request_access(reason, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(task_id = %task_id, revision = %committed.revision(), "access requested");

        self.notifier
            .send(
                Some(committed.assigned_by()),
                NotificationKind::AccessRequested,
                &committed,
                committed.access().reason.as_deref(),
            )
            .await;
        Ok(committed)
    }

    /// Applies a reviewer's decision on a locked task.
    ///
    /// Missing close reasons and reassignment targets are rejected before
    /// anything is written. Reassignment ensures project membership for the
    /// target, then closes the original and stores the replacement in one
    /// atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the actor is not a reviewer,
    /// input is missing, the task is closed, the directory fails or another
    /// writer committed first.
    pub async fn process_access_review(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        action: AccessReviewAction,
    ) -> WorkflowResult<AccessReviewOutcome> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor =
            resolve_actor(&*self.directory, task.org_id(), reviewer, "review access").await?;
        actor.require_reviewer("review access")?;
        let action_name = action.as_str();

        let outcome = match action {
            AccessReviewAction::Approve => {
                task.approve_access(&*self.clock)?;
                let committed = self.tasks.update(&task).await?;
                self.notifier
                    .send(
                        committed.assigned_to(),
                        NotificationKind::AccessApproved,
                        &committed,
                        None,
                    )
                    .await;
                AccessReviewOutcome {
                    task: committed,
                    replacement: None,
                }
            }
            AccessReviewAction::Close { reason } => {
                task.close_by_manager(reason.as_deref(), &*self.clock)?;
                let committed = self.tasks.update(&task).await?;
                self.notifier
                    .send(
                        committed.assigned_to(),
                        NotificationKind::TaskClosed,
                        &committed,
                        committed.closure().closed_reason.as_deref(),
                    )
                    .await;
                AccessReviewOutcome {
                    task: committed,
                    replacement: None,
                }
            }
            AccessReviewAction::Reassign { target } => {
                let replacement = task.reassign(target, &*self.clock)?;
                if let (Some(project), Some(new_assignee)) =
                    (task.project_id(), replacement.assigned_to())
                {
                    self.directory.ensure_member(project, new_assignee).await?;
                }
                let committed = self.tasks.commit_reassignment(&task, &replacement).await?;
                info!(
                    task_id = %task_id,
                    replacement_id = %replacement.id(),
                    "reassignment committed"
                );
                self.notifier
                    .send(
                        replacement.assigned_to(),
                        NotificationKind::TaskReassigned,
                        &replacement,
                        None,
                    )
                    .await;
                self.notifier
                    .send(
                        committed.assigned_to(),
                        NotificationKind::TaskReassignedAway,
                        &committed,
                        None,
                    )
                    .await;
                AccessReviewOutcome {
                    task: committed,
                    replacement: Some(replacement),
                }
            }
        };

        info!(
            task_id = %task_id,
            action = action_name,
            status = %outcome.task.status(),
            revision = %outcome.task.revision(),
            "access reviewed"
        );
        Ok(outcome)
    }

    /// Appends an issue report from the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the task is locked or closed,
    /// the text is blank, the reporter is not the assignee or the write
    /// conflicts.
    pub async fn report_issue(
        &self,
        reporter: UserId,
        task_id: TaskId,
        text: &str,
    ) -> WorkflowResult<Task> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor =
            resolve_actor(&*self.directory, task.org_id(), reporter, "report issues").await?;
        actor.require_assignee(&task, "report issues")?;

        task.report_issue(reporter, text, self.clock.utc(), &self.config.lock_policy())?;
        let committed = self.tasks.update(&task).await?;
        info!(task_id = %task_id, revision = %committed.revision(), "issue reported");
        Ok(committed)
    }

    /// Appends a reviewer's resolution note to the issue log.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError`] when the note is blank, the task is
    /// closed, the actor is not a reviewer or the write conflicts.
    pub async fn resolve_issues(
        &self,
        reviewer: UserId,
        task_id: TaskId,
        note: &str,
    ) -> WorkflowResult<Task> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor =
            resolve_actor(&*self.directory, task.org_id(), reviewer, "resolve issues").await?;
        actor.require_reviewer("resolve issues")?;

        task.resolve_issues(reviewer, note, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        info!(task_id = %task_id, revision = %committed.revision(), "issues resolved");
        Ok(committed)
    }
}
