//! Lookups and notification delivery shared by the workflow services.

use super::{WorkflowError, WorkflowResult};
use crate::notify::{NotificationContext, NotificationTemplates};
use crate::task::{
    domain::{Actor, OrgId, Task, TaskDomainError, TaskId, UserId},
    ports::{MembershipDirectory, Notification, NotificationKind, NotificationSink, TaskRepository},
};
use std::sync::Arc;
use tracing::warn;

/// Loads a task or fails with [`WorkflowError::TaskNotFound`].
pub(super) async fn load_task<R>(repository: &R, task_id: TaskId) -> WorkflowResult<Task>
where
    R: TaskRepository + ?Sized,
{
    repository
        .find_by_id(task_id)
        .await?
        .ok_or(WorkflowError::TaskNotFound(task_id))
}

/// Resolves the role of `user` in `org`; non-members are refused `action`.
pub(super) async fn resolve_actor<D>(
    directory: &D,
    org: OrgId,
    user: UserId,
    action: &'static str,
) -> WorkflowResult<Actor>
where
    D: MembershipDirectory + ?Sized,
{
    let role = directory.role_of(org, user).await?.ok_or(TaskDomainError::Forbidden {
        user_id: user,
        action,
    })?;
    Ok(Actor::new(user, role))
}

/// Renders and delivers notifications, logging and discarding failures.
pub(super) struct Notifier<N> {
    sink: Arc<N>,
    templates: NotificationTemplates,
}

impl<N> Notifier<N>
where
    N: NotificationSink,
{
    pub(super) const fn new(sink: Arc<N>, templates: NotificationTemplates) -> Self {
        Self { sink, templates }
    }

    pub(super) async fn send(
        &self,
        recipient: Option<UserId>,
        kind: NotificationKind,
        task: &Task,
        reason: Option<&str>,
    ) {
        let Some(user) = recipient else {
            return;
        };
        let values = NotificationContext {
            title: &task.details().title,
            reason,
        };
        let message = match self.templates.render(kind, values) {
            Ok(message) => message,
            Err(err) => {
                warn!(task_id = %task.id(), ?kind, error = %err, "notification not rendered");
                return;
            }
        };
        let notification = Notification {
            recipient: user,
            kind,
            message,
        };
        if let Err(err) = self.sink.notify(&notification).await {
            warn!(
                task_id = %task.id(),
                recipient = %user,
                ?kind,
                error = %err,
                "notification delivery failed"
            );
        }
    }
}
