//! Ports for object storage, notifications and organisation membership.

use crate::task::domain::{ArtifactKey, ArtifactRef, OrgId, ProjectId, Role, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Object storage for proof artifacts.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns a stable reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStorageError`] when the object cannot be written.
    async fn put(
        &self,
        key: &ArtifactKey,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<ArtifactRef, ArtifactStorageError>;

    /// Deletes a stored object.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStorageError`] when the object cannot be removed.
    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), ArtifactStorageError>;
}

/// Errors returned by artifact stores.
#[derive(Debug, Clone, Error)]
pub enum ArtifactStorageError {
    /// The reference does not point into this store.
    #[error("artifact reference not recognised: {0}")]
    UnknownReference(ArtifactRef),

    /// The store rejected the key.
    #[error("invalid artifact key: {0}")]
    InvalidKey(String),

    /// Backend failure.
    #[error("artifact storage error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl ArtifactStorageError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned.
    TaskAssigned,
    /// An assignee asked for access to a locked task.
    AccessRequested,
    /// Access was granted.
    AccessApproved,
    /// A manager closed the task.
    TaskClosed,
    /// A task was handed to a new assignee.
    TaskReassigned,
    /// The previous assignee lost a reassigned task.
    TaskReassignedAway,
}

impl NotificationKind {
    /// Every notification kind.
    pub const ALL: [Self; 6] = [
        Self::TaskAssigned,
        Self::AccessRequested,
        Self::AccessApproved,
        Self::TaskClosed,
        Self::TaskReassigned,
        Self::TaskReassignedAway,
    ];
}

/// A rendered message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient.
    pub recipient: UserId,
    /// Category.
    pub kind: NotificationKind,
    /// Rendered text.
    pub message: String,
}

/// Fire-and-forget notification delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] on delivery failure. Callers log and
    /// discard it.
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Notification delivery failure.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub Arc<dyn std::error::Error + Send + Sync>);

impl NotificationError {
    /// Wraps a delivery error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Organisation and project membership lookups.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Returns the role of `user` in `org`, or `None` for non-members.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory is unavailable.
    async fn role_of(&self, org: OrgId, user: UserId) -> Result<Option<Role>, DirectoryError>;

    /// Adds `user` to `project` unless already a member.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory is unavailable.
    async fn ensure_member(&self, project: ProjectId, user: UserId) -> Result<(), DirectoryError>;
}

/// Membership directory failure.
#[derive(Debug, Clone, Error)]
#[error("membership directory error: {0}")]
pub struct DirectoryError(pub Arc<dyn std::error::Error + Send + Sync>);

impl DirectoryError {
    /// Wraps a directory error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
