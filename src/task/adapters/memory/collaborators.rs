//! In-memory artifact store, notification sink and membership directory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{ArtifactKey, ArtifactRef, OrgId, ProjectId, Role, UserId},
    ports::{
        ArtifactStorage, ArtifactStorageError, DirectoryError, MembershipDirectory, Notification,
        NotificationError, NotificationSink,
    },
};

const MEMORY_SCHEME: &str = "memory://";

/// Artifact store keeping objects in a map.
///
/// Uploads can be made to fail after a number of successes to exercise
/// compensating cleanup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStorage {
    state: Arc<RwLock<ArtifactState>>,
}

#[derive(Debug, Default)]
struct ArtifactState {
    objects: HashMap<String, Vec<u8>>,
    uploads_before_failure: Option<usize>,
    fail_deletes: bool,
}

impl InMemoryArtifactStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `successes` more uploads succeed, then fails every upload.
    pub fn fail_uploads_after(&self, successes: usize) {
        if let Ok(mut state) = self.state.write() {
            state.uploads_before_failure = Some(successes);
        }
    }

    /// Makes every subsequent delete fail.
    pub fn fail_deletes(&self) {
        if let Ok(mut state) = self.state.write() {
            state.fail_deletes = true;
        }
    }

    /// Returns `true` when `artifact` is currently stored.
    #[must_use]
    pub fn contains(&self, artifact: &ArtifactRef) -> bool {
        self.state.read().is_ok_and(|state| {
            artifact
                .as_str()
                .strip_prefix(MEMORY_SCHEME)
                .is_some_and(|key| state.objects.contains_key(key))
        })
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map_or(0, |state| state.objects.len())
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn storage_failure(message: &str) -> ArtifactStorageError {
    ArtifactStorageError::backend(std::io::Error::other(message.to_owned()))
}

#[async_trait]
impl ArtifactStorage for InMemoryArtifactStorage {
    async fn put(
        &self,
        key: &ArtifactKey,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> Result<ArtifactRef, ArtifactStorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| storage_failure(&err.to_string()))?;
        match state.uploads_before_failure {
            Some(0) => return Err(storage_failure("upload rejected")),
            Some(remaining) => state.uploads_before_failure = Some(remaining.saturating_sub(1)),
            None => {}
        }
        state.objects.insert(key.as_str().to_owned(), bytes.to_vec());
        Ok(ArtifactRef::new(format!("{MEMORY_SCHEME}{key}")))
    }

    async fn delete(&self, artifact: &ArtifactRef) -> Result<(), ArtifactStorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| storage_failure(&err.to_string()))?;
        if state.fail_deletes {
            return Err(storage_failure("delete rejected"));
        }
        let key = artifact
            .as_str()
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| ArtifactStorageError::UnknownReference(artifact.clone()))?;
        state.objects.remove(key);
        Ok(())
    }
}

/// Notification sink that records every delivered message.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationSink {
    state: Arc<RwLock<SinkState>>,
}

#[derive(Debug, Default)]
struct SinkState {
    delivered: Vec<Notification>,
    failing: bool,
}

impl RecordingNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that rejects every notification.
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        if let Ok(mut state) = sink.state.write() {
            state.failing = true;
        }
        sink
    }

    /// Returns the delivered notifications in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.state
            .read()
            .map(|state| state.delivered.clone())
            .unwrap_or_default()
    }

    /// Returns notifications delivered to `user`.
    #[must_use]
    pub fn delivered_to(&self, user: UserId) -> Vec<Notification> {
        self.delivered()
            .into_iter()
            .filter(|notification| notification.recipient == user)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut state = self
            .state
            .write()
            .map_err(|err| NotificationError::new(std::io::Error::other(err.to_string())))?;
        if state.failing {
            return Err(NotificationError::new(std::io::Error::other(
                "notification channel closed",
            )));
        }
        state.delivered.push(notification.clone());
        Ok(())
    }
}

/// Membership directory backed by maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembershipDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    roles: HashMap<(OrgId, UserId), Role>,
    projects: HashMap<ProjectId, HashSet<UserId>>,
}

impl InMemoryMembershipDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `role` to `user` in `org`.
    pub fn grant(&self, org: OrgId, user: UserId, role: Role) {
        if let Ok(mut state) = self.state.write() {
            state.roles.insert((org, user), role);
        }
    }

    /// Returns `true` when `user` belongs to `project`.
    #[must_use]
    pub fn is_project_member(&self, project: ProjectId, user: UserId) -> bool {
        self.state.read().is_ok_and(|state| {
            state
                .projects
                .get(&project)
                .is_some_and(|members| members.contains(&user))
        })
    }
}

fn directory_failure(err: impl ToString) -> DirectoryError {
    DirectoryError::new(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MembershipDirectory for InMemoryMembershipDirectory {
    async fn role_of(&self, org: OrgId, user: UserId) -> Result<Option<Role>, DirectoryError> {
        let state = self.state.read().map_err(directory_failure)?;
        Ok(state.roles.get(&(org, user)).copied())
    }

    async fn ensure_member(&self, project: ProjectId, user: UserId) -> Result<(), DirectoryError> {
        let mut state = self.state.write().map_err(directory_failure)?;
        state.projects.entry(project).or_default().insert(user);
        Ok(())
    }
}
