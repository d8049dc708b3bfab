//! Port contracts for the task review lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod collaborators;
pub mod repository;
pub mod steps;

pub use collaborators::{
    ArtifactStorage, ArtifactStorageError, DirectoryError, MembershipDirectory, Notification,
    NotificationError, NotificationKind, NotificationSink,
};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
pub use steps::{
    SubmissionRepository, SubmissionRepositoryError, SubmissionRepositoryResult,
    TaskStepRepository, TaskStepRepositoryError, TaskStepRepositoryResult,
};
