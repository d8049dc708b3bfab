//! In-memory adapter implementations for testing.
//!
//! These adapters provide simple, thread-safe implementations of every task
//! port, with switches for injecting storage, notification and submission
//! failures.

mod collaborators;
mod steps;
mod task;

pub use collaborators::{
    InMemoryArtifactStorage, InMemoryMembershipDirectory, RecordingNotificationSink,
};
pub use steps::{InMemorySubmissionRepository, InMemoryTaskStepRepository};
pub use task::InMemoryTaskRepository;
