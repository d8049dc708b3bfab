//! Error types for task domain validation and state transitions.

use super::{ArtifactRef, PhaseId, StepId, TaskId, TaskStatus, UserId};
use thiserror::Error;

/// Coarse classification of engine failures surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Required input is missing or malformed.
    Validation,
    /// The referenced task, phase record, step or artifact does not exist.
    NotFound,
    /// The operation is not valid in the current state.
    InvalidState,
    /// The task is overdue and locked against submission.
    Locked,
    /// A concurrent writer committed first.
    Concurrency,
    /// Artifact upload or deletion failed.
    Storage,
    /// The authenticated actor may not perform the operation.
    Forbidden,
    /// A persistence collaborator failed.
    Persistence,
}

/// Errors returned while validating or mutating task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A required free-text field is empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A proof submission carried neither artifacts nor text.
    #[error("proof submission for task {0} must include artifacts or text")]
    EmptyProof(TaskId),

    /// A reassignment was requested without a target user.
    #[error("reassignment of task {0} requires a target user")]
    MissingReassignTarget(TaskId),

    /// An unknown phase identifier was supplied.
    #[error("unknown phase identifier: {0}")]
    UnknownPhase(String),

    /// The phase catalog or an active phase list is malformed.
    #[error("invalid phase list: {0}")]
    InvalidPhaseList(String),

    /// The phase is not one of the task's active phases.
    #[error("phase {phase} is not active for task {task_id}")]
    PhaseNotActive {
        /// Task identifier.
        task_id: TaskId,
        /// Phase that was referenced.
        phase: PhaseId,
    },

    /// The effort value could not be parsed.
    #[error("invalid effort value '{0}', expected hours with at most two decimals")]
    InvalidEffort(String),

    /// The time-of-day value could not be parsed.
    #[error("invalid time of day '{0}'")]
    InvalidTimeOfDay(String),

    /// No validation record exists for the phase.
    #[error("no proof has been submitted for phase {phase} of task {task_id}")]
    PhaseValidationNotFound {
        /// Task identifier.
        task_id: TaskId,
        /// Phase without a validation record.
        phase: PhaseId,
    },

    /// The artifact is not attached to the phase.
    #[error("artifact {artifact} is not attached to phase {phase} of task {task_id}")]
    ArtifactNotFound {
        /// Task identifier.
        task_id: TaskId,
        /// Phase that was searched.
        phase: PhaseId,
        /// Missing artifact reference.
        artifact: ArtifactRef,
    },

    /// The task has reached a terminal status.
    #[error("task {task_id} is {status} and accepts no further transitions")]
    TaskClosed {
        /// Task identifier.
        task_id: TaskId,
        /// Terminal status the task is in.
        status: TaskStatus,
    },

    /// The current phase still has pending checklist steps.
    #[error("phase {phase} of task {task_id} has pending steps")]
    PendingSteps {
        /// Task identifier.
        task_id: TaskId,
        /// Gated phase.
        phase: PhaseId,
    },

    /// A skipped step cannot be toggled or edited.
    #[error("step {0} was skipped and can no longer change")]
    StepSkipped(StepId),

    /// The step is not pending and cannot be edited or deleted.
    #[error("step {0} is no longer pending")]
    StepNotPending(StepId),

    /// The task is overdue and locked.
    #[error("task {0} is locked; request access to continue")]
    Locked(TaskId),

    /// The actor lacks permission for the operation.
    #[error("user {user_id} is not permitted to {action}")]
    Forbidden {
        /// Authenticated user.
        user_id: UserId,
        /// Operation that was refused.
        action: &'static str,
    },
}

impl TaskDomainError {
    /// Classifies the error into the engine taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyField { .. }
            | Self::EmptyProof(_)
            | Self::MissingReassignTarget(_)
            | Self::UnknownPhase(_)
            | Self::InvalidPhaseList(_)
            | Self::PhaseNotActive { .. }
            | Self::InvalidEffort(_)
            | Self::InvalidTimeOfDay(_) => ErrorKind::Validation,
            Self::PhaseValidationNotFound { .. } | Self::ArtifactNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::TaskClosed { .. }
            | Self::PendingSteps { .. }
            | Self::StepSkipped(_)
            | Self::StepNotPending(_) => ErrorKind::InvalidState,
            Self::Locked(_) => ErrorKind::Locked,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }
}

/// Error returned while parsing enumerated values from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseEnumError {
    /// Creates a parse error for the given enumeration.
    #[must_use]
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
