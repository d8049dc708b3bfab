//! Domain model for the task review lifecycle.
//!
//! The task aggregate owns its phase pointer, per-phase validations, lock
//! and access state. Checklist steps and effort submissions reference a
//! task by identifier and live outside the aggregate.

mod access;
mod actor;
mod artifact;
mod effort;
mod error;
mod ids;
mod issue;
mod phase;
mod schedule;
mod step;
mod submission;
mod task;
mod validation;

pub use access::{
    AccessReviewAction, AccessState, AccessStatus, ClosureRecord, REASSIGNED_ACCESS_REASON,
    REASSIGNED_REASON,
};
pub use actor::{Actor, Role};
pub use artifact::{ArtifactKey, ArtifactUpload};
pub use effort::Effort;
pub use error::{ErrorKind, ParseEnumError, TaskDomainError};
pub use ids::{ArtifactRef, OrgId, ProjectId, Revision, StepId, TaskId, UserId};
pub use issue::{IssueEntry, IssueEntryKind, IssueLog};
pub use phase::{ActivePhases, PhaseCatalog, PhaseId};
pub use schedule::{DueSchedule, LockPolicy, parse_time_of_day};
pub use step::{EffortProgress, NewStep, PersistedStepData, StepGate, StepStatus, TaskStep};
pub use submission::{PointFeedback, Submission};
pub use task::{
    NewTaskData, PersistedTaskData, PhaseAdvance, PhaseDecision, SubState, Task, TaskDetails,
    TaskStatus, next_phase_after_submission,
};
pub use validation::{PROOF_TEXT_SEPARATOR, PhaseStatus, PhaseValidation, PhaseValidations};
