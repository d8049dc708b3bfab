//! Application services for the task review workflow.
//!
//! Each service takes the authenticated user, resolves their role through
//! the membership directory and checks permission before mutating state.
//! Every task write is revision-checked; a lost race surfaces as
//! [`WorkflowError::Concurrency`] and is never retried here.

mod access;
mod error;
mod lifecycle;
mod proof;
mod review;
mod steps;
mod support;

pub use access::{AccessReviewOutcome, AccessWorkflowService};
pub use error::{WorkflowError, WorkflowResult};
pub use lifecycle::{CreateTaskRequest, CreatedTask, InitialStep, TaskLifecycleService};
pub use proof::{ProofOutcome, ProofSubmission, ProofSubmissionService};
pub use review::{PhaseReviewService, ReviewOutcome};
pub use steps::StepService;
