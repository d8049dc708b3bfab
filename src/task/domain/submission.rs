//! Self-reported effort per task and submitter.

use super::{Effort, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scoring feedback the submission store may attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFeedback {
    /// Points awarded for the submission.
    pub points: i64,
    /// Optional explanation shown to the submitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Latest self-reported effort of one submitter on one task.
///
/// There is at most one submission per `(task_id, user_id)`; storing a new
/// one replaces the previous value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    task_id: TaskId,
    user_id: UserId,
    actual_hours: Effort,
    submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback: Option<PointFeedback>,
}

impl Submission {
    /// Creates a submission without feedback.
    #[must_use]
    pub const fn new(
        task_id: TaskId,
        user_id: UserId,
        actual_hours: Effort,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            user_id,
            actual_hours,
            submitted_at,
            feedback: None,
        }
    }

    /// Attaches store-provided feedback.
    #[must_use]
    pub fn with_feedback(mut self, feedback: PointFeedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the submitter.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the reported effort.
    #[must_use]
    pub const fn actual_hours(&self) -> Effort {
        self.actual_hours
    }

    /// Returns when the effort was reported.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns feedback attached by the store.
    #[must_use]
    pub const fn feedback(&self) -> Option<&PointFeedback> {
        self.feedback.as_ref()
    }
}
