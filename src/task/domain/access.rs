//! Lock override, access request and manager closure state.

use super::{ParseEnumError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closure reason recorded on a task handed over to another assignee.
pub const REASSIGNED_REASON: &str = "Reassigned";

/// Access reason recorded on the replacement task created by reassignment.
pub const REASSIGNED_ACCESS_REASON: &str = "Reassigned by manager";

/// Decision state of an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    /// Awaiting a reviewer decision.
    Pending,
    /// Access was granted; the task is exempt from the overdue lock.
    Approved,
    /// Access was refused and the task closed.
    Rejected,
}

impl AccessStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for AccessStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::new("access status", value)),
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit lock flag plus the access request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessState {
    /// Explicit lock override, independent of the due date.
    #[serde(default)]
    pub is_locked: bool,
    /// Whether the assignee has asked for access.
    #[serde(default)]
    pub access_requested: bool,
    /// Reviewer decision on the latest request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccessStatus>,
    /// Free-text reason attached to the latest request or grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When access was last requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
}

impl AccessState {
    /// Access state of a replacement task: pre-approved and unlocked.
    #[must_use]
    pub fn pre_approved(reason: impl Into<String>) -> Self {
        Self {
            status: Some(AccessStatus::Approved),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Returns `true` when access has been granted.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == Some(AccessStatus::Approved)
    }
}

/// Manager closure and reassignment lineage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// Whether a reviewer closed the task through an access review.
    #[serde(default)]
    pub closed_by_manager: bool,
    /// Reason recorded at closure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
    /// Previous assignee when this task replaces a reassigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassigned_from: Option<UserId>,
    /// New assignee when this task was handed over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassigned_to: Option<UserId>,
    /// When the hand-over happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reassigned_at: Option<DateTime<Utc>>,
}

/// Reviewer decision on an access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessReviewAction {
    /// Grant access and lift the lock.
    Approve,
    /// Close the task permanently.
    Close {
        /// Mandatory closure reason.
        reason: Option<String>,
    },
    /// Close the task and hand a fresh copy to another user.
    Reassign {
        /// Mandatory new assignee.
        target: Option<UserId>,
    },
}

impl AccessReviewAction {
    /// Returns the canonical action name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Close { .. } => "close",
            Self::Reassign { .. } => "reassign",
        }
    }
}
