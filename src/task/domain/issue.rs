//! Issue log attached to a task.

use super::{TaskDomainError, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an entry raises or resolves issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueEntryKind {
    /// The assignee reported a blocker.
    Reported,
    /// A reviewer resolved the outstanding issues.
    Resolved,
}

/// One timestamped entry in the issue log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEntry {
    /// Entry kind.
    pub kind: IssueEntryKind,
    /// Author of the entry.
    pub author: UserId,
    /// Trimmed entry text.
    pub text: String,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only issue history of a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueLog(Vec<IssueEntry>);

impl IssueLog {
    /// Returns entries oldest first.
    #[must_use]
    pub fn entries(&self) -> &[IssueEntry] {
        &self.0
    }

    /// Returns `true` when the latest entry is an unresolved report.
    #[must_use]
    pub fn has_open_issue(&self) -> bool {
        self.0
            .last()
            .is_some_and(|entry| entry.kind == IssueEntryKind::Reported)
    }

    pub(crate) fn append(
        &mut self,
        kind: IssueEntryKind,
        author: UserId,
        text: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyField { field: "issue" });
        }
        self.0.push(IssueEntry {
            kind,
            author,
            text: trimmed.to_owned(),
            recorded_at,
        });
        Ok(())
    }
}
