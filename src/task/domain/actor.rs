//! Authenticated actors and their organisation roles.

use super::{ParseEnumError, Task, TaskDomainError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Organisation role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works on assigned tasks and submits proof.
    Employee,
    /// Reviews the work of a team.
    TeamLead,
    /// Reviews and manages projects.
    Manager,
    /// Organisation-wide reviewer.
    Executive,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::TeamLead => "team_lead",
            Self::Manager => "manager",
            Self::Executive => "executive",
        }
    }

    /// Returns `true` for roles that may approve, reject and manage tasks.
    #[must_use]
    pub const fn is_reviewer(self) -> bool {
        matches!(self, Self::TeamLead | Self::Manager | Self::Executive)
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "team_lead" => Ok(Self::TeamLead),
            "manager" => Ok(Self::Manager),
            "executive" => Ok(Self::Executive),
            _ => Err(ParseEnumError::new("role", value)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user whose role was resolved server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    /// Creates an actor from a resolved role.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the resolved role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Requires a reviewer role.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] for non-reviewers.
    pub const fn require_reviewer(&self, action: &'static str) -> Result<(), TaskDomainError> {
        if self.role.is_reviewer() {
            Ok(())
        } else {
            Err(self.forbidden(action))
        }
    }

    /// Requires the actor to be the task's assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] for anyone else.
    pub fn require_assignee(&self, task: &Task, action: &'static str) -> Result<(), TaskDomainError> {
        if task.assigned_to() == Some(self.user_id) {
            Ok(())
        } else {
            Err(self.forbidden(action))
        }
    }

    /// Requires the actor to be the assignee or a reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Forbidden`] otherwise.
    pub fn require_assignee_or_reviewer(
        &self,
        task: &Task,
        action: &'static str,
    ) -> Result<(), TaskDomainError> {
        if self.role.is_reviewer() {
            return Ok(());
        }
        self.require_assignee(task, action)
    }

    const fn forbidden(&self, action: &'static str) -> TaskDomainError {
        TaskDomainError::Forbidden {
            user_id: self.user_id,
            action,
        }
    }
}
