//! Per-phase checklist steps and the gate they impose on proof submission.

use super::{Effort, ParseEnumError, PhaseId, Role, StepId, Task, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion state of a checklist step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Work on the step is outstanding.
    Pending,
    /// The step is done.
    Completed,
    /// The step was deliberately skipped. Terminal.
    Skipped,
}

impl StepStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }
}

impl TryFrom<&str> for StepStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(ParseEnumError::new("step status", value)),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields required to create a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStep {
    /// Owning task.
    pub task_id: TaskId,
    /// Phase the step belongs to.
    pub phase: PhaseId,
    /// Step title, trimmed on creation.
    pub title: String,
    /// Estimated effort.
    pub estimated: Effort,
    /// Creator of the step.
    pub created_by: UserId,
    /// Role the creator held at creation.
    pub created_by_role: Role,
    /// Position within the phase's checklist.
    pub order_index: u32,
}

/// Parameter object for reconstructing a persisted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedStepData {
    /// Step identifier.
    pub id: StepId,
    /// Owning task.
    pub task_id: TaskId,
    /// Phase the step belongs to.
    pub phase: PhaseId,
    /// Step title.
    pub title: String,
    /// Estimated effort.
    pub estimated: Effort,
    /// Completion state.
    pub status: StepStatus,
    /// Reason recorded when skipped.
    pub skipped_reason: Option<String>,
    /// Creator of the step.
    pub created_by: UserId,
    /// Role the creator held at creation.
    pub created_by_role: Role,
    /// Position within the phase's checklist.
    pub order_index: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A checklist item scoped to one task and one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    id: StepId,
    task_id: TaskId,
    phase: PhaseId,
    title: String,
    estimated: Effort,
    status: StepStatus,
    skipped_reason: Option<String>,
    created_by: UserId,
    created_by_role: Role,
    order_index: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskStep {
    /// Creates a pending step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] when the title is blank.
    pub fn new(data: NewStep, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = non_empty(&data.title, "step title")?;
        let timestamp = clock.utc();
        Ok(Self {
            id: StepId::new(),
            task_id: data.task_id,
            phase: data.phase,
            title,
            estimated: data.estimated,
            status: StepStatus::Pending,
            skipped_reason: None,
            created_by: data.created_by,
            created_by_role: data.created_by_role,
            order_index: data.order_index,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a step from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedStepData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            phase: data.phase,
            title: data.title,
            estimated: data.estimated,
            status: data.status,
            skipped_reason: data.skipped_reason,
            created_by: data.created_by,
            created_by_role: data.created_by_role,
            order_index: data.order_index,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the step identifier.
    #[must_use]
    pub const fn id(&self) -> StepId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the phase the step gates.
    #[must_use]
    pub const fn phase(&self) -> PhaseId {
        self.phase
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the estimated effort.
    #[must_use]
    pub const fn estimated(&self) -> Effort {
        self.estimated
    }

    /// Returns the completion state.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Returns the skip reason, if skipped.
    #[must_use]
    pub fn skipped_reason(&self) -> Option<&str> {
        self.skipped_reason.as_deref()
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creator's role at creation.
    #[must_use]
    pub const fn created_by_role(&self) -> Role {
        self.created_by_role
    }

    /// Returns the checklist position.
    #[must_use]
    pub const fn order_index(&self) -> u32 {
        self.order_index
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Toggles between pending and completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StepSkipped`] for skipped steps.
    pub fn set_completed(&mut self, completed: bool, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_not_skipped()?;
        self.status = if completed {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        };
        self.touch(clock);
        Ok(())
    }

    /// Skips the step with a mandatory reason.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] for a blank reason and
    /// [`TaskDomainError::StepSkipped`] when already skipped.
    pub fn skip(&mut self, reason: &str, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let trimmed = non_empty(reason, "skip reason")?;
        self.ensure_not_skipped()?;
        self.status = StepStatus::Skipped;
        self.skipped_reason = Some(trimmed);
        self.touch(clock);
        Ok(())
    }

    /// Renames a pending step.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StepNotPending`] once the step left
    /// `pending`, or [`TaskDomainError::EmptyField`] for a blank title.
    pub fn rename(&mut self, title: &str, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status != StepStatus::Pending {
            return Err(TaskDomainError::StepNotPending(self.id));
        }
        self.title = non_empty(title, "step title")?;
        self.touch(clock);
        Ok(())
    }

    const fn ensure_not_skipped(&self) -> Result<(), TaskDomainError> {
        if matches!(self.status, StepStatus::Skipped) {
            return Err(TaskDomainError::StepSkipped(self.id));
        }
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Checklist readiness checks.
pub struct StepGate;

impl StepGate {
    /// Returns `true` when any step of the task's current phase is pending.
    ///
    /// Steps belonging to other tasks or phases are ignored.
    #[must_use]
    pub fn has_pending_steps(task: &Task, steps: &[TaskStep]) -> bool {
        Self::phase_has_pending_steps(task.id(), task.lifecycle_state(), steps)
    }

    /// Returns `true` when any step of `phase` on `task_id` is pending.
    #[must_use]
    pub fn phase_has_pending_steps(task_id: TaskId, phase: PhaseId, steps: &[TaskStep]) -> bool {
        steps.iter().any(|step| {
            step.task_id == task_id && step.phase == phase && step.status == StepStatus::Pending
        })
    }
}

/// Completed-versus-estimated effort over a set of steps.
///
/// Skipped steps count as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffortProgress {
    /// Effort of completed and skipped steps.
    pub done: Effort,
    /// Effort of all steps.
    pub total: Effort,
}

impl EffortProgress {
    /// Sums progress over `steps`.
    #[must_use]
    pub fn of<'a>(steps: impl IntoIterator<Item = &'a TaskStep>) -> Self {
        steps.into_iter().fold(Self::default(), |acc, step| Self {
            done: if step.status == StepStatus::Pending {
                acc.done
            } else {
                acc.done.saturating_add(step.estimated)
            },
            total: acc.total.saturating_add(step.estimated),
        })
    }

    /// Returns whole percent done, rounded down; 0 when nothing is estimated.
    #[must_use]
    pub fn percent(&self) -> u32 {
        let total = u64::from(self.total.centihours());
        if total == 0 {
            return 0;
        }
        let scaled = u64::from(self.done.centihours()).saturating_mul(100);
        u32::try_from(scaled.div_euclid(total)).unwrap_or(100)
    }
}

fn non_empty(value: &str, field: &'static str) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}
