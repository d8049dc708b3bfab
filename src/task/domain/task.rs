//! Task aggregate root: phase pointer, validations, lock and closure state.

use super::{
    AccessState, AccessStatus, ActivePhases, ArtifactRef, ClosureRecord, DueSchedule, Effort,
    IssueEntryKind, IssueLog, LockPolicy, OrgId, ParseEnumError, PhaseId, PhaseStatus,
    PhaseValidations, ProjectId, REASSIGNED_ACCESS_REASON, REASSIGNED_REASON, Revision,
    TaskDomainError, TaskId, UserId, validation::ArtifactRemoval,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, no proof submitted yet.
    Pending,
    /// Proof has been submitted for at least one phase.
    InProgress,
    /// Final phase approved, or closed by a manager.
    Completed,
    /// Withdrawn by a reviewer before completion.
    Archived,
    /// Cancelled outside the review workflow.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no further workflow transitions are valid.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Archived | Self::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("task status", value)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether any phase awaits a reviewer decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubState {
    /// The current phase is being worked on.
    InProgress,
    /// Proof is waiting for review.
    PendingValidation,
}

impl SubState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::PendingValidation => "pending_validation",
        }
    }
}

impl TryFrom<&str> for SubState {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_progress" => Ok(Self::InProgress),
            "pending_validation" => Ok(Self::PendingValidation),
            _ => Err(ParseEnumError::new("sub-state", value)),
        }
    }
}

impl fmt::Display for SubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields carried over on reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDetails {
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Hours allocated to the task.
    #[serde(default)]
    pub allocated_hours: Effort,
    /// Skills the work requires.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Free-form priority label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

impl TaskDetails {
    /// Creates details with a title and defaults elsewhere.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Fields required to create a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Owning organisation.
    pub org_id: OrgId,
    /// Optional project.
    pub project_id: Option<ProjectId>,
    /// Assignee, if any.
    pub assigned_to: Option<UserId>,
    /// Reviewer who assigned the task.
    pub assigned_by: UserId,
    /// Descriptive fields.
    pub details: TaskDetails,
    /// Phases the task must pass.
    pub active_phases: ActivePhases,
    /// Deadline.
    pub schedule: DueSchedule,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Owning organisation.
    pub org_id: OrgId,
    /// Optional project.
    pub project_id: Option<ProjectId>,
    /// Assignee, if any.
    pub assigned_to: Option<UserId>,
    /// Reviewer who assigned the task.
    pub assigned_by: UserId,
    /// Descriptive fields.
    pub details: TaskDetails,
    /// Overall status.
    pub status: TaskStatus,
    /// Current phase pointer.
    pub lifecycle_state: PhaseId,
    /// Review sub-state.
    pub sub_state: SubState,
    /// Phases the task must pass.
    pub active_phases: ActivePhases,
    /// Per-phase proof records.
    pub phase_validations: PhaseValidations,
    /// Deadline.
    pub schedule: DueSchedule,
    /// Lock and access request state.
    pub access: AccessState,
    /// Closure and reassignment lineage.
    pub closure: ClosureRecord,
    /// Issue history.
    pub issues: IssueLog,
    /// Optimistic concurrency revision.
    pub revision: Revision,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Pointer movement caused by a proof submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAdvance {
    /// Phase the proof was recorded against.
    pub submitted_phase: PhaseId,
    /// Pointer after the submission.
    pub next_phase: PhaseId,
}

impl PhaseAdvance {
    /// Returns `true` when the pointer moved.
    #[must_use]
    pub fn advanced(&self) -> bool {
        self.submitted_phase != self.next_phase
    }
}

/// Result of approving a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDecision {
    /// Approved phase.
    pub phase: PhaseId,
    /// Recomputed sub-state.
    pub sub_state: SubState,
    /// Whether the approval completed the task.
    pub task_completed: bool,
}

/// Computes the pointer after proof was recorded for `current`.
///
/// The scan covers the phases strictly between `current` and the final
/// phase and stops at the first one without proof. When every one of them
/// already carries proof the pointer lands on the final phase, which only a
/// reviewer approval can complete. A pointer already on the final phase
/// stays there.
#[must_use]
pub fn next_phase_after_submission(
    active: &ActivePhases,
    validations: &PhaseValidations,
    current: PhaseId,
) -> PhaseId {
    let phases = active.as_slice();
    let Some(index) = active.index_of(current) else {
        return current;
    };
    let last_index = phases.len().saturating_sub(1);
    if index >= last_index {
        return current;
    }
    phases
        .get(index.saturating_add(1)..last_index)
        .and_then(|intermediate| {
            intermediate
                .iter()
                .find(|phase| !validations.has_proof(**phase))
        })
        .copied()
        .unwrap_or_else(|| active.last())
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    org_id: OrgId,
    project_id: Option<ProjectId>,
    assigned_to: Option<UserId>,
    assigned_by: UserId,
    details: TaskDetails,
    status: TaskStatus,
    lifecycle_state: PhaseId,
    sub_state: SubState,
    active_phases: ActivePhases,
    phase_validations: PhaseValidations,
    schedule: DueSchedule,
    access: AccessState,
    closure: ClosureRecord,
    issues: IssueLog,
    revision: Revision,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task positioned on its first active phase.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] when the title is blank.
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let mut details = data.details;
        let title = details.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyField { field: "title" });
        }
        details.title = title.to_owned();

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            org_id: data.org_id,
            project_id: data.project_id,
            assigned_to: data.assigned_to,
            assigned_by: data.assigned_by,
            details,
            status: TaskStatus::Pending,
            lifecycle_state: data.active_phases.first(),
            sub_state: SubState::InProgress,
            active_phases: data.active_phases,
            phase_validations: PhaseValidations::new(),
            schedule: data.schedule,
            access: AccessState::default(),
            closure: ClosureRecord::default(),
            issues: IssueLog::default(),
            revision: Revision::INITIAL,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::PhaseNotActive`] when the stored pointer
    /// is not one of the stored active phases.
    pub fn from_persisted(data: PersistedTaskData) -> Result<Self, TaskDomainError> {
        if !data.active_phases.contains(data.lifecycle_state) {
            return Err(TaskDomainError::PhaseNotActive {
                task_id: data.id,
                phase: data.lifecycle_state,
            });
        }
        Ok(Self {
            id: data.id,
            org_id: data.org_id,
            project_id: data.project_id,
            assigned_to: data.assigned_to,
            assigned_by: data.assigned_by,
            details: data.details,
            status: data.status,
            lifecycle_state: data.lifecycle_state,
            sub_state: data.sub_state,
            active_phases: data.active_phases,
            phase_validations: data.phase_validations,
            schedule: data.schedule,
            access: data.access,
            closure: data.closure,
            issues: data.issues,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning organisation.
    #[must_use]
    pub const fn org_id(&self) -> OrgId {
        self.org_id
    }

    /// Returns the project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the assigning reviewer.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the overall status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the current phase pointer.
    #[must_use]
    pub const fn lifecycle_state(&self) -> PhaseId {
        self.lifecycle_state
    }

    /// Returns the review sub-state.
    #[must_use]
    pub const fn sub_state(&self) -> SubState {
        self.sub_state
    }

    /// Returns the active phases.
    #[must_use]
    pub const fn active_phases(&self) -> &ActivePhases {
        &self.active_phases
    }

    /// Returns the per-phase proof records.
    #[must_use]
    pub const fn phase_validations(&self) -> &PhaseValidations {
        &self.phase_validations
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn schedule(&self) -> &DueSchedule {
        &self.schedule
    }

    /// Returns the lock and access state.
    #[must_use]
    pub const fn access(&self) -> &AccessState {
        &self.access
    }

    /// Returns the closure lineage.
    #[must_use]
    pub const fn closure(&self) -> &ClosureRecord {
        &self.closure
    }

    /// Returns the issue log.
    #[must_use]
    pub const fn issues(&self) -> &IssueLog {
        &self.issues
    }

    /// Returns the revision this copy was read at.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy stamped with `revision`.
    ///
    /// Repository adapters call this after a successful write.
    #[must_use]
    pub const fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    /// Evaluates the effective lock at `now`.
    ///
    /// A task is locked when the explicit flag is set or the deadline has
    /// passed, unless it is completed or access was approved.
    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>, policy: &LockPolicy) -> bool {
        (self.access.is_locked || self.schedule.is_overdue(now, policy))
            && self.status != TaskStatus::Completed
            && !self.access.is_approved()
    }

    /// Fails when the task has reached a terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`].
    pub const fn ensure_open(&self) -> Result<(), TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::TaskClosed {
                task_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Fails when the task is effectively locked at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::Locked`].
    pub fn ensure_unlocked(
        &self,
        now: DateTime<Utc>,
        policy: &LockPolicy,
    ) -> Result<(), TaskDomainError> {
        if self.is_locked_at(now, policy) {
            return Err(TaskDomainError::Locked(self.id));
        }
        Ok(())
    }

    /// Records proof for the current phase and moves the pointer.
    ///
    /// Lock and checklist checks belong to the caller; this only enforces
    /// the aggregate's own invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`] for terminal tasks and
    /// [`TaskDomainError::EmptyProof`] when neither artifacts nor text are
    /// supplied.
    pub fn record_proof(
        &mut self,
        artifacts: Vec<ArtifactRef>,
        text: Option<&str>,
        clock: &impl Clock,
    ) -> Result<PhaseAdvance, TaskDomainError> {
        self.ensure_open()?;
        let has_text = text.is_some_and(|value| !value.trim().is_empty());
        if artifacts.is_empty() && !has_text {
            return Err(TaskDomainError::EmptyProof(self.id));
        }

        let now = clock.utc();
        let current = self.lifecycle_state;
        self.phase_validations
            .record_submission(current, artifacts, text, now);

        let next_phase =
            next_phase_after_submission(&self.active_phases, &self.phase_validations, current);
        self.lifecycle_state = next_phase;
        self.sub_state = if next_phase == current {
            SubState::PendingValidation
        } else {
            SubState::InProgress
        };
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::InProgress;
        }
        self.updated_at = now;

        Ok(PhaseAdvance {
            submitted_phase: current,
            next_phase,
        })
    }

    /// Approves proof for `phase`.
    ///
    /// Approving the final active phase completes the task. Approving the
    /// phase the pointer rests on moves the pointer forward.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`],
    /// [`TaskDomainError::PhaseNotActive`] or
    /// [`TaskDomainError::PhaseValidationNotFound`].
    pub fn approve_phase(
        &mut self,
        phase: PhaseId,
        clock: &impl Clock,
    ) -> Result<PhaseDecision, TaskDomainError> {
        self.ensure_reviewable(phase)?;
        let now = clock.utc();
        if !self.phase_validations.approve(phase, now) {
            return Err(self.missing_validation(phase));
        }

        self.sub_state = self.pending_sub_state_except(phase);
        let task_completed = self.active_phases.is_last(phase);
        if task_completed {
            self.status = TaskStatus::Completed;
        } else if phase == self.lifecycle_state {
            if let Some(next) = self.active_phases.next_after(phase) {
                self.lifecycle_state = next;
            }
        }
        self.updated_at = now;

        Ok(PhaseDecision {
            phase,
            sub_state: self.sub_state,
            task_completed,
        })
    }

    /// Rejects proof for `phase`, reopening it for resubmission.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`],
    /// [`TaskDomainError::PhaseNotActive`] or
    /// [`TaskDomainError::PhaseValidationNotFound`].
    pub fn reject_phase(&mut self, phase: PhaseId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_reviewable(phase)?;
        let now = clock.utc();
        if !self.phase_validations.reject(phase, now) {
            return Err(self.missing_validation(phase));
        }
        self.sub_state = SubState::InProgress;
        self.updated_at = now;
        Ok(())
    }

    /// Detaches an artifact from `phase`.
    ///
    /// When the phase loses its last proof the record is dropped. A dropped
    /// phase behind the pointer pulls the pointer back to it; otherwise the
    /// sub-state is recomputed from the remaining records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`] or
    /// [`TaskDomainError::ArtifactNotFound`].
    pub fn remove_artifact(
        &mut self,
        phase: PhaseId,
        artifact: &ArtifactRef,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        match self.phase_validations.remove_artifact(phase, artifact) {
            ArtifactRemoval::NotAttached => {
                return Err(TaskDomainError::ArtifactNotFound {
                    task_id: self.id,
                    phase,
                    artifact: artifact.clone(),
                });
            }
            ArtifactRemoval::Detached => {}
            ArtifactRemoval::RecordDropped => {
                let behind_pointer = self
                    .active_phases
                    .index_of(phase)
                    .zip(self.active_phases.index_of(self.lifecycle_state))
                    .is_some_and(|(dropped, pointer)| dropped < pointer);
                if behind_pointer {
                    self.lifecycle_state = phase;
                    self.sub_state = SubState::InProgress;
                } else {
                    self.sub_state = self.pending_sub_state();
                }
            }
        }
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Records an access request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`] or
    /// [`TaskDomainError::EmptyField`] for a blank reason.
    pub fn request_access(&mut self, reason: &str, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        let reason = required(reason, "reason")?;
        let now = clock.utc();
        self.access.access_requested = true;
        self.access.reason = Some(reason);
        self.access.status = Some(AccessStatus::Pending);
        self.access.requested_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Grants access and clears the explicit lock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`].
    pub fn approve_access(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        self.access.status = Some(AccessStatus::Approved);
        self.access.is_locked = false;
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Closes the task on behalf of a manager.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyField`] for a blank reason or
    /// [`TaskDomainError::TaskClosed`].
    pub fn close_by_manager(
        &mut self,
        reason: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let reason = required(reason.unwrap_or_default(), "reason")?;
        self.ensure_open()?;
        self.close_with(reason, clock.utc());
        Ok(())
    }

    /// Closes this task and returns a fresh copy for `target`.
    ///
    /// The replacement keeps the descriptive fields, active phases and
    /// deadline, restarts on the first active phase with no proof, and is
    /// pre-approved for access.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MissingReassignTarget`] without a target
    /// or [`TaskDomainError::TaskClosed`].
    pub fn reassign(
        &mut self,
        target: Option<UserId>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let target = target.ok_or(TaskDomainError::MissingReassignTarget(self.id))?;
        self.ensure_open()?;

        let now = clock.utc();
        self.close_with(REASSIGNED_REASON.to_owned(), now);
        self.closure.reassigned_to = Some(target);
        self.closure.reassigned_at = Some(now);

        Ok(Self {
            id: TaskId::new(),
            org_id: self.org_id,
            project_id: self.project_id,
            assigned_to: Some(target),
            assigned_by: self.assigned_by,
            details: self.details.clone(),
            status: TaskStatus::Pending,
            lifecycle_state: self.active_phases.first(),
            sub_state: SubState::PendingValidation,
            active_phases: self.active_phases.clone(),
            phase_validations: PhaseValidations::new(),
            schedule: self.schedule.clone(),
            access: AccessState::pre_approved(REASSIGNED_ACCESS_REASON),
            closure: ClosureRecord {
                reassigned_from: self.assigned_to,
                ..ClosureRecord::default()
            },
            issues: IssueLog::default(),
            revision: Revision::INITIAL,
            created_at: now,
            updated_at: now,
        })
    }

    /// Appends an issue report from the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`], [`TaskDomainError::Locked`]
    /// or [`TaskDomainError::EmptyField`].
    pub fn report_issue(
        &mut self,
        author: UserId,
        text: &str,
        now: DateTime<Utc>,
        policy: &LockPolicy,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        self.ensure_unlocked(now, policy)?;
        self.issues
            .append(IssueEntryKind::Reported, author, text, now)?;
        self.updated_at = now;
        Ok(())
    }

    /// Appends a resolution note.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`] or
    /// [`TaskDomainError::EmptyField`].
    pub fn resolve_issues(
        &mut self,
        author: UserId,
        note: &str,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        let now = clock.utc();
        self.issues
            .append(IssueEntryKind::Resolved, author, note, now)?;
        self.updated_at = now;
        Ok(())
    }

    /// Replaces the active phase list.
    ///
    /// A pointer that falls outside the new list moves to the first phase
    /// not yet approved, or to the final phase when all are approved. A list
    /// whose final phase is already approved completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`].
    pub fn replace_active_phases(
        &mut self,
        phases: ActivePhases,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        if !phases.contains(self.lifecycle_state) {
            self.lifecycle_state = phases
                .iter()
                .find(|phase| self.phase_validations.status_of(*phase) != PhaseStatus::Approved)
                .unwrap_or_else(|| phases.last());
        }
        self.active_phases = phases;
        self.sub_state = self.pending_sub_state();
        if self.phase_validations.status_of(self.active_phases.last()) == PhaseStatus::Approved {
            self.status = TaskStatus::Completed;
        }
        self.updated_at = clock.utc();
        Ok(())
    }

    /// Archives an unfinished task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskClosed`].
    pub fn archive(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        self.status = TaskStatus::Archived;
        self.updated_at = clock.utc();
        Ok(())
    }

    fn ensure_reviewable(&self, phase: PhaseId) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        if !self.active_phases.contains(phase) {
            return Err(TaskDomainError::PhaseNotActive {
                task_id: self.id,
                phase,
            });
        }
        Ok(())
    }

    const fn missing_validation(&self, phase: PhaseId) -> TaskDomainError {
        TaskDomainError::PhaseValidationNotFound {
            task_id: self.id,
            phase,
        }
    }

    fn pending_sub_state(&self) -> SubState {
        if self
            .active_phases
            .iter()
            .any(|phase| self.phase_validations.status_of(phase) == PhaseStatus::Pending)
        {
            SubState::PendingValidation
        } else {
            SubState::InProgress
        }
    }

    fn pending_sub_state_except(&self, phase: PhaseId) -> SubState {
        if self
            .phase_validations
            .any_pending_except(self.active_phases.as_slice(), phase)
        {
            SubState::PendingValidation
        } else {
            SubState::InProgress
        }
    }

    fn close_with(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.closure.closed_by_manager = true;
        self.closure.closed_reason = Some(reason);
        self.access.status = Some(AccessStatus::Rejected);
        self.access.is_locked = true;
        self.updated_at = now;
    }
}

fn required(value: &str, field: &'static str) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}
