//! Conversions between domain aggregates and Diesel rows.

use super::models::{SubmissionRow, TaskRecord, TaskRow, TaskStepRow};
use crate::task::domain::{
    AccessState, ActivePhases, ClosureRecord, DueSchedule, Effort, IssueLog, OrgId,
    PersistedStepData, PersistedTaskData, PhaseId, PhaseValidations, PointFeedback, ProjectId,
    Revision, Role, StepId, StepStatus, SubState, Submission, Task, TaskDetails, TaskId,
    TaskStatus, TaskStep, UserId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error as StdError;

/// Boxed conversion failure.
pub(super) type ConversionError = Box<dyn StdError + Send + Sync>;

fn to_json<T: Serialize>(value: &T) -> Result<Value, ConversionError> {
    Ok(serde_json::to_value(value)?)
}

fn from_json<T: DeserializeOwned>(value: Value) -> Result<T, ConversionError> {
    Ok(serde_json::from_value(value)?)
}

/// Converts a task into the row written for `revision`.
pub(super) fn task_to_record(task: &Task, revision: Revision) -> Result<TaskRecord, ConversionError> {
    let active: Vec<PhaseId> = task.active_phases().iter().collect();
    Ok(TaskRecord {
        id: task.id().into_inner(),
        org_id: task.org_id().into_inner(),
        project_id: task.project_id().map(ProjectId::into_inner),
        assigned_to: task.assigned_to().map(UserId::into_inner),
        assigned_by: task.assigned_by().into_inner(),
        details: to_json(task.details())?,
        status: task.status().as_str().to_owned(),
        lifecycle_state: task.lifecycle_state().as_str().to_owned(),
        sub_state: task.sub_state().as_str().to_owned(),
        active_phases: to_json(&active)?,
        phase_validations: to_json(task.phase_validations())?,
        due_date: task.schedule().due_date().map(str::to_owned),
        due_time: task.schedule().due_time().map(str::to_owned),
        access: to_json(task.access())?,
        closure: to_json(task.closure())?,
        issues: to_json(task.issues())?,
        revision: i64::try_from(revision.value())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

/// Rebuilds a task from a stored row.
pub(super) fn row_to_task(row: TaskRow) -> Result<Task, ConversionError> {
    let TaskRow {
        id,
        org_id,
        project_id,
        assigned_to,
        assigned_by,
        details,
        status,
        lifecycle_state,
        sub_state,
        active_phases,
        phase_validations,
        due_date,
        due_time,
        access,
        closure,
        issues,
        revision,
        created_at,
        updated_at,
    } = row;

    let schedule = match due_date {
        Some(date) => DueSchedule::new(date, due_time),
        None => DueSchedule::none(),
    };
    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        org_id: OrgId::from_uuid(org_id),
        project_id: project_id.map(ProjectId::from_uuid),
        assigned_to: assigned_to.map(UserId::from_uuid),
        assigned_by: UserId::from_uuid(assigned_by),
        details: from_json::<TaskDetails>(details)?,
        status: TaskStatus::try_from(status.as_str())?,
        lifecycle_state: PhaseId::try_from(lifecycle_state.as_str())?,
        sub_state: SubState::try_from(sub_state.as_str())?,
        active_phases: ActivePhases::from_persisted(from_json::<Vec<PhaseId>>(active_phases)?)?,
        phase_validations: from_json::<PhaseValidations>(phase_validations)?,
        schedule,
        access: from_json::<AccessState>(access)?,
        closure: from_json::<ClosureRecord>(closure)?,
        issues: from_json::<IssueLog>(issues)?,
        revision: Revision::new(u64::try_from(revision)?),
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data)?)
}

/// Converts a step into its row.
pub(super) fn step_to_row(step: &TaskStep) -> Result<TaskStepRow, ConversionError> {
    Ok(TaskStepRow {
        id: step.id().into_inner(),
        task_id: step.task_id().into_inner(),
        phase: step.phase().as_str().to_owned(),
        title: step.title().to_owned(),
        estimated_centihours: i32::try_from(step.estimated().centihours())?,
        status: step.status().as_str().to_owned(),
        skipped_reason: step.skipped_reason().map(str::to_owned),
        created_by: step.created_by().into_inner(),
        created_by_role: step.created_by_role().as_str().to_owned(),
        order_index: i32::try_from(step.order_index())?,
        created_at: step.created_at(),
        updated_at: step.updated_at(),
    })
}

/// Rebuilds a step from its row.
pub(super) fn row_to_step(row: TaskStepRow) -> Result<TaskStep, ConversionError> {
    Ok(TaskStep::from_persisted(PersistedStepData {
        id: StepId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        phase: PhaseId::try_from(row.phase.as_str())?,
        title: row.title,
        estimated: Effort::from_centihours(u32::try_from(row.estimated_centihours)?),
        status: StepStatus::try_from(row.status.as_str())?,
        skipped_reason: row.skipped_reason,
        created_by: UserId::from_uuid(row.created_by),
        created_by_role: Role::try_from(row.created_by_role.as_str())?,
        order_index: u32::try_from(row.order_index)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a submission into its row; feedback is owned by the database.
pub(super) fn submission_to_row(submission: &Submission) -> Result<SubmissionRow, ConversionError> {
    Ok(SubmissionRow {
        task_id: submission.task_id().into_inner(),
        user_id: submission.user_id().into_inner(),
        actual_centihours: i32::try_from(submission.actual_hours().centihours())?,
        submitted_at: submission.submitted_at(),
        feedback: None,
    })
}

/// Rebuilds a submission from its row.
pub(super) fn row_to_submission(row: SubmissionRow) -> Result<Submission, ConversionError> {
    let submission = Submission::new(
        TaskId::from_uuid(row.task_id),
        UserId::from_uuid(row.user_id),
        Effort::from_centihours(u32::try_from(row.actual_centihours)?),
        row.submitted_at,
    );
    Ok(match row.feedback {
        Some(value) => submission.with_feedback(from_json::<PointFeedback>(value)?),
        None => submission,
    })
}
