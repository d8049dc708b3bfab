//! Diesel row models for task review persistence.

use super::schema::{task_steps, task_submissions, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning organisation.
    pub org_id: uuid::Uuid,
    /// Optional project.
    pub project_id: Option<uuid::Uuid>,
    /// Current assignee.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assigning reviewer.
    pub assigned_by: uuid::Uuid,
    /// Descriptive fields as JSON.
    pub details: Value,
    /// Overall status.
    pub status: String,
    /// Current phase pointer.
    pub lifecycle_state: String,
    /// Review sub-state.
    pub sub_state: String,
    /// Active phases as a JSON array.
    pub active_phases: Value,
    /// Validation records as a JSON object keyed by phase.
    pub phase_validations: Value,
    /// Raw due date.
    pub due_date: Option<String>,
    /// Raw due time.
    pub due_time: Option<String>,
    /// Access state as JSON.
    pub access: Value,
    /// Closure lineage as JSON.
    pub closure: Value,
    /// Issue log as JSON.
    pub issues: Value,
    /// Stored revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning organisation.
    pub org_id: uuid::Uuid,
    /// Optional project.
    pub project_id: Option<uuid::Uuid>,
    /// Current assignee.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assigning reviewer.
    pub assigned_by: uuid::Uuid,
    /// Descriptive fields as JSON.
    pub details: Value,
    /// Overall status.
    pub status: String,
    /// Current phase pointer.
    pub lifecycle_state: String,
    /// Review sub-state.
    pub sub_state: String,
    /// Active phases as a JSON array.
    pub active_phases: Value,
    /// Validation records as a JSON object keyed by phase.
    pub phase_validations: Value,
    /// Raw due date.
    pub due_date: Option<String>,
    /// Raw due time.
    pub due_time: Option<String>,
    /// Access state as JSON.
    pub access: Value,
    /// Closure lineage as JSON.
    pub closure: Value,
    /// Issue log as JSON.
    pub issues: Value,
    /// Revision to write.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for checklist steps, used for reads and writes.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskStepRow {
    /// Step identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Gated phase.
    pub phase: String,
    /// Step title.
    pub title: String,
    /// Estimate in hundredths of an hour.
    pub estimated_centihours: i32,
    /// Completion state.
    pub status: String,
    /// Reason recorded on skip.
    pub skipped_reason: Option<String>,
    /// Creator.
    pub created_by: uuid::Uuid,
    /// Creator role at creation.
    pub created_by_role: String,
    /// Position within the phase.
    pub order_index: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for effort submissions.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubmissionRow {
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Submitter.
    pub user_id: uuid::Uuid,
    /// Reported effort in hundredths of an hour.
    pub actual_centihours: i32,
    /// Report timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Feedback populated by the database.
    pub feedback: Option<Value>,
}
