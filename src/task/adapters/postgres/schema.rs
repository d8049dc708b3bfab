//! Diesel schema for task review persistence.

diesel::table! {
    /// Task aggregates with embedded phase, lock and closure state.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning organisation.
        org_id -> Uuid,
        /// Optional project.
        project_id -> Nullable<Uuid>,
        /// Current assignee.
        assigned_to -> Nullable<Uuid>,
        /// Assigning reviewer.
        assigned_by -> Uuid,
        /// Descriptive fields.
        details -> Jsonb,
        /// Overall status.
        #[max_length = 32]
        status -> Varchar,
        /// Current phase pointer.
        #[max_length = 64]
        lifecycle_state -> Varchar,
        /// Review sub-state.
        #[max_length = 32]
        sub_state -> Varchar,
        /// Ordered active phase identifiers.
        active_phases -> Jsonb,
        /// Per-phase validation records.
        phase_validations -> Jsonb,
        /// Raw due date.
        #[max_length = 32]
        due_date -> Nullable<Varchar>,
        /// Raw due time.
        #[max_length = 32]
        due_time -> Nullable<Varchar>,
        /// Lock flag and access request state.
        access -> Jsonb,
        /// Closure and reassignment lineage.
        closure -> Jsonb,
        /// Issue log.
        issues -> Jsonb,
        /// Optimistic concurrency revision.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Checklist steps scoped to a task phase.
    task_steps (id) {
        /// Step identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Gated phase.
        #[max_length = 64]
        phase -> Varchar,
        /// Step title.
        title -> Text,
        /// Estimate in hundredths of an hour.
        estimated_centihours -> Int4,
        /// Completion state.
        #[max_length = 16]
        status -> Varchar,
        /// Reason recorded on skip.
        skipped_reason -> Nullable<Text>,
        /// Creator.
        created_by -> Uuid,
        /// Creator role at creation.
        #[max_length = 32]
        created_by_role -> Varchar,
        /// Position within the phase.
        order_index -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Latest self-reported effort per task and submitter.
    task_submissions (task_id, user_id) {
        /// Task identifier.
        task_id -> Uuid,
        /// Submitter.
        user_id -> Uuid,
        /// Reported effort in hundredths of an hour.
        actual_centihours -> Int4,
        /// Report timestamp.
        submitted_at -> Timestamptz,
        /// Feedback populated by database-side scoring.
        feedback -> Nullable<Jsonb>,
    }
}

diesel::joinable!(task_steps -> tasks (task_id));
diesel::joinable!(task_submissions -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_steps, task_submissions);
