//! `PostgreSQL` repositories for checklist steps and effort submissions.

use super::{
    TaskPgPool,
    conversion::{ConversionError, row_to_step, row_to_submission, step_to_row, submission_to_row},
    models::{SubmissionRow, TaskStepRow},
    schema::{task_steps, task_submissions},
};
use crate::task::{
    domain::{PhaseId, StepId, Submission, TaskId, TaskStep, UserId},
    ports::{
        SubmissionRepository, SubmissionRepositoryError, SubmissionRepositoryResult,
        TaskStepRepository, TaskStepRepositoryError, TaskStepRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;

/// `PostgreSQL`-backed checklist step repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskStepRepository {
    pool: TaskPgPool,
}

impl PostgresTaskStepRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStepRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStepRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStepRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStepRepositoryError::persistence)?
    }
}

fn step_failure(err: ConversionError) -> TaskStepRepositoryError {
    TaskStepRepositoryError::Persistence(err.into())
}

fn load_steps(rows: Vec<TaskStepRow>) -> TaskStepRepositoryResult<Vec<TaskStep>> {
    rows.into_iter()
        .map(|row| row_to_step(row).map_err(step_failure))
        .collect()
}

#[async_trait]
impl TaskStepRepository for PostgresTaskStepRepository {
    async fn store(&self, step: &TaskStep) -> TaskStepRepositoryResult<()> {
        let step_id = step.id();
        let row = step_to_row(step).map_err(step_failure)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(task_steps::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStepRepositoryError::DuplicateStep(step_id)
                    }
                    other => TaskStepRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, step: &TaskStep) -> TaskStepRepositoryResult<()> {
        let step_id = step.id();
        let row = step_to_row(step).map_err(step_failure)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(task_steps::table.find(step_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(TaskStepRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskStepRepositoryError::NotFound(step_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: StepId) -> TaskStepRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(task_steps::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TaskStepRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(TaskStepRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: StepId) -> TaskStepRepositoryResult<Option<TaskStep>> {
        self.run_blocking(move |connection| {
            let row = task_steps::table
                .find(id.into_inner())
                .select(TaskStepRow::as_select())
                .first::<TaskStepRow>(connection)
                .optional()
                .map_err(TaskStepRepositoryError::persistence)?;
            row.map(|found| row_to_step(found).map_err(step_failure))
                .transpose()
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> TaskStepRepositoryResult<Vec<TaskStep>> {
        let mut steps = self
            .run_blocking(move |connection| {
                let rows = task_steps::table
                    .filter(task_steps::task_id.eq(task_id.into_inner()))
                    .order((task_steps::order_index.asc(), task_steps::created_at.asc()))
                    .select(TaskStepRow::as_select())
                    .load::<TaskStepRow>(connection)
                    .map_err(TaskStepRepositoryError::persistence)?;
                load_steps(rows)
            })
            .await?;
        // Catalog order, not string order.
        steps.sort_by_key(|step| (step.phase(), step.order_index()));
        Ok(steps)
    }

    async fn list_for_phase(
        &self,
        task_id: TaskId,
        phase: PhaseId,
    ) -> TaskStepRepositoryResult<Vec<TaskStep>> {
        self.run_blocking(move |connection| {
            let rows = task_steps::table
                .filter(task_steps::task_id.eq(task_id.into_inner()))
                .filter(task_steps::phase.eq(phase.as_str()))
                .order((task_steps::order_index.asc(), task_steps::created_at.asc()))
                .select(TaskStepRow::as_select())
                .load::<TaskStepRow>(connection)
                .map_err(TaskStepRepositoryError::persistence)?;
            load_steps(rows)
        })
        .await
    }
}

/// `PostgreSQL`-backed submission repository.
///
/// Feedback is filled in by database-side scoring and read back after the
/// upsert.
#[derive(Debug, Clone)]
pub struct PostgresSubmissionRepository {
    pool: TaskPgPool,
}

impl PostgresSubmissionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SubmissionRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SubmissionRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SubmissionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SubmissionRepositoryError::persistence)?
    }
}

fn submission_failure(err: ConversionError) -> SubmissionRepositoryError {
    SubmissionRepositoryError::Persistence(err.into())
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn upsert(&self, submission: &Submission) -> SubmissionRepositoryResult<Submission> {
        let row = submission_to_row(submission).map_err(submission_failure)?;
        self.run_blocking(move |connection| {
            let stored = diesel::insert_into(task_submissions::table)
                .values(&row)
                .on_conflict((task_submissions::task_id, task_submissions::user_id))
                .do_update()
                .set((
                    task_submissions::actual_centihours
                        .eq(excluded(task_submissions::actual_centihours)),
                    task_submissions::submitted_at.eq(excluded(task_submissions::submitted_at)),
                ))
                .returning(SubmissionRow::as_returning())
                .get_result::<SubmissionRow>(connection)
                .map_err(SubmissionRepositoryError::persistence)?;
            row_to_submission(stored).map_err(submission_failure)
        })
        .await
    }

    async fn find(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> SubmissionRepositoryResult<Option<Submission>> {
        self.run_blocking(move |connection| {
            let row = task_submissions::table
                .find((task_id.into_inner(), user_id.into_inner()))
                .select(SubmissionRow::as_select())
                .first::<SubmissionRow>(connection)
                .optional()
                .map_err(SubmissionRepositoryError::persistence)?;
            row.map(|found| row_to_submission(found).map_err(submission_failure))
                .transpose()
        })
        .await
    }
}
