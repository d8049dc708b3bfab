//! `PostgreSQL` repository implementation for task aggregates.

use super::{
    TaskPgPool,
    conversion::{ConversionError, row_to_task, task_to_record},
    models::TaskRow,
    schema::tasks,
};
use crate::task::{
    domain::{Revision, Task, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn conversion_failure(err: ConversionError) -> TaskRepositoryError {
    TaskRepositoryError::Persistence(err.into())
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let record = task_to_record(task, task.revision()).map_err(conversion_failure)?;

        self.run_blocking(move |connection| insert_task(connection, task_id, &record))
            .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let committed = task.clone().with_revision(task.revision().next());
        let record = task_to_record(&committed, committed.revision()).map_err(conversion_failure)?;
        let task_id = task.id();
        let expected = task.revision();

        self.run_blocking(move |connection| {
            compare_and_swap(connection, task_id, expected, &record)
        })
        .await?;
        Ok(committed)
    }

    async fn commit_reassignment(
        &self,
        original: &Task,
        replacement: &Task,
    ) -> TaskRepositoryResult<Task> {
        let committed = original.clone().with_revision(original.revision().next());
        let original_record =
            task_to_record(&committed, committed.revision()).map_err(conversion_failure)?;
        let replacement_record =
            task_to_record(replacement, replacement.revision()).map_err(conversion_failure)?;
        let original_id = original.id();
        let replacement_id = replacement.id();
        let expected = original.revision();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                compare_and_swap(tx, original_id, expected, &original_record)?;
                insert_task(tx, replacement_id, &replacement_record)
            })
        })
        .await?;
        Ok(committed)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(|found| row_to_task(found).map_err(conversion_failure))
                .transpose()
        })
        .await
    }

    async fn find_by_assignee(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::assigned_to.eq(user.into_inner()))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(|row| row_to_task(row).map_err(conversion_failure))
                .collect()
        })
        .await
    }
}

fn insert_task(
    connection: &mut PgConnection,
    task_id: TaskId,
    record: &super::models::TaskRecord,
) -> TaskRepositoryResult<()> {
    diesel::insert_into(tasks::table)
        .values(record)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                TaskRepositoryError::DuplicateTask(task_id)
            }
            other => TaskRepositoryError::persistence(other),
        })?;
    Ok(())
}

/// Writes `record` only when the stored revision still equals `expected`.
fn compare_and_swap(
    connection: &mut PgConnection,
    task_id: TaskId,
    expected: Revision,
    record: &super::models::TaskRecord,
) -> TaskRepositoryResult<()> {
    let expected_value =
        i64::try_from(expected.value()).map_err(TaskRepositoryError::persistence)?;
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task_id.into_inner()))
            .filter(tasks::revision.eq(expected_value)),
    )
    .set(record)
    .execute(connection)?;

    if updated == 1 {
        return Ok(());
    }

    let stored: Option<i64> = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .select(tasks::revision)
        .first(connection)
        .optional()?;
    match stored {
        None => Err(TaskRepositoryError::NotFound(task_id)),
        Some(actual) => Err(TaskRepositoryError::RevisionConflict {
            task_id,
            expected,
            actual: Revision::new(u64::try_from(actual).unwrap_or_default()),
        }),
    }
}
