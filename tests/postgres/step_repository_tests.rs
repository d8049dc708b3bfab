//! Checklist steps and effort submissions stored in `PostgreSQL`.

use super::helpers::{TestDatabase, new_task};
use chrono::{TimeZone, Utc};
use diesel::prelude::*;
use eyre::{OptionExt, ensure};
use mockable::DefaultClock;
use phasegate::task::{
    domain::{
        Effort, NewStep, PhaseId, PointFeedback, Role, StepStatus, Submission, Task, TaskStep,
        UserId,
    },
    ports::{
        SubmissionRepository, TaskRepository, TaskStepRepository, TaskStepRepositoryError,
    },
};
use rstest::rstest;

use PhaseId::{DesignGuidance as B, RequirementRefinement as A};

fn step(task: &Task, phase: PhaseId, title: &str, index: u32) -> eyre::Result<TaskStep> {
    Ok(TaskStep::new(
        NewStep {
            task_id: task.id(),
            phase,
            title: title.to_owned(),
            estimated: Effort::from_hours(2),
            created_by: task.assigned_by(),
            created_by_role: Role::Manager,
            order_index: index,
        },
        &DefaultClock,
    )?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn steps_list_in_catalog_then_checklist_order() -> eyre::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let task = new_task(&[A, B], UserId::new())?;
    db.tasks().store(&task).await?;
    let repo = db.steps();

    let design = step(&task, B, "Sketch the schema", 0)?;
    let second = step(&task, A, "Confirm scope", 1)?;
    let first = step(&task, A, "Interview finance", 0)?;
    for item in [&design, &second, &first] {
        repo.store(item).await?;
    }

    let all = repo.list_for_task(task.id()).await?;
    let phase_a = repo.list_for_phase(task.id(), A).await?;

    let all_ids: Vec<_> = all.iter().map(TaskStep::id).collect();
    ensure!(all_ids == [first.id(), second.id(), design.id()]);
    ensure!(phase_a.iter().map(TaskStep::id).collect::<Vec<_>>() == [first.id(), second.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn step_updates_and_deletes_are_checked() -> eyre::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let task = new_task(&[A], UserId::new())?;
    db.tasks().store(&task).await?;
    let repo = db.steps();
    let mut item = step(&task, A, "Interview finance", 0)?;
    repo.store(&item).await?;

    item.skip("covered by last quarter's review", &DefaultClock)?;
    repo.update(&item).await?;
    let loaded = repo.find_by_id(item.id()).await?.ok_or_eyre("step missing")?;
    ensure!(loaded.status() == StepStatus::Skipped);
    ensure!(loaded.skipped_reason() == Some("covered by last quarter's review"));

    repo.delete(item.id()).await?;
    let again = repo.delete(item.id()).await;
    ensure!(matches!(again, Err(TaskStepRepositoryError::NotFound(id)) if id == item.id()));
    ensure!(repo.find_by_id(item.id()).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn effort_upsert_keeps_database_feedback() -> eyre::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let assignee = UserId::new();
    let task = new_task(&[A], assignee)?;
    db.tasks().store(&task).await?;
    let repo = db.submissions();
    let first_at = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).single().ok_or_eyre("bad time")?;
    let later_at = Utc.with_ymd_and_hms(2026, 3, 11, 9, 0, 0).single().ok_or_eyre("bad time")?;

    repo.upsert(&Submission::new(task.id(), assignee, Effort::from_hours(3), first_at))
        .await?;
    let pool = db.pool.clone();
    let (task_uuid, user_uuid) = (task.id().into_inner(), assignee.into_inner());
    tokio::task::spawn_blocking(move || -> eyre::Result<()> {
        let mut conn = pool.get()?;
        diesel::sql_query(concat!(
            "UPDATE task_submissions SET feedback = '{\"points\": 40}'::jsonb ",
            "WHERE task_id = $1 AND user_id = $2",
        ))
        .bind::<diesel::sql_types::Uuid, _>(task_uuid)
        .bind::<diesel::sql_types::Uuid, _>(user_uuid)
        .execute(&mut conn)?;
        Ok(())
    })
    .await??;

    let stored = repo
        .upsert(&Submission::new(task.id(), assignee, Effort::from_hours(5), later_at))
        .await?;

    ensure!(stored.actual_hours() == Effort::from_hours(5));
    ensure!(stored.submitted_at() == later_at);
    ensure!(
        stored.feedback()
            == Some(&PointFeedback {
                points: 40,
                summary: None,
            })
    );
    ensure!(repo.find(task.id(), assignee).await? == Some(stored));
    Ok(())
}
