//! Revision-checked persistence in the in-memory task repository.

use super::helpers::{Harness, harness};
use chrono::Duration;
use eyre::ensure;
use mockable::Clock;
use phasegate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{AccessReviewAction, LockPolicy, PhaseId, Revision},
    ports::{TaskRepository, TaskRepositoryError},
};
use rstest::rstest;

use PhaseId::{DesignGuidance as B, RequirementRefinement as A};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_write_bumps_the_revision(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A, B]).await?;
    ensure!(task.revision() == Revision::INITIAL);

    let submitted = harness.submit(task.id(), &[], Some("scope")).await?;
    let approved = harness.reviews.approve_phase(harness.manager, task.id(), A).await?;

    ensure!(submitted.task.revision() == Revision::new(1));
    ensure!(approved.task.revision() == Revision::new(2));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_writer_from_the_same_revision_conflicts(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A, B]).await?;
    let mut first = harness.reload(task.id()).await?;
    let mut second = first.clone();

    first.request_access("vendor outage", &*harness.clock)?;
    second.report_issue(
        harness.assignee,
        "vendor outage",
        harness.clock.utc(),
        &LockPolicy::default(),
    )?;
    harness.tasks.update(&first).await?;
    let result = harness.tasks.update(&second).await;

    ensure!(matches!(
        result,
        Err(TaskRepositoryError::RevisionConflict { expected, actual, .. })
            if expected == Revision::INITIAL && actual == Revision::new(1)
    ));
    let stored = harness.reload(task.id()).await?;
    ensure!(stored.access().access_requested);
    ensure!(stored.issues().entries().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_reassignment_commits_neither_task(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A, B]).await?;
    let mut stale = harness.reload(task.id()).await?;
    harness
        .access
        .process_access_review(harness.manager, task.id(), AccessReviewAction::Approve)
        .await?;

    let replacement = stale.reassign(Some(harness.colleague), &*harness.clock)?;
    let result = harness.tasks.commit_reassignment(&stale, &replacement).await;

    ensure!(matches!(result, Err(TaskRepositoryError::RevisionConflict { .. })));
    ensure!(harness.tasks.find_by_id(replacement.id()).await?.is_none());
    ensure!(harness.reload(task.id()).await?.status() != stale.status());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_an_unknown_task_is_not_found(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A]).await?;
    let elsewhere = InMemoryTaskRepository::new();

    let result = elsewhere.update(&task).await;

    ensure!(matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == task.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storing_twice_is_a_duplicate(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A]).await?;

    let result = harness.tasks.store(&task).await;

    ensure!(matches!(result, Err(TaskRepositoryError::DuplicateTask(_))));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignee_listing_is_newest_first(harness: Harness) -> eyre::Result<()> {
    let older = harness.create(&[A]).await?;
    harness.clock.advance(Duration::minutes(5));
    let newer = harness.create(&[B]).await?;

    let listed = harness.tasks.find_by_assignee(harness.assignee).await?;

    ensure!(listed.iter().map(|t| t.id()).collect::<Vec<_>>() == [newer.id(), older.id()]);
    Ok(())
}
