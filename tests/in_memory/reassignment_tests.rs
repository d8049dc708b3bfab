//! Reassignment closes the original task and hands a fresh copy over.

use super::helpers::{Harness, harness};
use eyre::{OptionExt, ensure};
use phasegate::task::{
    domain::{
        AccessReviewAction, DueSchedule, ErrorKind, PhaseId, REASSIGNED_REASON, SubState,
        TaskDomainError, TaskStatus,
    },
    ports::NotificationKind,
    services::WorkflowError,
};
use rstest::rstest;

use PhaseId::{BuildGuidance as C, DesignGuidance as B, RequirementRefinement as A};

fn overdue() -> DueSchedule {
    DueSchedule::new("2026-03-01", None)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassignment_copies_details_and_resets_workflow(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A, B, C], overdue()).await?;
    harness
        .access
        .process_access_review(harness.manager, task.id(), AccessReviewAction::Approve)
        .await?;
    harness.submit(task.id(), &["scope.pdf"], None).await?;

    let outcome = harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Reassign {
                target: Some(harness.colleague),
            },
        )
        .await?;
    let original = outcome.task;
    let fresh = outcome.replacement.ok_or_eyre("replacement missing")?;

    ensure!(original.status() == TaskStatus::Completed);
    ensure!(original.closure().closed_by_manager);
    ensure!(original.closure().closed_reason.as_deref() == Some(REASSIGNED_REASON));
    ensure!(original.closure().reassigned_to == Some(harness.colleague));
    ensure!(original.access().is_locked);

    ensure!(fresh.id() != original.id());
    ensure!(fresh.assigned_to() == Some(harness.colleague));
    ensure!(fresh.details() == original.details());
    ensure!(fresh.active_phases() == original.active_phases());
    ensure!(fresh.schedule() == original.schedule());
    ensure!(fresh.status() == TaskStatus::Pending);
    ensure!(fresh.lifecycle_state() == A);
    ensure!(fresh.sub_state() == SubState::PendingValidation);
    ensure!(fresh.phase_validations().is_empty());
    ensure!(fresh.closure().reassigned_from == Some(harness.assignee));
    ensure!(!harness.access.is_locked(&fresh), "replacement starts pre-approved");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassignment_persists_both_tasks_and_membership(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A, B], overdue()).await?;

    let outcome = harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Reassign {
                target: Some(harness.colleague),
            },
        )
        .await?;
    let fresh = outcome.replacement.ok_or_eyre("replacement missing")?;

    ensure!(harness.reload(task.id()).await? == outcome.task);
    ensure!(harness.reload(fresh.id()).await? == fresh);
    ensure!(harness.directory.is_project_member(harness.project, harness.colleague));
    let mine = harness.lifecycle.tasks_for(harness.colleague).await?;
    ensure!(mine.iter().map(|t| t.id()).collect::<Vec<_>>() == [fresh.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn both_assignees_are_told(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Reassign {
                target: Some(harness.colleague),
            },
        )
        .await?;

    let incoming = harness.sink.delivered_to(harness.colleague);
    ensure!(incoming.len() == 1);
    let notice = incoming.first().ok_or_eyre("no notice for new assignee")?;
    ensure!(notice.kind == NotificationKind::TaskReassigned);
    ensure!(notice.message == "You have been reassigned task: Launch billing page");

    let outgoing = harness
        .sink
        .delivered_to(harness.assignee)
        .into_iter()
        .find(|n| n.kind == NotificationKind::TaskReassignedAway)
        .ok_or_eyre("no notice for previous assignee")?;
    ensure!(
        outgoing.message
            == "Task \"Launch billing page\" has been reassigned to another team member."
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassignment_needs_a_target(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Reassign { target: None },
        )
        .await;

    ensure!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::MissingReassignTarget(id))) if id == task.id()
    ));
    ensure!(harness.reload(task.id()).await? == task);
    ensure!(!harness.directory.is_project_member(harness.project, harness.colleague));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_tasks_cannot_be_reassigned(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;
    harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Close {
                reason: Some("scope dropped".to_owned()),
            },
        )
        .await?;

    let result = harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Reassign {
                target: Some(harness.colleague),
            },
        )
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::InvalidState));
    ensure!(harness.lifecycle.tasks_for(harness.colleague).await?.is_empty());
    Ok(())
}
