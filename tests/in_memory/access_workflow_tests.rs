//! Locks, access requests, access reviews and the issue log.

use super::helpers::{Harness, harness};
use eyre::{OptionExt, ensure};
use phasegate::task::{
    domain::{
        AccessReviewAction, AccessStatus, DueSchedule, ErrorKind, IssueEntryKind, PhaseId,
        TaskDomainError, TaskStatus,
    },
    ports::NotificationKind,
    services::WorkflowError,
};
use rstest::rstest;

use PhaseId::{DesignGuidance as B, RequirementRefinement as A};

fn overdue() -> DueSchedule {
    DueSchedule::new("2026-03-09", Some("17:00".to_owned()))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approved_access_unlocks_an_overdue_task(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A, B], overdue()).await?;
    ensure!(harness.access.is_locked(&task));

    let requested = harness
        .access
        .request_access(harness.assignee, task.id(), "need 1 more day")
        .await?;
    ensure!(requested.access().access_requested);
    ensure!(requested.access().status == Some(AccessStatus::Pending));
    ensure!(harness.access.is_locked(&requested));

    let outcome = harness
        .access
        .process_access_review(harness.manager, task.id(), AccessReviewAction::Approve)
        .await?;

    ensure!(!harness.access.is_locked(&outcome.task));
    ensure!(outcome.task.access().is_approved() && !outcome.task.access().is_locked);
    ensure!(outcome.replacement.is_none());
    harness.submit(task.id(), &[], Some("caught up")).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn access_notifications_reach_both_sides(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    harness
        .access
        .request_access(harness.assignee, task.id(), "blocked on vendor")
        .await?;
    harness
        .access
        .process_access_review(harness.manager, task.id(), AccessReviewAction::Approve)
        .await?;

    let to_manager = harness.sink.delivered_to(harness.manager);
    ensure!(to_manager.iter().map(|n| n.kind).collect::<Vec<_>>() == [NotificationKind::AccessRequested]);
    let to_assignee: Vec<NotificationKind> = harness
        .sink
        .delivered_to(harness.assignee)
        .iter()
        .map(|n| n.kind)
        .collect();
    ensure!(to_assignee == [NotificationKind::TaskAssigned, NotificationKind::AccessApproved]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_access_reason_is_rejected(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .request_access(harness.assignee, task.id(), "   ")
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Validation));
    ensure!(harness.reload(task.id()).await? == task);
    ensure!(harness.sink.delivered_to(harness.manager).is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn close_after_request_locks_the_task_for_good(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A, B], overdue()).await?;
    harness
        .access
        .request_access(harness.assignee, task.id(), "need 1 more day")
        .await?;

    let outcome = harness
        .access
        .process_access_review(
            harness.manager,
            task.id(),
            AccessReviewAction::Close {
                reason: Some("missed deadline".to_owned()),
            },
        )
        .await?;

    let closed = outcome.task;
    ensure!(closed.status() == TaskStatus::Completed);
    ensure!(closed.closure().closed_by_manager);
    ensure!(closed.closure().closed_reason.as_deref() == Some("missed deadline"));
    ensure!(closed.access().is_locked);
    ensure!(closed.access().status == Some(AccessStatus::Rejected));

    let notice = harness
        .sink
        .delivered_to(harness.assignee)
        .into_iter()
        .find(|n| n.kind == NotificationKind::TaskClosed)
        .ok_or_eyre("closure notice missing")?;
    ensure!(notice.message == "Task closed by manager: Launch billing page. Reason: missed deadline");

    let after = harness.submit(task.id(), &[], Some("too late")).await;
    ensure!(after.err().map(|err| err.kind()) == Some(ErrorKind::InvalidState));
    Ok(())
}

#[rstest]
#[case::blank(Some("  ".to_owned()))]
#[case::missing(None)]
#[tokio::test(flavor = "multi_thread")]
async fn close_requires_a_reason(
    harness: Harness,
    #[case] reason: Option<String>,
) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .process_access_review(harness.manager, task.id(), AccessReviewAction::Close { reason })
        .await;

    ensure!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::EmptyField { field: "reason" }))
    ));
    ensure!(harness.reload(task.id()).await? == task);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_reviewers_decide_access(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .process_access_review(harness.assignee, task.id(), AccessReviewAction::Approve)
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_the_assignee_requests_access(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .request_access(harness.colleague, task.id(), "let me in")
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn locked_task_rejects_issue_reports(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], overdue()).await?;

    let result = harness
        .access
        .report_issue(harness.assignee, task.id(), "staging is down")
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Locked));
    ensure!(harness.reload(task.id()).await?.issues().entries().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn issues_are_reported_and_resolved(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&[A, B]).await?;

    let reported = harness
        .access
        .report_issue(harness.assignee, task.id(), "staging is down")
        .await?;
    ensure!(reported.issues().has_open_issue());

    let denied = harness
        .access
        .resolve_issues(harness.assignee, task.id(), "fixed it myself")
        .await;
    ensure!(denied.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));

    let resolved = harness
        .access
        .resolve_issues(harness.manager, task.id(), "restarted the cluster")
        .await?;
    let kinds: Vec<IssueEntryKind> = resolved.issues().entries().iter().map(|e| e.kind).collect();
    ensure!(kinds == [IssueEntryKind::Reported, IssueEntryKind::Resolved]);
    ensure!(!resolved.issues().has_open_issue());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_tasks_are_never_locked(harness: Harness) -> eyre::Result<()> {
    let task = harness.create_due(&[A], DueSchedule::new("2026-03-10", None)).await?;
    harness.submit(task.id(), &[], Some("done")).await?;
    harness.reviews.approve_phase(harness.manager, task.id(), A).await?;

    harness.clock.advance(chrono::Duration::days(3));

    ensure!(!harness.access.is_task_locked(task.id()).await?);
    Ok(())
}
