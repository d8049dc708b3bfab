//! Checklist management and the pending-steps gate on submission.

use super::helpers::{Harness, harness};
use eyre::ensure;
use phasegate::task::{
    domain::{Effort, ErrorKind, PhaseId, StepStatus, TaskDomainError},
    services::WorkflowError,
};
use rstest::rstest;

const PHASES: [PhaseId; 2] = [PhaseId::RequirementRefinement, PhaseId::DesignGuidance];

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pending_step_blocks_submission_until_done(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let step = harness
        .step_service
        .add_step(harness.assignee, task.id(), PhaseId::RequirementRefinement, "Draft scope", None)
        .await?;
    ensure!(harness.step_service.has_pending_steps(task.id()).await?);

    let blocked = harness.submit(task.id(), &[], Some("scope notes")).await;
    ensure!(matches!(
        blocked,
        Err(WorkflowError::Domain(TaskDomainError::PendingSteps { phase, .. }))
            if phase == PhaseId::RequirementRefinement
    ));
    ensure!(harness.storage.is_empty());
    ensure!(harness.reload(task.id()).await? == task);

    harness
        .step_service
        .toggle_step(harness.assignee, step.id(), true)
        .await?;
    ensure!(!harness.step_service.has_pending_steps(task.id()).await?);

    let outcome = harness.submit(task.id(), &[], Some("scope notes")).await?;
    ensure!(outcome.task.lifecycle_state() == PhaseId::DesignGuidance);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn skipped_steps_release_the_gate(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let step = harness
        .step_service
        .add_step(harness.manager, task.id(), PhaseId::RequirementRefinement, "Legal review", None)
        .await?;

    let skipped = harness
        .step_service
        .skip_step(harness.assignee, step.id(), "legal signed off last quarter")
        .await?;

    ensure!(skipped.status() == StepStatus::Skipped);
    ensure!(!harness.step_service.has_pending_steps(task.id()).await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn steps_in_later_phases_do_not_gate(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    harness
        .step_service
        .add_step(harness.assignee, task.id(), PhaseId::DesignGuidance, "Mock the UI", None)
        .await?;

    ensure!(!harness.step_service.has_pending_steps(task.id()).await?);
    harness.submit(task.id(), &["brief.md"], None).await?;
    ensure!(harness.step_service.has_pending_steps(task.id()).await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn steps_require_an_active_phase(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;

    let result = harness
        .step_service
        .add_step(harness.assignee, task.id(), PhaseId::Deployment, "Ship", None)
        .await;

    ensure!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::PhaseNotActive { .. }))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn outsiders_cannot_add_steps(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;

    let result = harness
        .step_service
        .add_step(harness.colleague, task.id(), PhaseId::DesignGuidance, "Sneak in", None)
        .await;

    ensure!(result.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_steps_append_and_use_the_default_estimate(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let phase = PhaseId::DesignGuidance;

    let first = harness
        .step_service
        .add_step(harness.assignee, task.id(), phase, "Wireframes", None)
        .await?;
    let second = harness
        .step_service
        .add_step(harness.assignee, task.id(), phase, "Copy review", Some(Effort::from_hours(2)))
        .await?;

    ensure!(first.order_index() == 0 && second.order_index() == 1);
    ensure!(first.estimated() == Effort::from_hours(2));
    let listed = harness.step_service.steps_for_phase(task.id(), phase).await?;
    ensure!(listed.iter().map(|step| step.id()).collect::<Vec<_>>() == vec![first.id(), second.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_creator_or_reviewer_renames(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let step = harness
        .step_service
        .add_step(harness.manager, task.id(), PhaseId::DesignGuidance, "Pick palette", None)
        .await?;

    let denied = harness
        .step_service
        .rename_step(harness.assignee, step.id(), "Pick colours")
        .await;
    ensure!(denied.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));

    let renamed = harness
        .step_service
        .rename_step(harness.manager, step.id(), "Pick colours")
        .await?;
    ensure!(renamed.title() == "Pick colours");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn employees_delete_only_their_pending_steps(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let own = harness
        .step_service
        .add_step(harness.assignee, task.id(), PhaseId::DesignGuidance, "Sketch", None)
        .await?;
    let managers = harness
        .step_service
        .add_step(harness.manager, task.id(), PhaseId::DesignGuidance, "Sign-off", None)
        .await?;
    harness
        .step_service
        .toggle_step(harness.assignee, own.id(), true)
        .await?;

    let completed = harness.step_service.delete_step(harness.assignee, own.id()).await;
    ensure!(matches!(
        completed,
        Err(WorkflowError::Domain(TaskDomainError::StepNotPending(_)))
    ));
    let foreign = harness
        .step_service
        .delete_step(harness.assignee, managers.id())
        .await;
    ensure!(foreign.err().map(|err| err.kind()) == Some(ErrorKind::Forbidden));

    harness.step_service.delete_step(harness.manager, own.id()).await?;
    let remaining = harness
        .step_service
        .steps_for_phase(task.id(), PhaseId::DesignGuidance)
        .await?;
    ensure!(remaining.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_steps_are_not_found(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let step = harness
        .step_service
        .add_step(harness.assignee, task.id(), PhaseId::DesignGuidance, "Temporary", None)
        .await?;
    harness.step_service.delete_step(harness.assignee, step.id()).await?;

    let result = harness
        .step_service
        .toggle_step(harness.assignee, step.id(), true)
        .await;

    ensure!(matches!(result, Err(WorkflowError::StepNotFound(id)) if id == step.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_weighs_steps_by_estimate(harness: Harness) -> eyre::Result<()> {
    let task = harness.create(&PHASES).await?;
    let done = harness
        .step_service
        .add_step(
            harness.assignee,
            task.id(),
            PhaseId::RequirementRefinement,
            "Collect metrics",
            Some(Effort::from_hours(3)),
        )
        .await?;
    harness
        .step_service
        .add_step(
            harness.assignee,
            task.id(),
            PhaseId::DesignGuidance,
            "Draft flows",
            Some(Effort::from_hours(1)),
        )
        .await?;
    harness
        .step_service
        .toggle_step(harness.assignee, done.id(), true)
        .await?;

    let phase = harness
        .step_service
        .progress(task.id(), Some(PhaseId::RequirementRefinement))
        .await?;
    let overall = harness.step_service.progress(task.id(), None).await?;

    ensure!(phase.percent() == 100);
    ensure!(overall.done == Effort::from_hours(3));
    ensure!(overall.total == Effort::from_hours(4));
    ensure!(overall.percent() == 75);
    Ok(())
}
