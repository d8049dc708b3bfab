//! Then steps for access review BDD scenarios.

use super::world::{AccessWorld, run_async};
use phasegate::task::{
    domain::{Effort, ErrorKind, SubState, TaskStatus},
    services::ProofSubmission,
};
use rstest_bdd_macros::then;

#[then("the submission is rejected as locked")]
fn submission_rejected_as_locked(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_submission
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submission result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::Locked => Ok(()),
        other => Err(eyre::eyre!("expected a locked error, got {other:?}")),
    }
}

#[then("the task is locked")]
fn task_is_locked(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let task = world.reload()?.clone();
    if !world.access.is_locked(&task) {
        return Err(eyre::eyre!("expected task {} to be locked", task.id()));
    }
    Ok(())
}

#[then("the task is not locked")]
fn task_is_not_locked(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let task = world.reload()?.clone();
    if world.access.is_locked(&task) {
        return Err(eyre::eyre!("expected task {} to be unlocked", task.id()));
    }
    Ok(())
}

#[then(r#"the access status is "{status}""#)]
fn access_status_is(world: &mut AccessWorld, status: String) -> Result<(), eyre::Report> {
    let actual = world.reload()?.access().status.map(|value| value.as_str());
    if actual != Some(status.as_str()) {
        return Err(eyre::eyre!("expected access status {status}, found {actual:?}"));
    }
    Ok(())
}

#[then(r#"the assignee can submit proof "{text}""#)]
fn assignee_can_submit(world: &mut AccessWorld, text: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let request = ProofSubmission::new(task_id, world.assignee, Effort::from_hours(2)).with_text(text);
    let outcome = run_async(world.proofs.submit_proof(request))?;
    world.task = Some(outcome.task);
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &mut AccessWorld, status: String) -> Result<(), eyre::Report> {
    let actual = world.reload()?.status();
    if actual.as_str() != status {
        return Err(eyre::eyre!("expected status {status}, found {actual}"));
    }
    Ok(())
}

#[then(r#"the task was closed by a manager with reason "{reason}""#)]
fn closed_by_manager(world: &mut AccessWorld, reason: String) -> Result<(), eyre::Report> {
    let closure = world.reload()?.closure().clone();
    if !closure.closed_by_manager || closure.closed_reason.as_deref() != Some(reason.as_str()) {
        return Err(eyre::eyre!("unexpected closure record {closure:?}"));
    }
    Ok(())
}

#[then("the explicit lock is set")]
fn explicit_lock_is_set(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    if !world.reload()?.access().is_locked {
        return Err(eyre::eyre!("expected the explicit lock flag"));
    }
    Ok(())
}

#[then("the review fails with a validation error")]
fn review_fails_with_validation(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_review
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing review result"))?;
    match result {
        Err(err) if err.kind() == ErrorKind::Validation => Ok(()),
        other => Err(eyre::eyre!("expected a validation error, got {other:?}")),
    }
}

#[then("the colleague holds a fresh task on the first phase")]
fn colleague_holds_fresh_task(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let tasks = run_async(world.lifecycle.tasks_for(world.colleague))?;
    let [fresh] = tasks.as_slice() else {
        return Err(eyre::eyre!("expected one task for the colleague, found {}", tasks.len()));
    };
    let original = world.task()?;
    if fresh.status() != TaskStatus::Pending
        || fresh.lifecycle_state() != original.active_phases().first()
        || fresh.sub_state() != SubState::PendingValidation
        || fresh.details() != original.details()
        || !fresh.phase_validations().is_empty()
    {
        return Err(eyre::eyre!("replacement task not reset: {fresh:?}"));
    }
    if world.access.is_locked(fresh) {
        return Err(eyre::eyre!("replacement task should start unlocked"));
    }
    Ok(())
}
