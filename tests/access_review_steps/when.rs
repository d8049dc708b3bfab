//! When steps for access review BDD scenarios.

use super::world::{AccessWorld, run_async};
use phasegate::task::{
    domain::{AccessReviewAction, Effort},
    services::ProofSubmission,
};
use rstest_bdd_macros::when;

fn review(world: &mut AccessWorld, action: AccessReviewAction) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .access
            .process_access_review(world.manager, task_id, action),
    );
    if let Ok(ref outcome) = result {
        world.task = Some(outcome.task.clone());
    }
    world.last_review = Some(result);
    Ok(())
}

#[when(r#"the assignee submits proof "{text}""#)]
fn assignee_submits(world: &mut AccessWorld, text: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let request = ProofSubmission::new(task_id, world.assignee, Effort::from_hours(1)).with_text(text);
    world.last_submission = Some(run_async(world.proofs.submit_proof(request)));
    Ok(())
}

#[when("the manager approves access")]
fn manager_approves(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    review(world, AccessReviewAction::Approve)
}

#[when(r#"the manager closes the task because "{reason}""#)]
fn manager_closes(world: &mut AccessWorld, reason: String) -> Result<(), eyre::Report> {
    review(
        world,
        AccessReviewAction::Close {
            reason: Some(reason),
        },
    )
}

#[when("the manager closes the task without a reason")]
fn manager_closes_without_reason(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    review(world, AccessReviewAction::Close { reason: None })
}

#[when("the manager reassigns the task to a colleague")]
fn manager_reassigns(world: &mut AccessWorld) -> Result<(), eyre::Report> {
    let target = Some(world.colleague);
    review(world, AccessReviewAction::Reassign { target })
}
