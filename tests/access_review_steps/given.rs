//! Given steps for access review BDD scenarios.

use super::world::{AccessWorld, run_async};
use eyre::WrapErr;
use phasegate::task::{
    domain::{DueSchedule, PhaseId, TaskDetails},
    services::CreateTaskRequest,
};
use rstest_bdd_macros::given;

#[given(r#"a task due on "{due_date}" assigned to an employee"#)]
fn task_due_on(world: &mut AccessWorld, due_date: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(world.org, TaskDetails::titled("Migrate invoices"))
        .with_project(world.project)
        .with_assignee(world.assignee)
        .with_phases([PhaseId::RequirementRefinement, PhaseId::BuildGuidance])
        .with_schedule(DueSchedule::new(due_date, None));
    let created = run_async(world.lifecycle.create_task(world.manager, request))
        .wrap_err("create task for access scenario")?;
    world.task = Some(created.task);
    Ok(())
}

#[given(r#"the assignee requested access because "{reason}""#)]
fn assignee_requested_access(world: &mut AccessWorld, reason: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let updated = run_async(world.access.request_access(world.assignee, task_id, &reason))
        .wrap_err("request access in scenario setup")?;
    world.task = Some(updated);
    Ok(())
}
