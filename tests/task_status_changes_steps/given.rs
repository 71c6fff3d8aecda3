//! Given steps for task status change BDD scenarios.

use super::world::{StatusChangeWorld, run_async};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskwarden::task::services::{ChangeStatusRequest, CreateTaskRequest};

use crate::test_helpers::fixed_instant;

#[given("a task assigned to user {assignee:u64} by user {assigner:u64} in guild {guild:u64}")]
fn task_assigned(
    world: &mut StatusChangeWorld,
    assignee: u64,
    assigner: u64,
    guild: u64,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(
        "Draft the quarterly roadmap",
        assignee,
        assigner,
        guild,
        fixed_instant() + TimeDelta::days(3),
    );
    let created = run_async(world.service.create_task(request))
        .wrap_err("create task for status change scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#"the task has been moved to "{status}" by user {actor:u64}"#)]
fn task_moved(
    world: &mut StatusChangeWorld,
    status: String,
    actor: u64,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let updated = run_async(
        world
            .service
            .change_status(ChangeStatusRequest::new(task_id, status, actor)),
    )
    .wrap_err("move task in scenario setup")?;
    world.task = Some(updated);
    Ok(())
}

