//! When steps for task status change BDD scenarios.

use super::world::{StatusChangeWorld, run_async};
use rstest_bdd_macros::when;
use taskwarden::task::services::ChangeStatusRequest;

#[when(r#"user {actor:u64} changes the task status to "{status}""#)]
fn change_status(
    world: &mut StatusChangeWorld,
    actor: u64,
    status: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .service
            .change_status(ChangeStatusRequest::new(task_id, status, actor)),
    );
    if let Ok(ref updated) = result {
        world.task = Some(updated.clone());
    }
    world.last_change = Some(result);
    Ok(())
}
