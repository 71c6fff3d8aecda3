//! Then steps for task status change BDD scenarios.

use super::world::{StatusChangeWorld, run_async};
use rstest_bdd_macros::then;
use taskwarden::task::{
    domain::{GuildId, TaskDomainError, TaskStatus, UserId},
    services::TaskLifecycleError,
};

fn last_error(world: &StatusChangeWorld) -> Result<&TaskLifecycleError, eyre::Report> {
    match world.last_change.as_ref() {
        Some(Err(err)) => Ok(err),
        Some(Ok(task)) => Err(eyre::eyre!(
            "expected the change to fail, task is now {}",
            task.status()
        )),
        None => Err(eyre::eyre!("missing status change result")),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &StatusChangeWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let stored = run_async(world.service.get_task(task_id))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then("the task history length is {count:usize}")]
fn history_has(world: &StatusChangeWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let history = run_async(world.service.task_history(task_id))?;
    eyre::ensure!(
        history.len() == count,
        "expected {count} history entries, found {}",
        history.len()
    );
    Ok(())
}

#[then("the change is rejected as unauthorised")]
fn rejected_unauthorised(world: &StatusChangeWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    eyre::ensure!(
        matches!(err, TaskLifecycleError::Unauthorized { .. }),
        "expected unauthorised, got {err}"
    );
    Ok(())
}

#[then("the change is rejected as an invalid transition")]
fn rejected_invalid_transition(world: &StatusChangeWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    eyre::ensure!(
        matches!(err, TaskLifecycleError::InvalidTransition { .. }),
        "expected invalid transition, got {err}"
    );
    Ok(())
}

#[then("the change is rejected as invalid input")]
fn rejected_invalid_input(world: &StatusChangeWorld) -> Result<(), eyre::Report> {
    let err = last_error(world)?;
    eyre::ensure!(
        matches!(
            err,
            TaskLifecycleError::Validation(TaskDomainError::InvalidStatus(_))
        ),
        "expected invalid status, got {err}"
    );
    Ok(())
}

#[then(
    "user {user:u64} has {completed:i64} completed task and {karma:i64} karma points in guild {guild:u64}"
)]
fn user_has_stats(
    world: &StatusChangeWorld,
    user: u64,
    completed: i64,
    karma: i64,
    guild: u64,
) -> Result<(), eyre::Report> {
    let stat = run_async(
        world
            .service
            .user_stats(UserId::new(user)?, GuildId::new(guild)?),
    )?
    .ok_or_else(|| eyre::eyre!("no stats recorded for user {user}"))?;
    eyre::ensure!(
        stat.tasks_completed == completed && stat.karma_points == karma,
        "expected {completed} completed and {karma} karma, found {} and {}",
        stat.tasks_completed,
        stat.karma_points
    );
    Ok(())
}
