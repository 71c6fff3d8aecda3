//! In-memory integration tests for task lifecycle operations.

use super::helpers::{ASSIGNEE, ASSIGNER, GUILD, Harness};
use chrono::TimeDelta;
use eyre::{bail, ensure};
use rstest::rstest;
use taskwarden::task::{
    domain::{GuildId, TaskPriority, TaskStatus, UserId},
    services::{ChangeStatusRequest, CreateTaskRequest, TaskLifecycleError},
};

fn ids() -> eyre::Result<(UserId, GuildId)> {
    Ok((UserId::new(ASSIGNEE)?, GuildId::new(GUILD)?))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_is_immediately_listed() -> eyre::Result<()> {
    let h = Harness::new();
    let request = CreateTaskRequest::new(
        "Rotate API keys",
        ASSIGNEE,
        ASSIGNER,
        GUILD,
        h.now() + TimeDelta::hours(1),
    )
    .with_priority("high");
    let created = h.service.create_task(request).await?;

    let (user, guild) = ids()?;
    let listed = h.service.query_user_tasks(user, guild, None).await?;

    ensure!(listed.len() == 1, "expected one task, found {}", listed.len());
    let Some(task) = listed.first() else {
        bail!("listing was empty");
    };
    ensure!(task.id() == created.id());
    ensure!(task.status() == TaskStatus::Assigned);
    ensure!(task.priority() == TaskPriority::High);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_filter_and_guild_listing_agree() -> eyre::Result<()> {
    let h = Harness::new();
    let later = h.release_task(TimeDelta::days(3)).await?;
    let sooner = h.release_task(TimeDelta::days(1)).await?;
    h.service
        .change_status(ChangeStatusRequest::new(sooner.id(), "in_progress", ASSIGNEE))
        .await?;

    let (user, guild) = ids()?;
    let in_progress = h
        .service
        .query_user_tasks(user, guild, Some(TaskStatus::InProgress))
        .await?;
    let all = h.service.query_guild_tasks(guild, None).await?;

    ensure!(in_progress.iter().map(|t| t.id()).eq([sooner.id()]));
    ensure!(all.iter().map(|t| t.id()).eq([sooner.id(), later.id()]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_records_history_and_stats() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::days(1)).await?;

    for (status, actor) in [("in_progress", ASSIGNEE), ("stuck", ASSIGNEE), ("completed", ASSIGNER)] {
        h.clock.advance(TimeDelta::minutes(10));
        h.service
            .change_status(ChangeStatusRequest::new(task.id(), status, actor).with_note(status))
            .await?;
    }

    let history = h.service.task_history(task.id()).await?;
    let statuses: Vec<TaskStatus> = history.iter().map(|u| u.new_status()).collect();
    ensure!(statuses == [TaskStatus::InProgress, TaskStatus::Stuck, TaskStatus::Completed]);

    let (user, guild) = ids()?;
    let Some(stat) = h.service.user_stats(user, guild).await? else {
        bail!("completion should credit the assignee");
    };
    ensure!(stat.tasks_completed == 1 && stat.karma_points == 10);

    let reopen = h
        .service
        .change_status(ChangeStatusRequest::new(task.id(), "in_progress", ASSIGNEE))
        .await;
    ensure!(matches!(reopen, Err(TaskLifecycleError::InvalidTransition { .. })));
    ensure!(h.service.task_history(task.id()).await?.len() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_completions_credit_once() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::days(1)).await?;

    let attempts: Vec<_> = [ASSIGNEE, ASSIGNER, ASSIGNEE, ASSIGNER]
        .into_iter()
        .map(|actor| {
            let service = std::sync::Arc::clone(&h.service);
            let task_id = task.id();
            tokio::spawn(async move {
                service
                    .change_status(ChangeStatusRequest::new(task_id, "completed", actor))
                    .await
            })
        })
        .collect();
    let mut successes = 0;
    for attempt in attempts {
        match attempt.await? {
            Ok(_) => successes += 1,
            Err(TaskLifecycleError::InvalidTransition { .. }) => {}
            Err(other) => bail!("unexpected error: {other}"),
        }
    }

    ensure!(successes == 1, "exactly one completion should win, got {successes}");
    let (user, guild) = ids()?;
    let stat = h.service.user_stats(user, guild).await?;
    ensure!(stat.is_some_and(|s| s.tasks_completed == 1 && s.karma_points == 10));
    Ok(())
}
