//! Daily digest aggregation and once-per-day delivery.

use super::helpers::{ASSIGNEE, ASSIGNER, GUILD, Harness};
use crate::test_helpers::Sent;
use chrono::{TimeDelta, Timelike};
use eyre::{bail, ensure};
use rstest::rstest;
use taskwarden::task::{
    domain::{GuildId, TaskStatus},
    services::{ChangeStatusRequest, CreateTaskRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn digest_counts_today_tomorrow_and_overdue() -> eyre::Result<()> {
    let h = Harness::new();
    // 12:00 on the fixture day: one task due in an hour, one due tomorrow,
    // one due in a week.
    let soon = h.release_task(TimeDelta::hours(1)).await?;
    h.release_task(TimeDelta::hours(20)).await?;
    let later = h.release_task(TimeDelta::days(7)).await?;
    h.service
        .change_status(ChangeStatusRequest::new(later.id(), "in_progress", ASSIGNEE))
        .await?;

    h.clock.advance(TimeDelta::hours(9));
    let summary = h.service.get_digest(GuildId::new(GUILD)?).await?;

    ensure!(summary.assigned_today == 3);
    ensure!(summary.due_tomorrow == 1);
    ensure!(summary.overdue_count == 1);
    ensure!(summary.recent_updates.len() == 1);
    let Some(update) = summary.recent_updates.first() else {
        bail!("expected one recent update");
    };
    ensure!(update.task_id == later.id() && update.status == TaskStatus::InProgress);
    ensure!(update.title == "Publish release notes");
    ensure!(soon.deadline() < h.now());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduled_digest_reaches_each_active_guild_once() -> eyre::Result<()> {
    let h = Harness::new();
    h.release_task(TimeDelta::days(2)).await?;
    h.service
        .create_task(CreateTaskRequest::new(
            "Audit permissions",
            ASSIGNEE,
            ASSIGNER,
            GUILD + 1,
            h.now() + TimeDelta::days(2),
        ))
        .await?;

    h.clock.advance(TimeDelta::hours(9));
    ensure!(h.now().hour() == 21);
    let first = h.scans.run_digest(h.now()).await?;
    h.clock.advance(TimeDelta::minutes(30));
    let second = h.scans.run_digest(h.now()).await?;

    ensure!(first.notified == 2);
    ensure!(second.notified == 0);
    let digests: Vec<GuildId> = h
        .notifier
        .sent()
        .into_iter()
        .filter_map(|sent| match sent {
            Sent::Digest(guild, _) => Some(guild),
            _ => None,
        })
        .collect();
    ensure!(digests == [GuildId::new(GUILD)?, GuildId::new(GUILD + 1)?]);
    Ok(())
}
