//! Reminder and overdue scans driven against tasks created by the service.

use std::sync::Arc;

use super::helpers::{ASSIGNEE, GUILD, Harness, Service};
use crate::test_helpers::{RecordingNotifier, Sent};
use chrono::TimeDelta;
use eyre::{bail, ensure};
use rstest::rstest;
use taskwarden::stats::ports::StatsStore;
use taskwarden::task::{
    domain::{GuildId, TaskStatus, UserId},
    ports::TaskStore,
    services::ChangeStatusRequest,
};
use tokio::runtime::Handle;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reminder_is_selected_after_threshold_then_cleared() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::days(2)).await?;
    let threshold = TimeDelta::hours(17);

    ensure!(h.tasks.list_due_for_reminder(threshold, h.now()).await?.is_empty());

    h.clock.advance(TimeDelta::hours(18));
    let due = h.tasks.list_due_for_reminder(threshold, h.now()).await?;
    ensure!(due.iter().map(|t| t.id()).eq([task.id()]));

    let mark = h.tasks.mark_reminder_sent(task.id()).await?;
    ensure!(mark.newly_marked);
    ensure!(h.tasks.list_due_for_reminder(threshold, h.now()).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reminder_scan_notifies_each_task_once() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::days(2)).await?;
    h.clock.advance(TimeDelta::hours(18));

    h.scans.run_reminder_scan(h.now()).await?;
    h.clock.advance(TimeDelta::minutes(30));
    h.scans.run_reminder_scan(h.now()).await?;

    ensure!(h.notifier.sent() == [Sent::Reminder(task.id())]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overdue_scan_flags_and_penalises_open_task() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::minutes(1)).await?;
    h.clock.advance(TimeDelta::minutes(2));

    let overdue = h.tasks.list_overdue(h.now()).await?;
    ensure!(overdue.iter().map(|t| t.id()).eq([task.id()]));

    let report = h.scans.run_overdue_scan(h.now()).await?;
    ensure!(report.notified == 1);
    ensure!(h.notifier.sent() == [Sent::Overdue(task.id())]);
    ensure!(h.tasks.list_overdue(h.now()).await?.is_empty());

    let stat = h
        .stats
        .find(UserId::new(ASSIGNEE)?, GuildId::new(GUILD)?)
        .await?;
    ensure!(stat.is_some_and(|s| s.tasks_overdue == 1 && s.karma_points == -5));
    Ok(())
}

/// The assignee completes the task while its overdue notice is in flight.
/// The flag is still set, completion is credited, and no penalty applies.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_racing_overdue_notice_skips_penalty() -> eyre::Result<()> {
    let racing_service: Arc<std::sync::OnceLock<Arc<Service>>> = Arc::default();
    let hook_service = Arc::clone(&racing_service);
    let notifier = RecordingNotifier::new().with_overdue_hook(move |task| {
        if let Some(service) = hook_service.get() {
            let request = ChangeStatusRequest::new(task.id(), "completed", ASSIGNEE);
            let result = tokio::task::block_in_place(|| {
                Handle::current().block_on(service.change_status(request))
            });
            assert!(result.is_ok(), "racing completion failed: {result:?}");
        }
    });
    let h = Harness::with_scan_notifier(notifier);
    if racing_service.set(Arc::clone(&h.service)).is_err() {
        bail!("racing service already set");
    }

    let task = h.release_task(TimeDelta::minutes(1)).await?;
    h.clock.advance(TimeDelta::minutes(2));
    ensure!(h.tasks.list_overdue(h.now()).await?.len() == 1);

    h.scans.run_overdue_scan(h.now()).await?;

    let Some(current) = h.tasks.find_by_id(task.id()).await? else {
        bail!("task vanished");
    };
    ensure!(current.status() == TaskStatus::Completed);
    ensure!(current.deadline_notified());

    let Some(stat) = h
        .stats
        .find(UserId::new(ASSIGNEE)?, GuildId::new(GUILD)?)
        .await?
    else {
        bail!("completion should have created a stats row");
    };
    ensure!(stat.tasks_completed == 1);
    ensure!(stat.tasks_overdue == 0);
    ensure!(stat.karma_points == 10);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_before_scan_prevents_notice() -> eyre::Result<()> {
    let h = Harness::new();
    let task = h.release_task(TimeDelta::minutes(1)).await?;
    h.service
        .change_status(ChangeStatusRequest::new(task.id(), "completed", ASSIGNEE))
        .await?;
    h.clock.advance(TimeDelta::minutes(2));

    let report = h.scans.run_overdue_scan(h.now()).await?;

    ensure!(report.examined == 0);
    ensure!(h.notifier.sent().is_empty());
    Ok(())
}
