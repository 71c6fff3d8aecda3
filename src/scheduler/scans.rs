//! Single passes of the reminder, overdue, and digest scans.

use super::ScheduleSettings;
use crate::notification::ports::Notifier;
use crate::stats::{domain::StatsDelta, ports::StatsStore};
use crate::task::{
    domain::{DigestWindow, GuildId, Task},
    ports::{TaskStore, TaskStoreError},
};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Identifies one of the three scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanKind {
    /// One-time reminder after the threshold elapses.
    Reminder,
    /// One-time notice once the deadline passes.
    Overdue,
    /// Daily per-guild digest.
    Digest,
}

impl ScanKind {
    /// Returns a stable lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Overdue => "overdue",
            Self::Digest => "digest",
        }
    }
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts describing one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidates returned by the store (tasks, or guilds for the digest).
    pub examined: usize,
    /// Notifications delivered.
    pub notified: usize,
    /// Candidates dropped after re-checking their current state.
    pub skipped: usize,
    /// Candidates whose delivery or bookkeeping failed.
    pub failed: usize,
}

/// A whole scan could not run. Per-candidate failures never surface here.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// The candidate query failed.
    #[error("{scan} scan could not query the task store: {source}")]
    Store {
        /// Scan that failed.
        scan: ScanKind,
        /// Underlying store error.
        #[source]
        source: TaskStoreError,
    },
}

enum Outcome {
    Notified,
    Skipped,
    Failed,
}

impl ScanReport {
    const fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Notified => self.notified += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// The three scans over shared stores and a notifier.
///
/// Passes of the same kind are serialised, so a manual trigger never
/// overlaps a timer tick. No store lock is held while the notifier runs.
pub struct Scans<S, T, N>
where
    S: TaskStore,
    T: StatsStore,
    N: Notifier,
{
    tasks: Arc<S>,
    stats: Arc<T>,
    notifier: Arc<N>,
    settings: ScheduleSettings,
    reminder_pass: Mutex<()>,
    overdue_pass: Mutex<()>,
    last_digest_date: Mutex<Option<NaiveDate>>,
}

impl<S, T, N> Scans<S, T, N>
where
    S: TaskStore,
    T: StatsStore,
    N: Notifier,
{
    /// Creates the scans.
    #[must_use]
    pub fn new(
        tasks: Arc<S>,
        stats: Arc<T>,
        notifier: Arc<N>,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            tasks,
            stats,
            notifier,
            settings,
            reminder_pass: Mutex::new(()),
            overdue_pass: Mutex::new(()),
            last_digest_date: Mutex::new(None),
        }
    }

    /// Returns the settings the scans run with.
    #[must_use]
    pub const fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Sends the one-time reminder for every task past the threshold.
    ///
    /// A task is marked only after its reminder was delivered, so a failed
    /// delivery is retried on the next pass.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Store`] when the candidate query fails.
    pub async fn run_reminder_scan(&self, now: DateTime<Utc>) -> Result<ScanReport, ScanError> {
        let _pass = self.reminder_pass.lock().await;
        let due = self
            .tasks
            .list_due_for_reminder(self.settings.reminder_threshold, now)
            .await
            .map_err(|source| ScanError::Store {
                scan: ScanKind::Reminder,
                source,
            })?;

        let mut report = ScanReport {
            examined: due.len(),
            ..ScanReport::default()
        };
        for task in &due {
            report.record(&self.remind(task, now).await);
        }
        log_report(ScanKind::Reminder, &report);
        Ok(report)
    }

    async fn remind(&self, listed: &Task, now: DateTime<Utc>) -> Outcome {
        let task_id = listed.id();
        let current = match self.tasks.find_by_id(task_id).await {
            Ok(Some(task)) if task.is_due_for_reminder(self.settings.reminder_threshold, now) => {
                task
            }
            Ok(_) => {
                debug!(task_id = %task_id, "task no longer due for a reminder");
                return Outcome::Skipped;
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "failed to re-check task before reminder");
                return Outcome::Failed;
            }
        };

        if let Err(err) = self.notifier.send_reminder(&current).await {
            warn!(task_id = %task_id, error = %err, "reminder delivery failed");
            return Outcome::Failed;
        }

        match self.tasks.mark_reminder_sent(task_id).await {
            Ok(mark) => {
                if !mark.newly_marked {
                    debug!(task_id = %task_id, "reminder marker was already set");
                }
                info!(task_id = %task_id, guild_id = %current.guild_id(), "reminder sent");
                Outcome::Notified
            }
            Err(err) => {
                error!(
                    task_id = %task_id,
                    error = %err,
                    "reminder delivered but not recorded; it may repeat"
                );
                Outcome::Failed
            }
        }
    }

    /// Flags every open task past its deadline and penalises the assignee.
    ///
    /// The task's status is re-read before notifying; tasks that became
    /// terminal are skipped. The flag is then set even when delivery fails,
    /// and the penalty is applied only by the call that set the flag and
    /// only while the task is still open.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Store`] when the candidate query fails.
    pub async fn run_overdue_scan(&self, now: DateTime<Utc>) -> Result<ScanReport, ScanError> {
        let _pass = self.overdue_pass.lock().await;
        let overdue = self
            .tasks
            .list_overdue(now)
            .await
            .map_err(|source| ScanError::Store {
                scan: ScanKind::Overdue,
                source,
            })?;

        let mut report = ScanReport {
            examined: overdue.len(),
            ..ScanReport::default()
        };
        for task in &overdue {
            report.record(&self.flag_overdue(task, now).await);
        }
        log_report(ScanKind::Overdue, &report);
        Ok(report)
    }

    async fn flag_overdue(&self, listed: &Task, now: DateTime<Utc>) -> Outcome {
        let task_id = listed.id();
        let current = match self.tasks.find_by_id(task_id).await {
            Ok(Some(task)) if task.is_awaiting_overdue_notice(now) => task,
            Ok(_) => {
                debug!(task_id = %task_id, "task closed or already flagged; skipping");
                return Outcome::Skipped;
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "failed to re-check task before overdue notice");
                return Outcome::Failed;
            }
        };

        let delivered = match self.notifier.send_overdue(&current).await {
            Ok(()) => true,
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "overdue notice delivery failed");
                false
            }
        };

        let mark = match self.tasks.mark_deadline_notified(task_id).await {
            Ok(mark) => mark,
            Err(err) => {
                error!(task_id = %task_id, error = %err, "failed to record overdue notice");
                return Outcome::Failed;
            }
        };

        if !mark.newly_marked {
            debug!(task_id = %task_id, "overdue marker was already set; no penalty");
        } else if mark.status.is_terminal() {
            info!(
                task_id = %task_id,
                status = %mark.status,
                "task closed while flagging overdue; no penalty"
            );
        } else if let Err(err) = self
            .stats
            .apply_delta(
                current.assigned_to(),
                current.guild_id(),
                StatsDelta::OVERDUE,
                now,
            )
            .await
        {
            // The marker is committed; no later pass retries the penalty.
            error!(
                task_id = %task_id,
                user_id = %current.assigned_to(),
                error = %err,
                "failed to apply overdue penalty; penalty dropped"
            );
            return Outcome::Failed;
        }

        if delivered {
            info!(task_id = %task_id, guild_id = %current.guild_id(), "overdue notice sent");
            Outcome::Notified
        } else {
            Outcome::Failed
        }
    }

    /// Sends each active guild its digest when `now` falls in the digest
    /// hour.
    ///
    /// Outside that hour, and after a digest already went out for the same
    /// local date in this process, the pass does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Store`] when listing active guilds fails.
    pub async fn run_digest(&self, now: DateTime<Utc>) -> Result<ScanReport, ScanError> {
        let mut last_sent = self.last_digest_date.lock().await;
        let local_hour = now.with_timezone(&self.settings.timezone).hour();
        if local_hour != self.settings.digest_hour {
            debug!(local_hour, "outside the digest hour");
            return Ok(ScanReport::default());
        }

        let window = DigestWindow::new(now, &self.settings.timezone);
        if *last_sent == Some(window.local_date()) {
            debug!(date = %window.local_date(), "digest already sent today");
            return Ok(ScanReport::default());
        }

        let guilds = self
            .tasks
            .list_active_guilds(&window)
            .await
            .map_err(|source| ScanError::Store {
                scan: ScanKind::Digest,
                source,
            })?;
        let mut report = ScanReport {
            examined: guilds.len(),
            ..ScanReport::default()
        };
        for guild in guilds {
            report.record(&self.deliver_digest(guild, &window).await);
        }
        *last_sent = Some(window.local_date());
        log_report(ScanKind::Digest, &report);
        Ok(report)
    }

    async fn deliver_digest(&self, guild: GuildId, window: &DigestWindow) -> Outcome {
        let summary = match self.tasks.daily_summary(guild, window).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(guild_id = %guild, error = %err, "failed to compute digest");
                return Outcome::Failed;
            }
        };
        match self.notifier.send_digest(guild, &summary).await {
            Ok(()) => Outcome::Notified,
            Err(err) => {
                warn!(guild_id = %guild, error = %err, "digest delivery failed");
                Outcome::Failed
            }
        }
    }
}

fn log_report(scan: ScanKind, report: &ScanReport) {
    info!(
        scan = scan.as_str(),
        examined = report.examined,
        notified = report.notified,
        skipped = report.skipped,
        failed = report.failed,
        "scan finished"
    );
}
