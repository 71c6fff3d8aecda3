//! Shared clock and notifier doubles for integration tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use taskwarden::notification::ports::{Notifier, NotifierResult};
use taskwarden::task::domain::{DailySummary, GuildId, Task, TaskId};

/// 2026-03-10 12:00:00 UTC.
#[must_use]
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("valid fixture instant")
}

/// Clock frozen at an instant that tests move explicitly.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    /// Creates a clock reading `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    /// Reminder for a task.
    Reminder(TaskId),
    /// Overdue notice for a task.
    Overdue(TaskId),
    /// Assignment announcement for a task.
    Assignment(TaskId),
    /// Digest for a guild.
    Digest(GuildId, DailySummary),
}

type OverdueHook = Arc<dyn Fn(&Task) + Send + Sync>;

/// Notifier that records every delivery in order.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    on_overdue: Option<OverdueHook>,
}

impl RecordingNotifier {
    /// Creates a notifier with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `hook` inside every overdue delivery, before it is recorded.
    #[must_use]
    pub fn with_overdue_hook(mut self, hook: impl Fn(&Task) + Send + Sync + 'static) -> Self {
        self.on_overdue = Some(Arc::new(hook));
        self
    }

    /// Returns every delivery so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, entry: Sent) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reminder(&self, task: &Task) -> NotifierResult<()> {
        self.record(Sent::Reminder(task.id()));
        Ok(())
    }

    async fn send_overdue(&self, task: &Task) -> NotifierResult<()> {
        if let Some(hook) = &self.on_overdue {
            hook(task);
        }
        self.record(Sent::Overdue(task.id()));
        Ok(())
    }

    async fn send_digest(&self, guild: GuildId, summary: &DailySummary) -> NotifierResult<()> {
        self.record(Sent::Digest(guild, summary.clone()));
        Ok(())
    }

    async fn notify_assignment(&self, task: &Task) -> NotifierResult<()> {
        self.record(Sent::Assignment(task.id()));
        Ok(())
    }
}
