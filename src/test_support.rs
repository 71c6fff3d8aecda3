//! Clock and fixture helpers shared by unit tests.

use crate::notification::ports::{Notifier, NotifierResult};
use crate::stats::{
    domain::{StatsDelta, UserStat},
    ports::{StatsStore, StatsStoreResult},
};
use crate::task::domain::{
    DailySummary, GuildId, PersistedTaskData, Task, TaskId, TaskPriority, TaskStatus, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::Mutex;

/// Clock frozen at an instant that tests move explicitly.
#[derive(Debug)]
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("test clock lock");
        *now += delta;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("test clock lock")
    }
}

/// 2026-03-10 12:00:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("valid fixture instant")
}

pub fn user(value: u64) -> UserId {
    UserId::new(value).expect("valid user id")
}

pub fn guild(value: u64) -> GuildId {
    GuildId::new(value).expect("valid guild id")
}

/// Builds a stored task directly, bypassing creation-time validation.
pub fn persisted_task(
    guild_id: GuildId,
    created_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    status: TaskStatus,
) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: "Prepare release notes".to_owned(),
        description: String::new(),
        assigned_to: user(100),
        assigned_by: user(200),
        guild_id,
        deadline,
        created_at,
        status,
        priority: TaskPriority::Medium,
        reminder_sent: false,
        deadline_notified: false,
        completed_at: None,
    })
}

mockall::mock! {
    pub Notifier {}

    #[async_trait]
    impl Notifier for Notifier {
        async fn send_reminder(&self, task: &Task) -> NotifierResult<()>;
        async fn send_overdue(&self, task: &Task) -> NotifierResult<()>;
        async fn send_digest(&self, guild: GuildId, summary: &DailySummary) -> NotifierResult<()>;
        async fn notify_assignment(&self, task: &Task) -> NotifierResult<()>;
    }
}

mockall::mock! {
    pub StatsStore {}

    #[async_trait]
    impl StatsStore for StatsStore {
        async fn apply_delta(
            &self,
            user: UserId,
            guild: GuildId,
            delta: StatsDelta,
            now: DateTime<Utc>,
        ) -> StatsStoreResult<UserStat>;
        async fn find(&self, user: UserId, guild: GuildId) -> StatsStoreResult<Option<UserStat>>;
    }
}
