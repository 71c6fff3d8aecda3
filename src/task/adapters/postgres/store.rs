//! `PostgreSQL` task store.

use super::{
    models::{
        TaskRow, TaskUpdateRow, guild_from_db, row_to_task, row_to_update, status_from_db,
        to_db_id, to_task_row, to_update_row, user_from_db,
    },
    schema::{task_updates, tasks},
};
use crate::persistence::{PgPool, get_conn_with, run_blocking_with};
use crate::task::{
    domain::{
        DailySummary, DigestWindow, GuildId, RECENT_UPDATE_LIMIT, RecentUpdate, Task, TaskId,
        TaskStatus, TaskUpdate, UserId,
    },
    ports::{FlagMark, StatusChange, StatusWrite, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeSet;

/// `PostgreSQL`-backed task store.
///
/// Status writes and marker flips lock the task row (`SELECT … FOR UPDATE`)
/// inside a short transaction, so concurrent callers serialise per task.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: PgPool,
}

/// Which one-time marker a flip targets.
#[derive(Debug, Clone, Copy)]
enum Marker {
    Reminder,
    Deadline,
}

impl From<DieselError> for TaskStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking_with(
            move || {
                let mut connection = get_conn_with(&pool, TaskStoreError::persistence)?;
                f(&mut connection)
            },
            TaskStoreError::persistence,
        )
        .await
    }

    async fn mark(&self, id: TaskId, marker: Marker) -> TaskStoreResult<FlagMark> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskStoreError, _>(|tx| flip_marker(tx, id, marker))
        })
        .await
    }
}

fn flip_marker(tx: &mut PgConnection, id: TaskId, marker: Marker) -> TaskStoreResult<FlagMark> {
    let uuid = id.into_inner();
    let locked = match marker {
        Marker::Reminder => tasks::table
            .filter(tasks::id.eq(uuid))
            .select((tasks::status, tasks::reminder_sent))
            .for_update()
            .first::<(String, bool)>(tx)
            .optional()?,
        Marker::Deadline => tasks::table
            .filter(tasks::id.eq(uuid))
            .select((tasks::status, tasks::deadline_notified))
            .for_update()
            .first::<(String, bool)>(tx)
            .optional()?,
    };
    let (status, already_set) = locked.ok_or(TaskStoreError::NotFound(id))?;

    if !already_set {
        let target = tasks::table.filter(tasks::id.eq(uuid));
        match marker {
            Marker::Reminder => diesel::update(target)
                .set(tasks::reminder_sent.eq(true))
                .execute(tx)?,
            Marker::Deadline => diesel::update(target)
                .set(tasks::deadline_notified.eq(true))
                .execute(tx)?,
        };
    }

    Ok(FlagMark {
        newly_marked: !already_set,
        status: status_from_db(&status)?,
    })
}

fn apply_status_change(tx: &mut PgConnection, change: &StatusChange) -> TaskStoreResult<StatusWrite> {
    let uuid = change.task_id.into_inner();
    let row = tasks::table
        .filter(tasks::id.eq(uuid))
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(tx)
        .optional()?
        .ok_or(TaskStoreError::NotFound(change.task_id))?;

    let mut task = row_to_task(row)?;
    let current = task.status();
    if task.transition_to(change.new_status, change.at).is_err() {
        return Ok(StatusWrite::Rejected { current });
    }

    diesel::update(tasks::table.filter(tasks::id.eq(uuid)))
        .set((
            tasks::status.eq(task.status().as_str()),
            tasks::completed_at.eq(task.completed_at()),
        ))
        .execute(tx)?;

    let update = TaskUpdate::new(
        change.task_id,
        change.actor,
        change.new_status,
        change.note.clone(),
        change.at,
    );
    diesel::insert_into(task_updates::table)
        .values(&to_update_row(&update)?)
        .execute(tx)?;

    Ok(StatusWrite::Applied { task, update })
}

fn rows_to_tasks(rows: Vec<TaskRow>) -> TaskStoreResult<Vec<Task>> {
    rows.into_iter().map(row_to_task).collect()
}

fn to_count(total: i64) -> TaskStoreResult<u64> {
    u64::try_from(total).map_err(TaskStoreError::persistence)
}

fn summarise(
    connection: &mut PgConnection,
    guild: GuildId,
    window: &DigestWindow,
) -> TaskStoreResult<DailySummary> {
    let guild_db = to_db_id(guild.value())?;
    let terminal = TaskStatus::TERMINAL.map(TaskStatus::as_str);

    let assigned_today = to_count(
        tasks::table
            .filter(tasks::guild_id.eq(guild_db))
            .filter(tasks::created_at.ge(window.today_start()))
            .filter(tasks::created_at.lt(window.tomorrow_start()))
            .count()
            .get_result::<i64>(connection)?,
    )?;
    let due_tomorrow = to_count(
        tasks::table
            .filter(tasks::guild_id.eq(guild_db))
            .filter(tasks::status.ne_all(terminal))
            .filter(tasks::deadline.ge(window.tomorrow_start()))
            .filter(tasks::deadline.lt(window.day_after_start()))
            .count()
            .get_result::<i64>(connection)?,
    )?;
    let overdue_count = to_count(
        tasks::table
            .filter(tasks::guild_id.eq(guild_db))
            .filter(tasks::status.ne_all(terminal))
            .filter(tasks::deadline.le(window.now()))
            .count()
            .get_result::<i64>(connection)?,
    )?;

    let limit = i64::try_from(RECENT_UPDATE_LIMIT).map_err(TaskStoreError::persistence)?;
    let rows = task_updates::table
        .inner_join(tasks::table)
        .filter(tasks::guild_id.eq(guild_db))
        .filter(task_updates::created_at.ge(window.today_start()))
        .filter(task_updates::created_at.lt(window.tomorrow_start()))
        .order((task_updates::created_at.desc(), task_updates::id.asc()))
        .limit(limit)
        .select((TaskUpdateRow::as_select(), tasks::title, tasks::assigned_to))
        .load::<(TaskUpdateRow, String, i64)>(connection)?;

    let recent_updates = rows
        .into_iter()
        .map(|(row, title, assigned_to)| {
            let update = row_to_update(row)?;
            Ok(RecentUpdate {
                task_id: update.task_id(),
                title,
                assigned_to: user_from_db(assigned_to)?,
                status: update.new_status(),
                note: update.note().map(str::to_owned),
                created_at: update.created_at(),
            })
        })
        .collect::<TaskStoreResult<Vec<_>>>()?;

    Ok(DailySummary {
        guild_id: guild,
        date: window.local_date(),
        assigned_today,
        due_tomorrow,
        overdue_count,
        recent_updates,
    })
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    async fn create(&self, task: &Task) -> TaskStoreResult<()> {
        let task_id = task.id();
        let new_row = to_task_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskStoreError::DuplicateTask(task_id)
                    }
                    _ => TaskStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_user(
        &self,
        user: UserId,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        let user_db = to_db_id(user.value())?;
        let guild_db = to_db_id(guild.value())?;
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::assigned_to.eq(user_db))
                .filter(tasks::guild_id.eq(guild_db))
                .order((tasks::deadline.asc(), tasks::created_at.asc(), tasks::id.asc()))
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(tasks::status.eq(wanted.as_str()));
            }
            rows_to_tasks(query.load::<TaskRow>(connection)?)
        })
        .await
    }

    async fn list_by_guild(
        &self,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        let guild_db = to_db_id(guild.value())?;
        self.run_blocking(move |connection| {
            let mut query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::guild_id.eq(guild_db))
                .order((tasks::deadline.asc(), tasks::created_at.asc(), tasks::id.asc()))
                .into_boxed();
            if let Some(wanted) = status {
                query = query.filter(tasks::status.eq(wanted.as_str()));
            }
            rows_to_tasks(query.load::<TaskRow>(connection)?)
        })
        .await
    }

    async fn update_status(&self, change: &StatusChange) -> TaskStoreResult<StatusWrite> {
        let owned_change = change.clone();
        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TaskStoreError, _>(|tx| apply_status_change(tx, &owned_change))
        })
        .await
    }

    async fn list_updates(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskUpdate>> {
        self.run_blocking(move |connection| {
            let rows = task_updates::table
                .filter(task_updates::task_id.eq(task_id.into_inner()))
                .order((task_updates::created_at.asc(), task_updates::id.asc()))
                .select(TaskUpdateRow::as_select())
                .load::<TaskUpdateRow>(connection)?;
            rows.into_iter().map(row_to_update).collect()
        })
        .await
    }

    async fn list_due_for_reminder(
        &self,
        threshold: TimeDelta,
        now: DateTime<Utc>,
    ) -> TaskStoreResult<Vec<Task>> {
        let cutoff = now - threshold;
        self.run_blocking(move |connection| {
            let query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::reminder_sent.eq(false))
                .filter(tasks::status.eq_any(TaskStatus::REMINDABLE.map(TaskStatus::as_str)))
                .filter(tasks::created_at.le(cutoff))
                .order((tasks::deadline.asc(), tasks::created_at.asc(), tasks::id.asc()));
            rows_to_tasks(query.load::<TaskRow>(connection)?)
        })
        .await
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let query = tasks::table
                .select(TaskRow::as_select())
                .filter(tasks::deadline_notified.eq(false))
                .filter(tasks::status.ne_all(TaskStatus::TERMINAL.map(TaskStatus::as_str)))
                .filter(tasks::deadline.le(now))
                .order((tasks::deadline.asc(), tasks::created_at.asc(), tasks::id.asc()));
            rows_to_tasks(query.load::<TaskRow>(connection)?)
        })
        .await
    }

    async fn mark_reminder_sent(&self, id: TaskId) -> TaskStoreResult<FlagMark> {
        self.mark(id, Marker::Reminder).await
    }

    async fn mark_deadline_notified(&self, id: TaskId) -> TaskStoreResult<FlagMark> {
        self.mark(id, Marker::Deadline).await
    }

    async fn daily_summary(
        &self,
        guild: GuildId,
        window: &DigestWindow,
    ) -> TaskStoreResult<DailySummary> {
        let owned_window = *window;
        self.run_blocking(move |connection| summarise(connection, guild, &owned_window))
            .await
    }

    async fn list_active_guilds(&self, window: &DigestWindow) -> TaskStoreResult<Vec<GuildId>> {
        let owned_window = *window;
        self.run_blocking(move |connection| {
            let created_today = tasks::created_at
                .ge(owned_window.today_start())
                .and(tasks::created_at.lt(owned_window.tomorrow_start()));
            let mut guilds: BTreeSet<i64> = tasks::table
                .filter(
                    tasks::status
                        .ne_all(TaskStatus::TERMINAL.map(TaskStatus::as_str))
                        .or(created_today),
                )
                .select(tasks::guild_id)
                .distinct()
                .load::<i64>(connection)?
                .into_iter()
                .collect();
            let updated_today = task_updates::table
                .inner_join(tasks::table)
                .filter(task_updates::created_at.ge(owned_window.today_start()))
                .filter(task_updates::created_at.lt(owned_window.tomorrow_start()))
                .select(tasks::guild_id)
                .distinct()
                .load::<i64>(connection)?;
            guilds.extend(updated_today);
            guilds.into_iter().map(guild_from_db).collect()
        })
        .await
    }
}
