//! `PostgreSQL` stats store.

use super::schema::user_stats;
use crate::persistence::{PgPool, get_conn_with, run_blocking_with};
use crate::stats::{
    domain::{StatsDelta, UserStat},
    ports::{StatsStore, StatsStoreError, StatsStoreResult},
};
use crate::task::domain::{GuildId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Row model for `user_stats`, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_stats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserStatRow {
    user_id: i64,
    guild_id: i64,
    tasks_completed: i64,
    tasks_overdue: i64,
    karma_points: i64,
    last_updated: DateTime<Utc>,
}

/// `PostgreSQL`-backed stats store.
///
/// Deltas are applied with a single `INSERT … ON CONFLICT DO UPDATE`, so
/// concurrent writers to the same row never lose an increment.
#[derive(Debug, Clone)]
pub struct PostgresStatsStore {
    pool: PgPool,
}

impl PostgresStatsStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StatsStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StatsStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking_with(
            move || {
                let mut connection = get_conn_with(&pool, StatsStoreError::persistence)?;
                f(&mut connection)
            },
            StatsStoreError::persistence,
        )
        .await
    }
}

fn to_db_id(value: u64) -> StatsStoreResult<i64> {
    i64::try_from(value).map_err(StatsStoreError::persistence)
}

fn row_to_stat(row: UserStatRow) -> StatsStoreResult<UserStat> {
    let user = u64::try_from(row.user_id).map_err(StatsStoreError::persistence)?;
    let guild = u64::try_from(row.guild_id).map_err(StatsStoreError::persistence)?;
    Ok(UserStat {
        user_id: UserId::new(user).map_err(StatsStoreError::persistence)?,
        guild_id: GuildId::new(guild).map_err(StatsStoreError::persistence)?,
        tasks_completed: row.tasks_completed,
        tasks_overdue: row.tasks_overdue,
        karma_points: row.karma_points,
        last_updated: row.last_updated,
    })
}

#[async_trait]
impl StatsStore for PostgresStatsStore {
    async fn apply_delta(
        &self,
        user: UserId,
        guild: GuildId,
        delta: StatsDelta,
        now: DateTime<Utc>,
    ) -> StatsStoreResult<UserStat> {
        let initial = UserStatRow {
            user_id: to_db_id(user.value())?,
            guild_id: to_db_id(guild.value())?,
            tasks_completed: delta.completed,
            tasks_overdue: delta.overdue,
            karma_points: delta.karma,
            last_updated: now,
        };

        self.run_blocking(move |connection| {
            let row = diesel::insert_into(user_stats::table)
                .values(&initial)
                .on_conflict((user_stats::user_id, user_stats::guild_id))
                .do_update()
                .set((
                    user_stats::tasks_completed
                        .eq(user_stats::tasks_completed + excluded(user_stats::tasks_completed)),
                    user_stats::tasks_overdue
                        .eq(user_stats::tasks_overdue + excluded(user_stats::tasks_overdue)),
                    user_stats::karma_points
                        .eq(user_stats::karma_points + excluded(user_stats::karma_points)),
                    user_stats::last_updated.eq(excluded(user_stats::last_updated)),
                ))
                .returning(UserStatRow::as_returning())
                .get_result::<UserStatRow>(connection)
                .map_err(StatsStoreError::persistence)?;
            row_to_stat(row)
        })
        .await
    }

    async fn find(&self, user: UserId, guild: GuildId) -> StatsStoreResult<Option<UserStat>> {
        let user_db = to_db_id(user.value())?;
        let guild_db = to_db_id(guild.value())?;
        self.run_blocking(move |connection| {
            let row = user_stats::table
                .find((user_db, guild_db))
                .select(UserStatRow::as_select())
                .first::<UserStatRow>(connection)
                .optional()
                .map_err(StatsStoreError::persistence)?;
            row.map(row_to_stat).transpose()
        })
        .await
    }
}
