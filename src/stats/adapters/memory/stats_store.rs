//! In-memory stats store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::stats::{
    domain::{StatsDelta, UserStat},
    ports::{StatsStore, StatsStoreError, StatsStoreResult},
};
use crate::task::domain::{GuildId, UserId};

/// Thread-safe in-memory stats store keyed by `(user, guild)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatsStore {
    rows: Arc<Mutex<HashMap<(UserId, GuildId), UserStat>>>,
}

impl InMemoryStatsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> StatsStoreError {
    StatsStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn apply_delta(
        &self,
        user: UserId,
        guild: GuildId,
        delta: StatsDelta,
        now: DateTime<Utc>,
    ) -> StatsStoreResult<UserStat> {
        let mut rows = self.rows.lock().map_err(poisoned)?;
        let row = rows
            .entry((user, guild))
            .and_modify(|existing| existing.apply(delta, now))
            .or_insert_with(|| UserStat::from_delta(user, guild, delta, now));
        Ok(row.clone())
    }

    async fn find(&self, user: UserId, guild: GuildId) -> StatsStoreResult<Option<UserStat>> {
        let rows = self.rows.lock().map_err(poisoned)?;
        Ok(rows.get(&(user, guild)).cloned())
    }
}
