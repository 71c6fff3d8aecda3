//! Store port for per-user aggregate counters.

use crate::stats::domain::{StatsDelta, UserStat};
use crate::task::domain::{GuildId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for stats store operations.
pub type StatsStoreResult<T> = Result<T, StatsStoreError>;

/// Stats persistence contract.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Adds `delta` to the counters of `(user, guild)`, creating the row with
    /// `delta` as its initial values when absent. Returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StatsStoreError::Persistence`] when the store fails.
    async fn apply_delta(
        &self,
        user: UserId,
        guild: GuildId,
        delta: StatsDelta,
        now: DateTime<Utc>,
    ) -> StatsStoreResult<UserStat>;

    /// Returns the counters for `(user, guild)`, or `None` before the first
    /// delta.
    async fn find(&self, user: UserId, guild: GuildId) -> StatsStoreResult<Option<UserStat>>;
}

/// Errors returned by stats store implementations.
#[derive(Debug, Clone, Error)]
pub enum StatsStoreError {
    /// The store could not be reached or rejected the operation.
    #[error("stats store unavailable: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StatsStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
