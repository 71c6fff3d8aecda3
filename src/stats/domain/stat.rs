//! Aggregate counters and the deltas applied to them.

use crate::task::domain::{GuildId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Additive change to a user's counters.
///
/// Deltas may be negative; the store never clamps the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDelta {
    /// Change to the completed-task counter.
    pub completed: i64,
    /// Change to the overdue-task counter.
    pub overdue: i64,
    /// Change to karma.
    pub karma: i64,
}

impl StatsDelta {
    /// Delta applied when a task enters `completed`.
    pub const COMPLETION: Self = Self {
        completed: 1,
        overdue: 0,
        karma: 10,
    };

    /// Delta applied when the overdue scan flags a task.
    pub const OVERDUE: Self = Self {
        completed: 0,
        overdue: 1,
        karma: -5,
    };
}

/// Counters accumulated for one user in one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    /// User the counters belong to.
    pub user_id: UserId,
    /// Guild scope.
    pub guild_id: GuildId,
    /// Tasks completed.
    pub tasks_completed: i64,
    /// Tasks flagged overdue.
    pub tasks_overdue: i64,
    /// Karma balance; may be negative.
    pub karma_points: i64,
    /// Instant of the latest delta.
    pub last_updated: DateTime<Utc>,
}

impl UserStat {
    /// Creates a row whose counters equal `delta`.
    #[must_use]
    pub const fn from_delta(
        user_id: UserId,
        guild_id: GuildId,
        delta: StatsDelta,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            guild_id,
            tasks_completed: delta.completed,
            tasks_overdue: delta.overdue,
            karma_points: delta.karma,
            last_updated: now,
        }
    }

    /// Adds `delta` to the counters and stamps `last_updated`.
    pub const fn apply(&mut self, delta: StatsDelta, now: DateTime<Utc>) {
        self.tasks_completed += delta.completed;
        self.tasks_overdue += delta.overdue;
        self.karma_points += delta.karma;
        self.last_updated = now;
    }
}
