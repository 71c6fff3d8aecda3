//! Daily digest aggregates and the calendar window they are computed over.

use super::{GuildId, TaskId, TaskStatus, UserId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of audit rows carried by a digest.
pub const RECENT_UPDATE_LIMIT: usize = 10;

/// Widest daylight-saving gap searched when resolving a skipped wall time.
const GAP_SEARCH_MINUTES: i64 = 180;

/// Resolves a wall-clock time in `zone` to a UTC instant.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Times skipped by clocks springing forward resolve to the first valid
/// minute after the gap.
#[must_use]
pub fn resolve_local<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> DateTime<Utc> {
    (0..=GAP_SEARCH_MINUTES)
        .find_map(|minutes| {
            zone.from_local_datetime(&(local + TimeDelta::minutes(minutes)))
                .earliest()
        })
        .map_or_else(|| local.and_utc(), |resolved| resolved.with_timezone(&Utc))
}

/// Calendar-day boundaries of an instant in a local time zone.
///
/// "Today" and "tomorrow" are local calendar days, not rolling 24-hour
/// windows. Each midnight is resolved for its own date, so a day spanning a
/// daylight-saving change is 23 or 25 hours long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestWindow {
    now: DateTime<Utc>,
    local_date: NaiveDate,
    today_start: DateTime<Utc>,
    tomorrow_start: DateTime<Utc>,
    day_after_start: DateTime<Utc>,
}

impl DigestWindow {
    /// Computes the window containing `now` as seen from `zone`.
    #[must_use]
    pub fn new<Z: TimeZone>(now: DateTime<Utc>, zone: &Z) -> Self {
        let local_date = now.with_timezone(zone).date_naive();
        let tomorrow = local_date.succ_opt().unwrap_or(local_date);
        let day_after = tomorrow.succ_opt().unwrap_or(tomorrow);
        let midnight = |date: NaiveDate| resolve_local(zone, date.and_time(NaiveTime::MIN));
        let today_start = midnight(local_date);
        let tomorrow_start = midnight(tomorrow);
        let day_after_start = midnight(day_after);
        Self {
            now,
            local_date,
            today_start,
            tomorrow_start,
            day_after_start,
        }
    }

    /// Returns the instant the window was computed for.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the local calendar date of `now`.
    #[must_use]
    pub const fn local_date(&self) -> NaiveDate {
        self.local_date
    }

    /// Returns local midnight starting today, as a UTC instant.
    #[must_use]
    pub const fn today_start(&self) -> DateTime<Utc> {
        self.today_start
    }

    /// Returns local midnight starting tomorrow, as a UTC instant.
    #[must_use]
    pub const fn tomorrow_start(&self) -> DateTime<Utc> {
        self.tomorrow_start
    }

    /// Returns local midnight ending tomorrow, as a UTC instant.
    #[must_use]
    pub const fn day_after_start(&self) -> DateTime<Utc> {
        self.day_after_start
    }

    /// Returns whether `instant` falls on the local "today".
    #[must_use]
    pub fn is_today(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.today_start && instant < self.tomorrow_start
    }

    /// Returns whether `instant` falls on the local "tomorrow".
    #[must_use]
    pub fn is_tomorrow(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.tomorrow_start && instant < self.day_after_start
    }
}

/// Audit row joined with the task it belongs to, for digest display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentUpdate {
    /// Task the change applied to.
    pub task_id: TaskId,
    /// Task title.
    pub title: String,
    /// Task assignee.
    pub assigned_to: UserId,
    /// Status written by the change.
    pub status: TaskStatus,
    /// Optional note supplied with the change.
    pub note: Option<String>,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

/// Aggregate task activity for one guild and local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Guild the summary covers.
    pub guild_id: GuildId,
    /// Local date the summary covers.
    pub date: NaiveDate,
    /// Tasks created today.
    pub assigned_today: u64,
    /// Open tasks whose deadline falls tomorrow.
    pub due_tomorrow: u64,
    /// Open tasks whose deadline has passed.
    pub overdue_count: u64,
    /// Today's status changes, newest first, at most [`RECENT_UPDATE_LIMIT`].
    pub recent_updates: Vec<RecentUpdate>,
}
