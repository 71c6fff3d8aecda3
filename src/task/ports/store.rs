//! Store port for task persistence, scheduler queries, and notification markers.

use crate::task::domain::{
    DailySummary, DigestWindow, GuildId, Task, TaskId, TaskStatus, TaskUpdate, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// A requested status write together with its audit details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Task to update.
    pub task_id: TaskId,
    /// Status to write.
    pub new_status: TaskStatus,
    /// User requesting the change.
    pub actor: UserId,
    /// Optional note recorded in the audit row.
    pub note: Option<String>,
    /// Instant of the change.
    pub at: DateTime<Utc>,
}

/// Outcome of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusWrite {
    /// The status and its audit row were committed together.
    Applied {
        /// Task as stored after the write.
        task: Task,
        /// Audit row appended by the write.
        update: TaskUpdate,
    },
    /// The stored task was already terminal; nothing was written.
    Rejected {
        /// Terminal status found under the row lock.
        current: TaskStatus,
    },
}

/// Outcome of setting a one-time notification marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagMark {
    /// `true` when this call flipped the marker from false to true.
    pub newly_marked: bool,
    /// Task status observed atomically with the flip.
    pub status: TaskStatus,
}

/// Task persistence contract.
///
/// Every method is atomic on its own; no caller-visible multi-step
/// transactions exist.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a newly created task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the identifier exists.
    async fn create(&self, task: &Task) -> TaskStoreResult<()>;

    /// Finds a task by identifier. Returns `None` when it does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>>;

    /// Lists a user's tasks in a guild, deadline ascending.
    async fn list_by_user(
        &self,
        user: UserId,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Lists a guild's tasks, deadline ascending.
    async fn list_by_guild(
        &self,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Writes a status change and its audit row in one atomic unit.
    ///
    /// The write is refused with [`StatusWrite::Rejected`] when the stored
    /// task is already terminal. Authorisation is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn update_status(&self, change: &StatusChange) -> TaskStoreResult<StatusWrite>;

    /// Returns the audit trail of a task, oldest first.
    async fn list_updates(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskUpdate>>;

    /// Lists tasks still awaiting their one-time reminder at `now`.
    ///
    /// Selects tasks with `reminder_sent = false`, status `assigned` or
    /// `in_progress`, and `now - created_at >= threshold`, deadline ascending.
    async fn list_due_for_reminder(
        &self,
        threshold: TimeDelta,
        now: DateTime<Utc>,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Lists open tasks past their deadline that have not been flagged.
    ///
    /// Selects tasks with `deadline_notified = false`, a non-terminal status,
    /// and `deadline <= now`, deadline ascending.
    async fn list_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>>;

    /// Sets `reminder_sent`. Repeated calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn mark_reminder_sent(&self, id: TaskId) -> TaskStoreResult<FlagMark>;

    /// Sets `deadline_notified`. Repeated calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] when the task does not exist.
    async fn mark_deadline_notified(&self, id: TaskId) -> TaskStoreResult<FlagMark>;

    /// Computes the digest aggregates for a guild over a calendar window.
    async fn daily_summary(
        &self,
        guild: GuildId,
        window: &DigestWindow,
    ) -> TaskStoreResult<DailySummary>;

    /// Lists guilds with open tasks or activity during the window's day.
    async fn list_active_guilds(&self, window: &DigestWindow) -> TaskStoreResult<Vec<GuildId>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The store could not be reached or rejected the operation.
    #[error("task store unavailable: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
