//! Delivery port for reminders, overdue notices, digests, and assignments.

use crate::task::domain::{DailySummary, GuildId, Task};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Best-effort delivery of user-facing messages.
///
/// Failures are reported, never fatal. Callers log them and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Reminds the assignee that a task is still open.
    async fn send_reminder(&self, task: &Task) -> NotifierResult<()>;

    /// Tells the assignee that a task's deadline has passed.
    async fn send_overdue(&self, task: &Task) -> NotifierResult<()>;

    /// Publishes a guild's daily digest.
    async fn send_digest(&self, guild: GuildId, summary: &DailySummary) -> NotifierResult<()>;

    /// Announces a newly created task to its assignee.
    async fn notify_assignment(&self, task: &Task) -> NotifierResult<()>;
}

/// Errors reported by notifier implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifierError {
    /// The message could not be built or was rejected by the channel.
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    /// The delivery channel is not reachable.
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),
}
