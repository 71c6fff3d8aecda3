//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The user identifier is out of range.
    #[error("invalid user id {0}, expected a positive 63-bit integer")]
    InvalidUserId(u64),

    /// The guild identifier is out of range.
    #[error("invalid guild id {0}, expected a positive 63-bit integer")]
    InvalidGuildId(u64),

    /// The deadline is not strictly after the creation instant.
    #[error("deadline {deadline} must be in the future (now is {now})")]
    DeadlineNotInFuture {
        /// Requested deadline.
        deadline: DateTime<Utc>,
        /// Instant the request was evaluated at.
        now: DateTime<Utc>,
    },

    /// The status value is not one of the known lifecycle states.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),

    /// The priority value is not one of the known priorities.
    #[error(transparent)]
    InvalidPriority(#[from] ParseTaskPriorityError),

    /// The task is in a terminal state and accepts no further transitions.
    #[error("task {task_id} is {from} and cannot move to {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current (terminal) status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status '{0}', expected one of assigned, in_progress, stuck, completed, cancelled")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority '{0}', expected one of low, medium, high, urgent")]
pub struct ParseTaskPriorityError(pub String);
