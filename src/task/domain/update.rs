//! Append-only audit records of task status changes.

use super::{TaskId, TaskStatus, TaskUpdateId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One status-changing call against a task.
///
/// Rows are written together with the status change they describe and are
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    id: TaskUpdateId,
    task_id: TaskId,
    actor: UserId,
    new_status: TaskStatus,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskUpdateData {
    /// Persisted row identifier.
    pub id: TaskUpdateId,
    /// Task the change applied to.
    pub task_id: TaskId,
    /// User who requested the change.
    pub actor: UserId,
    /// Status written by the change.
    pub new_status: TaskStatus,
    /// Optional note supplied with the change.
    pub note: Option<String>,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

impl TaskUpdate {
    /// Records a new status change.
    ///
    /// Blank notes are stored as absent.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        actor: UserId,
        new_status: TaskStatus,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskUpdateId::new(),
            task_id,
            actor,
            new_status,
            note: note.filter(|text| !text.trim().is_empty()),
            created_at,
        }
    }

    /// Reconstructs an audit row from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskUpdateData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            actor: data.actor,
            new_status: data.new_status,
            note: data.note,
            created_at: data.created_at,
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub const fn id(&self) -> TaskUpdateId {
        self.id
    }

    /// Returns the task the change applied to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        self.actor
    }

    /// Returns the status written by the change.
    #[must_use]
    pub const fn new_status(&self) -> TaskStatus {
        self.new_status
    }

    /// Returns the note, if any.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns when the change was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
