//! Diesel row models for task persistence and their domain conversions.

use super::schema::{task_updates, tasks};
use crate::task::{
    domain::{
        GuildId, PersistedTaskData, PersistedTaskUpdateData, Task, TaskId, TaskPriority,
        TaskStatus, TaskUpdate, TaskUpdateId, UserId,
    },
    ports::{TaskStoreError, TaskStoreResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for task records, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Assignee platform identifier.
    pub assigned_to: i64,
    /// Assigner platform identifier.
    pub assigned_by: i64,
    /// Guild scope.
    pub guild_id: i64,
    /// Deadline instant.
    pub deadline: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// One-time reminder marker.
    pub reminder_sent: bool,
    /// One-time overdue marker.
    pub deadline_notified: bool,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Row model for audit records, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_updates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskUpdateRow {
    /// Audit row identifier.
    pub id: uuid::Uuid,
    /// Task the change applied to.
    pub task_id: uuid::Uuid,
    /// Acting user.
    pub actor_id: i64,
    /// Status written.
    pub new_status: String,
    /// Optional note.
    pub note: Option<String>,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
}

pub(super) fn to_db_id(value: u64) -> TaskStoreResult<i64> {
    i64::try_from(value).map_err(TaskStoreError::persistence)
}

pub(super) fn user_from_db(value: i64) -> TaskStoreResult<UserId> {
    let raw = u64::try_from(value).map_err(TaskStoreError::persistence)?;
    UserId::new(raw).map_err(TaskStoreError::persistence)
}

pub(super) fn guild_from_db(value: i64) -> TaskStoreResult<GuildId> {
    let raw = u64::try_from(value).map_err(TaskStoreError::persistence)?;
    GuildId::new(raw).map_err(TaskStoreError::persistence)
}

pub(super) fn status_from_db(value: &str) -> TaskStoreResult<TaskStatus> {
    TaskStatus::try_from(value).map_err(TaskStoreError::persistence)
}

pub(super) fn to_task_row(task: &Task) -> TaskStoreResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        assigned_to: to_db_id(task.assigned_to().value())?,
        assigned_by: to_db_id(task.assigned_by().value())?,
        guild_id: to_db_id(task.guild_id().value())?,
        deadline: task.deadline(),
        created_at: task.created_at(),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        reminder_sent: task.reminder_sent(),
        deadline_notified: task.deadline_notified(),
        completed_at: task.completed_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        assigned_to,
        assigned_by,
        guild_id,
        deadline,
        created_at,
        status,
        priority,
        reminder_sent,
        deadline_notified,
        completed_at,
    } = row;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        assigned_to: user_from_db(assigned_to)?,
        assigned_by: user_from_db(assigned_by)?,
        guild_id: guild_from_db(guild_id)?,
        deadline,
        created_at,
        status: status_from_db(&status)?,
        priority: TaskPriority::try_from(priority.as_str()).map_err(TaskStoreError::persistence)?,
        reminder_sent,
        deadline_notified,
        completed_at,
    }))
}

pub(super) fn to_update_row(update: &TaskUpdate) -> TaskStoreResult<TaskUpdateRow> {
    Ok(TaskUpdateRow {
        id: update.id().into_inner(),
        task_id: update.task_id().into_inner(),
        actor_id: to_db_id(update.actor().value())?,
        new_status: update.new_status().as_str().to_owned(),
        note: update.note().map(str::to_owned),
        created_at: update.created_at(),
    })
}

pub(super) fn row_to_update(row: TaskUpdateRow) -> TaskStoreResult<TaskUpdate> {
    Ok(TaskUpdate::from_persisted(PersistedTaskUpdateData {
        id: TaskUpdateId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        actor: user_from_db(row.actor_id)?,
        new_status: status_from_db(&row.new_status)?,
        note: row.note,
        created_at: row.created_at,
    }))
}
