//! Task aggregate root and its creation input.

use super::{GuildId, TaskDomainError, TaskId, TaskPriority, TaskStatus, UserId};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: String,
    assigned_to: UserId,
    assigned_by: UserId,
    guild_id: GuildId,
    deadline: DateTime<Utc>,
    priority: TaskPriority,
}

impl NewTask {
    /// Creates task input with a trimmed, non-empty title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        assigned_to: UserId,
        assigned_by: UserId,
        guild_id: GuildId,
        deadline: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            description: String::new(),
            assigned_to,
            assigned_by,
            guild_id,
            deadline,
            priority: TaskPriority::default(),
        })
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    assigned_to: UserId,
    assigned_by: UserId,
    guild_id: GuildId,
    deadline: DateTime<Utc>,
    created_at: DateTime<Utc>,
    status: TaskStatus,
    priority: TaskPriority,
    reminder_sent: bool,
    deadline_notified: bool,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted assignee.
    pub assigned_to: UserId,
    /// Persisted assigner.
    pub assigned_by: UserId,
    /// Persisted guild scope.
    pub guild_id: GuildId,
    /// Persisted deadline.
    pub deadline: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Whether the one-time reminder has been delivered.
    pub reminder_sent: bool,
    /// Whether the overdue notice has been delivered.
    pub deadline_notified: bool,
    /// Completion timestamp, if the task was ever completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task in the `assigned` status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DeadlineNotInFuture`] unless the deadline is
    /// strictly after the clock's current instant.
    pub fn new(input: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let now = clock.utc();
        if input.deadline <= now {
            return Err(TaskDomainError::DeadlineNotInFuture {
                deadline: input.deadline,
                now,
            });
        }

        Ok(Self {
            id: TaskId::new(),
            title: input.title,
            description: input.description,
            assigned_to: input.assigned_to,
            assigned_by: input.assigned_by,
            guild_id: input.guild_id,
            deadline: input.deadline,
            created_at: now,
            status: TaskStatus::Assigned,
            priority: input.priority,
            reminder_sent: false,
            deadline_notified: false,
            completed_at: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            assigned_to: data.assigned_to,
            assigned_by: data.assigned_by,
            guild_id: data.guild_id,
            deadline: data.deadline,
            created_at: data.created_at,
            status: data.status,
            priority: data.priority,
            reminder_sent: data.reminder_sent,
            deadline_notified: data.deadline_notified,
            completed_at: data.completed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> UserId {
        self.assigned_to
    }

    /// Returns the user who assigned the task.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the guild scope.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns whether the one-time reminder has been delivered.
    #[must_use]
    pub const fn reminder_sent(&self) -> bool {
        self.reminder_sent
    }

    /// Returns whether the overdue notice has been delivered.
    #[must_use]
    pub const fn deadline_notified(&self) -> bool {
        self.deadline_notified
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns whether `actor` may change this task's status.
    #[must_use]
    pub fn is_stakeholder(&self, actor: UserId) -> bool {
        actor == self.assigned_to || actor == self.assigned_by
    }

    /// Moves the task to `target`.
    ///
    /// Entering `completed` stamps `completed_at`; no other transition touches
    /// it, so an earlier completion time is never cleared.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already terminal. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        if target == TaskStatus::Completed {
            self.completed_at = Some(at);
        }
        Ok(())
    }

    /// Sets the reminder marker, returning `true` only on the first call.
    pub const fn mark_reminder_sent(&mut self) -> bool {
        let newly_marked = !self.reminder_sent;
        self.reminder_sent = true;
        newly_marked
    }

    /// Sets the overdue marker, returning `true` only on the first call.
    pub const fn mark_deadline_notified(&mut self) -> bool {
        let newly_marked = !self.deadline_notified;
        self.deadline_notified = true;
        newly_marked
    }

    /// Returns whether the reminder scan should select this task at `now`.
    #[must_use]
    pub fn is_due_for_reminder(&self, threshold: TimeDelta, now: DateTime<Utc>) -> bool {
        !self.reminder_sent
            && self.status.is_remindable()
            && now.signed_duration_since(self.created_at) >= threshold
    }

    /// Returns whether the overdue scan should select this task at `now`.
    #[must_use]
    pub fn is_awaiting_overdue_notice(&self, now: DateTime<Utc>) -> bool {
        !self.deadline_notified && !self.status.is_terminal() && self.deadline <= now
    }

    /// Returns whether the deadline has passed on an open task.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.deadline <= now
    }
}
