//! Service layer for task creation, status changes, and queries.

use crate::notification::ports::Notifier;
use crate::stats::{
    domain::{StatsDelta, UserStat},
    ports::{StatsStore, StatsStoreError},
};
use crate::task::{
    domain::{
        DailySummary, DigestWindow, GuildId, NewTask, Task, TaskDomainError, TaskId, TaskPriority,
        TaskStatus, TaskUpdate, UserId,
    },
    ports::{StatusChange, StatusWrite, TaskStore, TaskStoreError},
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Request payload for creating a task from raw command-surface input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    assigned_to: u64,
    assigned_by: u64,
    guild_id: u64,
    deadline: DateTime<Utc>,
    priority: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        assigned_to: u64,
        assigned_by: u64,
        guild_id: u64,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            assigned_to,
            assigned_by,
            guild_id,
            deadline,
            priority: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority by name. Omitting it yields `medium`.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }
}

/// Request payload for changing a task's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatusRequest {
    task_id: TaskId,
    new_status: String,
    actor: u64,
    note: Option<String>,
}

impl ChangeStatusRequest {
    /// Creates a request moving `task_id` to the status named `new_status`.
    #[must_use]
    pub fn new(task_id: TaskId, new_status: impl Into<String>, actor: u64) -> Self {
        Self {
            task_id,
            new_status: new_status.into(),
            actor,
            note: None,
        }
    }

    /// Attaches a note recorded in the audit trail.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Service-level errors for task lifecycle operations.
///
/// Each variant displays as a short reason suitable for replying to users.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Input validation failed before any write.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// The task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The actor is neither the assignee nor the assigner.
    #[error("only the assignee or the assigner can update task {task_id}")]
    Unauthorized {
        /// Task the change targeted.
        task_id: TaskId,
        /// User who requested the change.
        actor: UserId,
    },

    /// The task is terminal.
    #[error("task {task_id} is already {from} and cannot move to {to}")]
    InvalidTransition {
        /// Task the change targeted.
        task_id: TaskId,
        /// Terminal status the task is in.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task store failed.
    #[error(transparent)]
    Store(TaskStoreError),

    /// The stats store failed.
    #[error(transparent)]
    Stats(#[from] StatsStoreError),
}

impl From<TaskStoreError> for TaskLifecycleError {
    fn from(err: TaskStoreError) -> Self {
        match err {
            TaskStoreError::NotFound(task_id) => Self::NotFound(task_id),
            other => Self::Store(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Validates raw input, enforces authorisation and the terminal-state rule,
/// and applies the statistics side effects of completion.
#[derive(Clone)]
pub struct TaskLifecycleService<S, T, N, C>
where
    S: TaskStore,
    T: StatsStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    tasks: Arc<S>,
    stats: Arc<T>,
    notifier: Arc<N>,
    clock: Arc<C>,
    digest_timezone: Tz,
}

impl<S, T, N, C> TaskLifecycleService<S, T, N, C>
where
    S: TaskStore,
    T: StatsStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a new service. Digest boundaries default to UTC.
    #[must_use]
    pub fn new(tasks: Arc<S>, stats: Arc<T>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            stats,
            notifier,
            clock,
            digest_timezone: Tz::UTC,
        }
    }

    /// Sets the time zone used for digest calendar boundaries.
    #[must_use]
    pub const fn with_digest_timezone(mut self, timezone: Tz) -> Self {
        self.digest_timezone = timezone;
        self
    }

    /// Creates a task and announces it to the assignee.
    ///
    /// The announcement is best effort; a delivery failure is logged and the
    /// created task is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Validation`] for a blank title, invalid
    /// identifiers, an unknown priority, or a deadline not after now, and
    /// [`TaskLifecycleError::Store`] when persistence fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let assigned_to = UserId::new(request.assigned_to)?;
        let assigned_by = UserId::new(request.assigned_by)?;
        let guild_id = GuildId::new(request.guild_id)?;
        let priority = request
            .priority
            .as_deref()
            .map(TaskPriority::try_from)
            .transpose()
            .map_err(TaskDomainError::from)?
            .unwrap_or_default();

        let mut input = NewTask::new(
            request.title,
            assigned_to,
            assigned_by,
            guild_id,
            request.deadline,
        )?
        .with_priority(priority);
        if let Some(description) = request.description {
            input = input.with_description(description);
        }

        let task = Task::new(input, &*self.clock)?;
        self.tasks.create(&task).await?;
        info!(
            task_id = %task.id(),
            guild_id = %task.guild_id(),
            assigned_to = %task.assigned_to(),
            "task created"
        );

        if let Err(err) = self.notifier.notify_assignment(&task).await {
            warn!(task_id = %task.id(), error = %err, "assignment notification failed");
        }
        Ok(task)
    }

    /// Moves a task to a new status on behalf of `actor`.
    ///
    /// Entering `completed` credits the assignee with one completion and ten
    /// karma. A statistics failure is logged; the committed transition
    /// stands.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Validation`] for an unknown status or
    /// actor id, [`TaskLifecycleError::NotFound`],
    /// [`TaskLifecycleError::Unauthorized`] when the actor is not a
    /// stakeholder, [`TaskLifecycleError::InvalidTransition`] when the task is
    /// terminal, and [`TaskLifecycleError::Store`] when persistence fails.
    pub async fn change_status(&self, request: ChangeStatusRequest) -> TaskLifecycleResult<Task> {
        let target = TaskStatus::try_from(request.new_status.as_str())
            .map_err(TaskDomainError::from)?;
        let actor = UserId::new(request.actor)?;
        let task_id = request.task_id;

        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))?;
        if !task.is_stakeholder(actor) {
            return Err(TaskLifecycleError::Unauthorized { task_id, actor });
        }
        if task.status().is_terminal() {
            return Err(TaskLifecycleError::InvalidTransition {
                task_id,
                from: task.status(),
                to: target,
            });
        }

        let now = self.clock.utc();
        let change = StatusChange {
            task_id,
            new_status: target,
            actor,
            note: request.note,
            at: now,
        };
        let updated = match self.tasks.update_status(&change).await? {
            StatusWrite::Applied { task: updated, .. } => updated,
            StatusWrite::Rejected { current } => {
                return Err(TaskLifecycleError::InvalidTransition {
                    task_id,
                    from: current,
                    to: target,
                });
            }
        };
        info!(
            task_id = %task_id,
            guild_id = %updated.guild_id(),
            actor = %actor,
            status = %target,
            "task status changed"
        );

        if target == TaskStatus::Completed {
            if let Err(err) = self
                .stats
                .apply_delta(
                    updated.assigned_to(),
                    updated.guild_id(),
                    StatsDelta::COMPLETION,
                    now,
                )
                .await
            {
                error!(task_id = %task_id, error = %err, "failed to credit task completion");
            }
        }
        Ok(updated)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Store`] when lookup fails.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Returns the audit trail of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Store`] when lookup fails.
    pub async fn task_history(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskUpdate>> {
        self.get_task(task_id).await?;
        Ok(self.tasks.list_updates(task_id).await?)
    }

    /// Lists a user's tasks in a guild, deadline ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when lookup fails.
    pub async fn query_user_tasks(
        &self,
        user: UserId,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.tasks.list_by_user(user, guild, status).await?)
    }

    /// Lists a guild's tasks, deadline ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when lookup fails.
    pub async fn query_guild_tasks(
        &self,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.tasks.list_by_guild(guild, status).await?)
    }

    /// Computes today's digest for a guild using the configured time zone.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Store`] when aggregation fails.
    pub async fn get_digest(&self, guild: GuildId) -> TaskLifecycleResult<DailySummary> {
        let window = DigestWindow::new(self.clock.utc(), &self.digest_timezone);
        Ok(self.tasks.daily_summary(guild, &window).await?)
    }

    /// Returns a user's counters, or `None` before their first completion or
    /// overdue flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Stats`] when lookup fails.
    pub async fn user_stats(
        &self,
        user: UserId,
        guild: GuildId,
    ) -> TaskLifecycleResult<Option<UserStat>> {
        Ok(self.stats.find(user, guild).await?)
    }
}
