//! In-memory task store.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        DailySummary, DigestWindow, GuildId, RECENT_UPDATE_LIMIT, RecentUpdate, Task, TaskId,
        TaskStatus, TaskUpdate, UserId,
    },
    ports::{FlagMark, StatusChange, StatusWrite, TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Each operation holds the state lock for its whole duration, which gives
/// the same per-row atomicity as the `PostgreSQL` adapter's transactions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    updates: Vec<TaskUpdate>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a task verbatim, bypassing creation rules.
    ///
    /// Intended for seeding fixtures such as tasks created in the past.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the lock is poisoned.
    pub fn seed(&self, task: Task) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        state.tasks.insert(task.id(), task);
        Ok(())
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Collects matching tasks ordered by deadline, then creation, then id.
fn collect_sorted<'a>(
    tasks: impl Iterator<Item = &'a Task>,
    predicate: impl Fn(&Task) -> bool,
) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks.filter(|task| predicate(*task)).cloned().collect();
    selected.sort_by_key(|task| (task.deadline(), task.created_at(), task.id()));
    selected
}

fn status_matches(task: &Task, status: Option<TaskStatus>) -> bool {
    status.is_none_or(|wanted| task.status() == wanted)
}

fn count(tasks: &HashMap<TaskId, Task>, predicate: impl Fn(&Task) -> bool) -> u64 {
    let matching = tasks.values().filter(|task| predicate(*task)).count();
    u64::try_from(matching).unwrap_or(u64::MAX)
}

fn mark_flag(
    state: &mut InMemoryTaskState,
    id: TaskId,
    flip: impl FnOnce(&mut Task) -> bool,
) -> TaskStoreResult<FlagMark> {
    let task = state.tasks.get_mut(&id).ok_or(TaskStoreError::NotFound(id))?;
    let newly_marked = flip(task);
    Ok(FlagMark {
        newly_marked,
        status: task.status(),
    })
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskStoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_by_user(
        &self,
        user: UserId,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_sorted(state.tasks.values(), |task| {
            task.assigned_to() == user && task.guild_id() == guild && status_matches(task, status)
        }))
    }

    async fn list_by_guild(
        &self,
        guild: GuildId,
        status: Option<TaskStatus>,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_sorted(state.tasks.values(), |task| {
            task.guild_id() == guild && status_matches(task, status)
        }))
    }

    async fn update_status(&self, change: &StatusChange) -> TaskStoreResult<StatusWrite> {
        let mut state = self.write()?;
        let task = state
            .tasks
            .get_mut(&change.task_id)
            .ok_or(TaskStoreError::NotFound(change.task_id))?;

        let current = task.status();
        if task.transition_to(change.new_status, change.at).is_err() {
            return Ok(StatusWrite::Rejected { current });
        }
        let updated = task.clone();

        let update = TaskUpdate::new(
            change.task_id,
            change.actor,
            change.new_status,
            change.note.clone(),
            change.at,
        );
        state.updates.push(update.clone());

        Ok(StatusWrite::Applied {
            task: updated,
            update,
        })
    }

    async fn list_updates(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskUpdate>> {
        let state = self.read()?;
        let mut updates: Vec<TaskUpdate> = state
            .updates
            .iter()
            .filter(|update| update.task_id() == task_id)
            .cloned()
            .collect();
        updates.sort_by_key(TaskUpdate::created_at);
        Ok(updates)
    }

    async fn list_due_for_reminder(
        &self,
        threshold: TimeDelta,
        now: DateTime<Utc>,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_sorted(state.tasks.values(), |task| {
            task.is_due_for_reminder(threshold, now)
        }))
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(collect_sorted(state.tasks.values(), |task| {
            task.is_awaiting_overdue_notice(now)
        }))
    }

    async fn mark_reminder_sent(&self, id: TaskId) -> TaskStoreResult<FlagMark> {
        let mut state = self.write()?;
        mark_flag(&mut state, id, Task::mark_reminder_sent)
    }

    async fn mark_deadline_notified(&self, id: TaskId) -> TaskStoreResult<FlagMark> {
        let mut state = self.write()?;
        mark_flag(&mut state, id, Task::mark_deadline_notified)
    }

    async fn daily_summary(
        &self,
        guild: GuildId,
        window: &DigestWindow,
    ) -> TaskStoreResult<DailySummary> {
        let state = self.read()?;
        let in_guild = |task: &Task| task.guild_id() == guild;

        let assigned_today = count(&state.tasks, |task| {
            in_guild(task) && window.is_today(task.created_at())
        });
        let due_tomorrow = count(&state.tasks, |task| {
            in_guild(task) && !task.status().is_terminal() && window.is_tomorrow(task.deadline())
        });
        let overdue_count = count(&state.tasks, |task| {
            in_guild(task) && task.is_overdue(window.now())
        });

        let mut recent_updates: Vec<RecentUpdate> = state
            .updates
            .iter()
            .filter(|update| window.is_today(update.created_at()))
            .filter_map(|update| {
                let task = state.tasks.get(&update.task_id())?;
                in_guild(task).then(|| RecentUpdate {
                    task_id: task.id(),
                    title: task.title().to_owned(),
                    assigned_to: task.assigned_to(),
                    status: update.new_status(),
                    note: update.note().map(str::to_owned),
                    created_at: update.created_at(),
                })
            })
            .collect();
        recent_updates.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        recent_updates.truncate(RECENT_UPDATE_LIMIT);

        Ok(DailySummary {
            guild_id: guild,
            date: window.local_date(),
            assigned_today,
            due_tomorrow,
            overdue_count,
            recent_updates,
        })
    }

    async fn list_active_guilds(&self, window: &DigestWindow) -> TaskStoreResult<Vec<GuildId>> {
        let state = self.read()?;
        let mut guilds: BTreeSet<GuildId> = state
            .tasks
            .values()
            .filter(|task| !task.status().is_terminal() || window.is_today(task.created_at()))
            .map(Task::guild_id)
            .collect();
        guilds.extend(
            state
                .updates
                .iter()
                .filter(|update| window.is_today(update.created_at()))
                .filter_map(|update| state.tasks.get(&update.task_id()).map(Task::guild_id)),
        );
        Ok(guilds.into_iter().collect())
    }
}
