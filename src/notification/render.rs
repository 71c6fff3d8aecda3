//! Plain-text rendering of notification bodies.

use crate::task::domain::{DailySummary, GuildId, Task, UserId};
use minijinja::{Environment, Value, context};
use serde::Serialize;

/// Number of recent updates listed in a rendered digest.
pub const DIGEST_UPDATE_LINES: usize = 5;

const REMINDER_TEMPLATE: &str = "\
Task reminder for <@{{ assignee }}>: it's been {{ hours }} hours since you were assigned **{{ title }}**.
Deadline: {{ deadline }} | Priority: {{ priority }} | Task ID: {{ task_id }}
{% if description %}{{ description }}
{% endif %}Use /update-task {{ task_id }} to provide an update.";

const OVERDUE_TEMPLATE: &str = "\
Deadline reached: <@{{ assignee }}>, the deadline for **{{ title }}** has passed.
Deadline was: {{ deadline }} | Priority: {{ priority }} | Task ID: {{ task_id }}
Please update status: /update-task {{ task_id }} completed";

const ASSIGNMENT_TEMPLATE: &str = "\
New task for <@{{ assignee }}> from <@{{ assigner }}>: **{{ title }}**
Deadline: {{ deadline }} | Priority: {{ priority }} | Task ID: {{ task_id }}";

const DIGEST_TEMPLATE: &str = "\
{% if supervisor %}<@{{ supervisor }}>
{% endif %}Daily summary for guild {{ guild }} ({{ date }})
Tasks assigned today: {{ assigned_today }}
Tasks due tomorrow: {{ due_tomorrow }}
Overdue tasks: {{ overdue }}
{% if updates %}Recent updates:
{% for update in updates %}- **{{ update.title }}**: {{ update.status }} (<@{{ update.assignee }}>)
{% endfor %}{% else %}No updates today
{% endif %}{% if supervisor %}Daily report for <@{{ supervisor }}>
{% endif %}";

/// Renders notification bodies from task data.
#[derive(Debug)]
pub struct NotificationRenderer {
    environment: Environment<'static>,
    reminder_threshold_hours: u32,
    supervisor: Option<UserId>,
}

impl NotificationRenderer {
    /// Creates a renderer; reminders mention `reminder_threshold_hours`.
    #[must_use]
    pub fn new(reminder_threshold_hours: u32) -> Self {
        Self {
            environment: Environment::new(),
            reminder_threshold_hours,
            supervisor: None,
        }
    }

    /// Mentions `supervisor` at the top of every digest and names them in
    /// its footer. `None` renders digests without either line.
    #[must_use]
    pub const fn with_supervisor(mut self, supervisor: Option<UserId>) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Renders the one-time reminder.
    ///
    /// # Errors
    ///
    /// Returns [`minijinja::Error`] when template evaluation fails.
    pub fn reminder(&self, task: &Task) -> Result<String, minijinja::Error> {
        let view = TaskView::new(task, Some(self.reminder_threshold_hours));
        self.environment.render_str(REMINDER_TEMPLATE, view)
    }

    /// Renders the overdue notice.
    ///
    /// # Errors
    ///
    /// Returns [`minijinja::Error`] when template evaluation fails.
    pub fn overdue(&self, task: &Task) -> Result<String, minijinja::Error> {
        self.environment
            .render_str(OVERDUE_TEMPLATE, TaskView::new(task, None))
    }

    /// Renders the assignment announcement.
    ///
    /// # Errors
    ///
    /// Returns [`minijinja::Error`] when template evaluation fails.
    pub fn assignment(&self, task: &Task) -> Result<String, minijinja::Error> {
        self.environment
            .render_str(ASSIGNMENT_TEMPLATE, TaskView::new(task, None))
    }

    /// Renders a guild digest listing at most [`DIGEST_UPDATE_LINES`] updates.
    ///
    /// # Errors
    ///
    /// Returns [`minijinja::Error`] when template evaluation fails.
    pub fn digest(&self, guild: GuildId, summary: &DailySummary) -> Result<String, minijinja::Error> {
        let updates: Vec<Value> = summary
            .recent_updates
            .iter()
            .take(DIGEST_UPDATE_LINES)
            .map(|update| {
                context! {
                    title => update.title.as_str(),
                    status => update.status.as_str(),
                    assignee => update.assigned_to.value(),
                }
            })
            .collect();
        let ctx = context! {
            guild => guild.value(),
            date => summary.date.to_string(),
            assigned_today => summary.assigned_today,
            due_tomorrow => summary.due_tomorrow,
            overdue => summary.overdue_count,
            updates => updates,
            supervisor => self.supervisor.map(UserId::value),
        };
        self.environment.render_str(DIGEST_TEMPLATE, ctx)
    }
}

/// Template context for a single task.
#[derive(Serialize)]
struct TaskView<'a> {
    task_id: String,
    title: &'a str,
    description: &'a str,
    assignee: u64,
    assigner: u64,
    deadline: String,
    priority: &'static str,
    hours: Option<u32>,
}

impl<'a> TaskView<'a> {
    fn new(task: &'a Task, hours: Option<u32>) -> Self {
        Self {
            task_id: task.id().to_string(),
            title: task.title(),
            description: task.description(),
            assignee: task.assigned_to().value(),
            assigner: task.assigned_by().value(),
            deadline: task.deadline().format("%Y-%m-%d %H:%M UTC").to_string(),
            priority: task.priority().as_str(),
            hours,
        }
    }
}
