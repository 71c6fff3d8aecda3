//! Notifier that writes rendered messages to the `tracing` log.

use crate::notification::{
    ports::{Notifier, NotifierError, NotifierResult},
    render::NotificationRenderer,
};
use crate::task::domain::{DailySummary, GuildId, Task};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Delivers notifications as structured `info` events.
///
/// Each event carries the rendered text as its message and the payload as
/// JSON in the `payload` field.
#[derive(Debug)]
pub struct TracingNotifier {
    renderer: NotificationRenderer,
}

impl TracingNotifier {
    /// Creates a notifier rendering with `renderer`.
    #[must_use]
    pub const fn new(renderer: NotificationRenderer) -> Self {
        Self { renderer }
    }
}

fn render_failed(err: &minijinja::Error) -> NotifierError {
    NotifierError::Delivery(err.to_string())
}

fn payload_json(payload: &impl Serialize) -> NotifierResult<String> {
    serde_json::to_string(payload).map_err(|err| NotifierError::Delivery(err.to_string()))
}

fn emit_task_event(kind: &'static str, task: &Task, text: &str) -> NotifierResult<()> {
    let payload = payload_json(task)?;
    info!(
        kind,
        task_id = %task.id(),
        guild_id = %task.guild_id(),
        user_id = %task.assigned_to(),
        payload = %payload,
        "{text}"
    );
    Ok(())
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send_reminder(&self, task: &Task) -> NotifierResult<()> {
        let text = self.renderer.reminder(task).map_err(|err| render_failed(&err))?;
        emit_task_event("reminder", task, &text)
    }

    async fn send_overdue(&self, task: &Task) -> NotifierResult<()> {
        let text = self.renderer.overdue(task).map_err(|err| render_failed(&err))?;
        emit_task_event("overdue", task, &text)
    }

    async fn send_digest(&self, guild: GuildId, summary: &DailySummary) -> NotifierResult<()> {
        let text = self
            .renderer
            .digest(guild, summary)
            .map_err(|err| render_failed(&err))?;
        let payload = payload_json(summary)?;
        info!(kind = "digest", guild_id = %guild, payload = %payload, "{text}");
        Ok(())
    }

    async fn notify_assignment(&self, task: &Task) -> NotifierResult<()> {
        let text = self
            .renderer
            .assignment(task)
            .map_err(|err| render_failed(&err))?;
        emit_task_event("assignment", task, &text)
    }
}
