//! Domain model for delegated tasks.
//!
//! Tasks, their audit trail, and digest aggregates are plain typed values;
//! persistence and delivery live outside the domain boundary.

mod error;
mod ids;
mod status;
mod summary;
mod task;
mod update;

pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::{GuildId, TaskId, TaskUpdateId, UserId};
pub use status::{TaskPriority, TaskStatus};
pub use summary::{
    DailySummary, DigestWindow, RECENT_UPDATE_LIMIT, RecentUpdate, resolve_local,
};
pub use task::{NewTask, PersistedTaskData, Task};
pub use update::{PersistedTaskUpdateData, TaskUpdate};
