//! Shared world state for task status change BDD scenarios.

use std::sync::Arc;

use crate::test_helpers::{RecordingNotifier, TestClock, fixed_instant};
use rstest::fixture;
use taskwarden::stats::adapters::memory::InMemoryStatsStore;
use taskwarden::task::{
    adapters::memory::InMemoryTaskStore,
    domain::Task,
    services::{TaskLifecycleError, TaskLifecycleService},
};

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskLifecycleService<InMemoryTaskStore, InMemoryStatsStore, RecordingNotifier, TestClock>;

/// Scenario world for status change behaviour tests.
pub struct StatusChangeWorld {
    pub service: TestTaskService,
    pub task: Option<Task>,
    pub last_change: Option<Result<Task, TaskLifecycleError>>,
}

impl StatusChangeWorld {
    /// Creates a world with no task yet.
    #[must_use]
    pub fn new() -> Self {
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(InMemoryStatsStore::new()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(TestClock::at(fixed_instant())),
        );
        Self {
            service,
            task: None,
            last_change: None,
        }
    }

    /// Returns the scenario's task or an error when none was created.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for StatusChangeWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StatusChangeWorld {
    StatusChangeWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
