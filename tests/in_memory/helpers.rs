//! Wiring shared by in-memory integration tests.

use std::sync::Arc;

use crate::test_helpers::{RecordingNotifier, TestClock, fixed_instant};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use taskwarden::scheduler::{ScheduleSettings, Scans};
use taskwarden::stats::adapters::memory::InMemoryStatsStore;
use taskwarden::task::{
    adapters::memory::InMemoryTaskStore,
    domain::Task,
    services::{CreateTaskRequest, TaskLifecycleService},
};

/// Lifecycle service over in-memory stores.
pub type Service =
    TaskLifecycleService<InMemoryTaskStore, InMemoryStatsStore, RecordingNotifier, TestClock>;

/// Scans over in-memory stores.
pub type TestScans = Scans<InMemoryTaskStore, InMemoryStatsStore, RecordingNotifier>;

/// Assignee used by [`release_task`].
pub const ASSIGNEE: u64 = 100;
/// Assigner used by [`release_task`].
pub const ASSIGNER: u64 = 200;
/// Guild used by [`release_task`].
pub const GUILD: u64 = 1;

/// Stores, clock, service, and scans sharing one notifier.
pub struct Harness {
    pub tasks: Arc<InMemoryTaskStore>,
    pub stats: Arc<InMemoryStatsStore>,
    pub clock: Arc<TestClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<Service>,
    pub scans: TestScans,
}

impl Harness {
    /// Builds a harness starting at [`fixed_instant`].
    pub fn new() -> Self {
        Self::with_scan_notifier(RecordingNotifier::new())
    }

    /// Builds a harness whose scans deliver through `scan_notifier`; the
    /// service keeps its own recorder.
    pub fn with_scan_notifier(scan_notifier: RecordingNotifier) -> Self {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let stats = Arc::new(InMemoryStatsStore::new());
        let clock = Arc::new(TestClock::at(fixed_instant()));
        let notifier = Arc::new(scan_notifier);
        let service = Arc::new(TaskLifecycleService::new(
            Arc::clone(&tasks),
            Arc::clone(&stats),
            Arc::new(RecordingNotifier::new()),
            Arc::clone(&clock),
        ));
        let scans = Scans::new(
            Arc::clone(&tasks),
            Arc::clone(&stats),
            Arc::clone(&notifier),
            ScheduleSettings::default(),
        );
        Self {
            tasks,
            stats,
            clock,
            notifier,
            service,
            scans,
        }
    }

    /// Returns the clock's current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Creates a task due `due_in` from now.
    pub async fn release_task(&self, due_in: TimeDelta) -> eyre::Result<Task> {
        let request = CreateTaskRequest::new(
            "Publish release notes",
            ASSIGNEE,
            ASSIGNER,
            GUILD,
            self.now() + due_in,
        );
        Ok(self.service.create_task(request).await?)
    }
}
