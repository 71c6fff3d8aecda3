//! Port contracts for task persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by task services and
//! the scheduler.

pub mod store;

pub use store::{FlagMark, StatusChange, StatusWrite, TaskStore, TaskStoreError, TaskStoreResult};
