//! Taskwarden: delegated task tracking with deadline-driven notifications.
//!
//! Tasks are handed from one chat user to another inside a guild, carry a
//! deadline, and move through a small lifecycle. Background scans send a
//! one-time reminder, a one-time overdue notice, and a daily digest, each
//! guarded by persisted markers so a notification fires once per threshold.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task records, the audit trail, and the lifecycle service
//! - [`stats`]: Per-user completion, overdue, and karma counters
//! - [`notification`]: Delivery port and message rendering
//! - [`scheduler`]: Reminder, overdue, and digest scans and their runner
//! - [`persistence`]: Shared `PostgreSQL` pool and migration

pub mod notification;
pub mod persistence;
pub mod scheduler;
pub mod stats;
pub mod task;

#[cfg(test)]
mod test_support;
