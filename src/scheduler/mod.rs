//! Deadline-driven background scans.
//!
//! Three independent scans poll the task store: a one-time reminder some
//! hours after assignment, a one-time overdue notice once the deadline
//! passes, and a daily digest per guild at a configured local hour.
//! [`Scans`] runs a single pass of each against an injected `now`;
//! [`SchedulerRunner`] drives them on fixed intervals.

mod config;
mod runner;
mod scans;

pub use config::{ConfigError, PollIntervals, ScheduleSettings, SchedulerConfig};
pub use runner::SchedulerRunner;
pub use scans::{ScanError, ScanKind, ScanReport, Scans};

#[cfg(test)]
mod tests;
