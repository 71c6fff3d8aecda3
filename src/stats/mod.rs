//! Per-user task statistics.
//!
//! Completion counts, overdue counts, and karma accumulate per
//! `(user, guild)` pair through additive deltas. The module follows the same
//! hexagonal split as [`crate::task`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
