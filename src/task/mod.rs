//! Delegated task tracking.
//!
//! Tasks carry a deadline and a status that may move freely until it reaches
//! `completed` or `cancelled`. Every status change appends an audit row in
//! the same atomic write. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
