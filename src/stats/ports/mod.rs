//! Port contracts for user statistics.

pub mod store;

pub use store::{StatsStore, StatsStoreError, StatsStoreResult};
