//! In-memory stats adapter.

mod stats_store;

pub use stats_store::InMemoryStatsStore;
