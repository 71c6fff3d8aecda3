//! `PostgreSQL` adapter for user statistics.

mod schema;
mod store;

pub use store::PostgresStatsStore;
