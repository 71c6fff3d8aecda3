//! In-memory adapters for tests and embedders without a database.

mod task_store;

pub use task_store::InMemoryTaskStore;
