//! Domain model for user statistics.

mod stat;

pub use stat::{StatsDelta, UserStat};
