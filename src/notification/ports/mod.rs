//! Port contracts for notification delivery.

pub mod notifier;

pub use notifier::{Notifier, NotifierError, NotifierResult};
