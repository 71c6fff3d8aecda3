//! Adapter implementations of the notifier port.

mod log;

pub use log::TracingNotifier;
