//! Outbound notifications for task events.
//!
//! The scheduler and lifecycle service talk to a [`ports::Notifier`]; how a
//! message reaches users is an adapter concern. [`render`] turns payloads
//! into plain text shared by adapters.

pub mod adapters;
pub mod ports;
pub mod render;

#[cfg(test)]
mod tests;
