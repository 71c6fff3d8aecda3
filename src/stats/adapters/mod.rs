//! Adapter implementations of the stats store port.

pub mod memory;
pub mod postgres;
