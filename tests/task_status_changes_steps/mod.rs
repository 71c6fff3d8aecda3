//! Step definitions for task status change scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
