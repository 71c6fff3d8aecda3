//! Unit tests for the stats context.
