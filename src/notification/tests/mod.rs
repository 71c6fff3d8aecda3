//! Unit tests for notification rendering and the log adapter.
