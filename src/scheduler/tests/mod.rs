//! Unit tests for scheduler configuration, scans, and the runner.
