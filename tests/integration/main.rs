//! End-to-end integration tests
//!
//! Tests that exercise snapshots, sessions, and the full inspection pipeline.

mod pipeline;
mod snapshots;
