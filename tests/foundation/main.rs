//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, InstanceId, Category, and Error.

mod errors;
mod values;
