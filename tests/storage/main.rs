//! Integration tests for Layer 1: Storage
//!
//! Tests for the host model: unit registry, reflection, and the instance heap.

mod heap;
mod registry;
