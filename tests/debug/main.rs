//! Integration tests for Layer 3: Debug
//!
//! Tests for renderers, output spilling, and spill-file cleanup.

mod output;
mod render;
