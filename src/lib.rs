//! Spyglass - Runtime introspection engine
//!
//! This crate re-exports all layers of the Spyglass system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: spyglass_runtime    - Inspector sessions, snapshots, CLI
//! Layer 3: spyglass_debug      - Diagnostics log, renderers, output accumulator
//! Layer 2: spyglass_engine     - Governor, identity tracking, member extraction, dispatch
//! Layer 1: spyglass_storage    - Host model: declared units, instance heap
//! Layer 0: spyglass_foundation - Core types (Value, InstanceId, Error)
//! ```

pub use spyglass_debug as debug;
pub use spyglass_engine as engine;
pub use spyglass_foundation as foundation;
pub use spyglass_runtime as runtime;
pub use spyglass_storage as storage;
