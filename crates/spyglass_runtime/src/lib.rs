//! Inspector sessions, host snapshots, and CLI support for Spyglass.
//!
//! This crate provides:
//! - [`Inspector`] - Process-level entry point owning the fuse and chunk janitor
//! - [`Session`] - Per-request budgets, diagnostics, and output assembly
//! - [`HostSnapshot`] - Host state saved as `MessagePack` or JSON

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod inspector;
pub mod serialize;
pub mod session;

pub use inspector::Inspector;
pub use serialize::{HostSnapshot, SnapshotFormat, from_bytes, load_from_file, save_to_file, to_bytes};
pub use session::{OutputFormat, Session, SessionReport};
