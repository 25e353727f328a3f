//! Output assembly.
//!
//! Rendered fragments flow through an [`OutputAccumulator`], which keeps
//! small fragments inline and moves large ones to spill files until the
//! document is emitted.

mod accumulator;
mod config;
mod janitor;

pub use accumulator::{OutputAccumulator, TOKEN_DELIMITER};
pub use config::{DEFAULT_THRESHOLD_BYTES, DEFAULT_TTL, OutputConfig};
pub use janitor::{CHUNK_EXTENSION, CHUNK_PREFIX, ChunkJanitor, is_chunk_file, sweep};
