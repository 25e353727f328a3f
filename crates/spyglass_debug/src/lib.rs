//! Diagnostics, renderers, and output assembly for Spyglass.
//!
//! This crate provides:
//! - [`DiagnosticLog`] - Bounded log of diagnostics mirrored to `tracing`
//! - [`TextRenderer`] / [`JsonRenderer`] - Renderers for the engine's render trees
//! - [`OutputAccumulator`] - Output assembly that spills large fragments to disk
//! - [`ChunkJanitor`] - Once-per-process sweep of stale spill files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diagnostics;
pub mod format;
pub mod output;

pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticStats};
pub use format::{DocumentFormat, JsonRenderer, TextRenderer, escape_control};
pub use output::{ChunkJanitor, OutputAccumulator, OutputConfig, TOKEN_DELIMITER};
