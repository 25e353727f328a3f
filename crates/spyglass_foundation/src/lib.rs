//! Core value graph types, identities, and errors for Spyglass.
//!
//! This crate provides:
//! - [`Value`] - The value graph node inspected by the engine
//! - [`InstanceId`] - Generational identities for live composite instances
//! - [`UnitId`] / [`SourceId`] - Identities for declared code units
//! - [`Category`], [`Visibility`], [`UnitKind`] - Classification enums
//! - [`Error`] - Rich error types with context
//! - [`SeqVec`] - Persistent vector used for sequence entries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod identity;
pub mod types;
pub mod value;

pub use collections::SeqVec;
pub use error::{Error, ErrorContext, ErrorKind, ResourceLimit};
pub use identity::{InstanceId, SourceId, UnitId};
pub use types::{Category, UnitKind, Visibility};
pub use value::{Entry, Key, Opaque, ResourceHandle, Value};

/// Result type alias for Spyglass operations.
pub type Result<T> = std::result::Result<T, Error>;
