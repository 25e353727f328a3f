//! Host runtime model for Spyglass.
//!
//! This crate provides the reference host the engine introspects:
//! - [`UnitDecl`] - Declarations of types, mixins, and interfaces
//! - [`UnitRegistry`] - Resolved units plus reflective member flattening
//! - [`Heap`] - Generational instance allocation
//! - [`Host`] - Registry, heap, statics, and globals together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod heap;
pub mod host;
pub mod instance;
pub mod registry;
pub mod schema;

pub use heap::Heap;
pub use host::Host;
pub use instance::{ClassRef, ClosureInfo, Instance, InstanceKind, Slot};
pub use registry::{ReflectedMember, Unit, UnitRegistry};
pub use schema::{ConstantDecl, DeclKind, MethodDecl, PropertyDecl, UnitDecl};
