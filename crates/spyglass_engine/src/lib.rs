//! Inspection engine for Spyglass.
//!
//! This crate provides:
//! - [`ResourceGovernor`] - Time, memory, call, and nesting limits with a sticky [`Fuse`]
//! - [`IdentityTracker`] - Cycle detection by instance identity
//! - [`MemberExtractor`] - Ordered member listing with visibility bypass
//! - [`resolve_declaration_site`] - True declaration sites across mixins
//! - [`TypeRouter`] - Category dispatch producing [`RenderNode`] trees
//! - [`Presenter`] - Bottom-up rendering through a [`Renderer`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod allowlist;
pub mod config;
pub mod diagnostics;
pub mod governor;
pub mod identity;
pub mod introspect;
pub mod members;
pub mod provenance;
pub mod render;
pub mod router;

pub use config::{EnvSource, HostModel, SettingSource, Settings};
pub use diagnostics::{Diagnostics, MessageKey, Severity};
pub use governor::{FixedMemoryProbe, Fuse, Limits, MemoryProbe, ProcMemoryProbe, ResourceGovernor};
pub use identity::{IdentityKey, IdentityTracker};
pub use introspect::{InstanceShape, Introspector, PropertyRead, UnitInfo};
pub use members::{CallerScope, Member, MemberExtractor, MemberKind, MemberValue};
pub use provenance::{DeclarationSite, resolve_declaration_site};
pub use render::{Anchor, FragmentSink, InlineSink, Marker, Presenter, RenderNode, Renderer};
pub use router::TypeRouter;
