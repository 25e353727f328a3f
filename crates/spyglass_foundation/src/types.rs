//! Classification enums shared by every layer.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Runtime category of a value, as decided by the type router.
///
/// Categories are mutually exclusive; every value falls into exactly one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    /// Text value.
    String,
    /// 64-bit signed integer.
    Integer,
    /// The null value.
    Null,
    /// Ordered key/value sequence.
    Sequence,
    /// Instance of a loaded type (plain object or closure).
    Object,
    /// Instance whose type definition was never loaded.
    PartialInstance,
    /// The whole-environment container.
    Globals,
    /// Boolean value.
    Boolean,
    /// 64-bit floating point.
    Float,
    /// Host resource handle.
    Resource,
    /// Anything that fails every other test.
    Unknown,
}

impl Category {
    /// Returns true for categories the router descends into.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(
            self,
            Self::Sequence | Self::Object | Self::PartialInstance | Self::Globals
        )
    }

    /// Short label used in rendered output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Null => "null",
            Self::Sequence => "array",
            Self::Object => "object",
            Self::PartialInstance => "incomplete object",
            Self::Globals => "globals",
            Self::Boolean => "boolean",
            Self::Float => "float",
            Self::Resource => "resource",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Member visibility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Visibility {
    /// Visible everywhere.
    #[default]
    Public,
    /// Visible to the declaring unit and its relatives.
    Protected,
    /// Visible to the declaring unit only.
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        })
    }
}

/// Kind of a declared code unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnitKind {
    /// An instantiable type.
    Type,
    /// A reusable unit composed into types.
    Mixin,
    /// A contract implemented by types.
    Interface,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Mixin => "mixin",
            Self::Interface => "interface",
        })
    }
}
