//! Identities for live instances and declared code units.
//!
//! Instance identity is what the engine uses for cycle detection. Two
//! instances with identical content still have distinct identities.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Instance identifier with generational index for stale reference detection.
///
/// The generation counter increments when a heap slot is reused after the
/// instance living there was released, so an identity recorded earlier can
/// never alias a newer instance.
///
/// # Layout
/// - `index`: 64-bit index into instance storage
/// - `generation`: 32-bit generation counter
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InstanceId {
    /// Index into instance storage.
    pub index: u64,
    /// Generation counter for stale reference detection.
    pub generation: u32,
}

impl InstanceId {
    /// Creates a new instance ID with the given index and generation.
    #[must_use]
    pub const fn new(index: u64, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns a sentinel value representing "no instance".
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u64::MAX,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u64::MAX
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "InstanceId(null)")
        } else {
            write!(f, "InstanceId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "#null")
        } else {
            write!(f, "#{}", self.index)
        }
    }
}

/// Identifier of a declared code unit (type, mixin, or interface).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitId(pub u32);

impl UnitId {
    /// Returns the raw index of this unit.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

/// Identity of the code unit a declaration textually lives in.
///
/// Hosts that flatten composed members into the composing type still report
/// the source identity of the unit that syntactically declared them. Several
/// units may share one source.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceId(pub u32);

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}
