//! Heap instances.

use std::sync::Arc;

use spyglass_foundation::{InstanceId, UnitId, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The class an instance was created from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClassRef {
    /// A registered type.
    Loaded(UnitId),
    /// A type whose definition was never loaded; only its name is known.
    Unloaded(Arc<str>),
}

/// Closure details.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClosureInfo {
    /// Parameter names.
    pub params: Vec<Arc<str>>,
    /// Bound receiver.
    pub bound: Option<InstanceId>,
    /// Definition site, such as `file.src:12`.
    pub defined_at: Arc<str>,
    /// Captured variables.
    pub captured: Vec<(Arc<str>, Value)>,
}

/// What an instance is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InstanceKind {
    /// A plain object.
    Plain,
    /// A closure object.
    Closure(ClosureInfo),
}

/// A property slot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Slot {
    /// Holds a value.
    Set(Value),
    /// Declared but never initialized, or explicitly unset.
    Unset,
}

impl Slot {
    /// Returns the held value.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Set(v) => Some(v),
            Self::Unset => None,
        }
    }
}

/// A live instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instance {
    /// Class of the instance.
    pub class: ClassRef,
    /// Plain object or closure.
    pub kind: InstanceKind,
    /// Property slots in insertion order, declared and dynamic alike.
    pub properties: Vec<(Arc<str>, Slot)>,
    /// Values exposed by debug-member providers.
    pub debug_values: Vec<(Arc<str>, Value)>,
}

impl Instance {
    /// Creates an instance with no properties.
    #[must_use]
    pub fn new(class: ClassRef, kind: InstanceKind) -> Self {
        Self {
            class,
            kind,
            properties: Vec::new(),
            debug_values: Vec::new(),
        }
    }

    /// Returns the registered class, if loaded.
    #[must_use]
    pub fn unit(&self) -> Option<UnitId> {
        match self.class {
            ClassRef::Loaded(id) => Some(id),
            ClassRef::Unloaded(_) => None,
        }
    }

    /// Returns true for closures.
    #[must_use]
    pub fn is_closure(&self) -> bool {
        matches!(self.kind, InstanceKind::Closure(_))
    }

    /// Returns a property slot.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.properties
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, slot)| slot)
    }

    /// Writes a property slot, appending it if new.
    pub fn put(&mut self, name: impl Into<Arc<str>>, slot: Slot) {
        let name = name.into();
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.properties.push((name, slot)),
        }
    }

    /// Sets a debug value, replacing one of the same name.
    pub fn put_debug(&mut self, name: impl Into<Arc<str>>, value: Value) {
        let name = name.into();
        match self.debug_values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.debug_values.push((name, value)),
        }
    }
}
