//! Value graph node.
//!
//! Scalars and sequences are held inline. Objects are held by identity: a
//! [`Value::Object`] is a reference into the host heap, which is what makes
//! the graph able to contain cycles.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collections::SeqVec;
use crate::identity::InstanceId;

/// A node of the inspected value graph.
///
/// Values are cheaply cloneable; sequences use structural sharing.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// The null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Host resource handle (stream, socket, ...).
    Resource(ResourceHandle),
    /// Ordered key/value sequence with value semantics.
    Seq(SeqVec<Entry>),
    /// Reference to a live heap instance.
    Object(InstanceId),
    /// The whole-environment container.
    Globals,
    /// Host value with no primary category.
    #[cfg_attr(feature = "serde", serde(skip))]
    Opaque(Opaque),
}

/// Key of a sequence entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    /// Integer key.
    Index(i64),
    /// String key.
    Name(Arc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One entry of a sequence.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entry {
    /// Entry key.
    pub key: Key,
    /// Entry value.
    pub value: Value,
}

/// Host resource handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResourceHandle {
    /// Resource kind reported by the host ("stream", "curl", ...).
    pub kind: Arc<str>,
    /// Host-assigned handle number.
    pub id: u64,
}

/// Classification probe attached to an opaque value.
pub type ProbeFn = Arc<dyn Fn() -> Option<Arc<str>> + Send + Sync>;

/// A host value that failed every primary category test.
///
/// The optional probe is the secondary classification attempt. It is foreign
/// code, so callers must guard it.
#[derive(Clone)]
pub struct Opaque {
    /// Label the host attached to the value.
    pub label: Arc<str>,
    probe: Option<ProbeFn>,
}

impl Opaque {
    /// Creates an opaque value with no probe.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            label: label.into(),
            probe: None,
        }
    }

    /// Attaches a secondary classification probe.
    #[must_use]
    pub fn with_probe(mut self, probe: ProbeFn) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Returns the probe, if any.
    #[must_use]
    pub fn probe(&self) -> Option<&ProbeFn> {
        self.probe.as_ref()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("label", &self.label)
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

impl Value {
    /// Builds a list-style sequence with integer keys starting at zero.
    #[must_use]
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Self::Seq(
            items
                .into_iter()
                .zip(0_i64..)
                .map(|(value, i)| Entry {
                    key: Key::Index(i),
                    value,
                })
                .collect(),
        )
    }

    /// Builds a sequence with string keys, preserving order.
    #[must_use]
    pub fn assoc<K, I>(entries: I) -> Self
    where
        K: Into<Arc<str>>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Seq(
            entries
                .into_iter()
                .map(|(key, value)| Entry {
                    key: Key::Name(key.into()),
                    value,
                })
                .collect(),
        )
    }

    /// Returns true if this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract an instance reference.
    #[must_use]
    pub const fn as_instance(&self) -> Option<InstanceId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Attempts to extract the entries of a sequence.
    #[must_use]
    pub const fn as_seq(&self) -> Option<&SeqVec<Entry>> {
        match self {
            Self::Seq(entries) => Some(entries),
            _ => None,
        }
    }
}

// Float comparison uses bit equality so NaN equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) | (Self::Globals, Self::Globals) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Resource(a), Self::Resource(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a.label == b.label,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Resource(r) => write!(f, "resource({}#{})", r.kind, r.id),
            Self::Seq(entries) => {
                let mut map = f.debug_map();
                for entry in entries {
                    map.entry(&entry.key, &entry.value);
                }
                map.finish()
            }
            Self::Object(id) => write!(f, "{id:?}"),
            Self::Globals => write!(f, "<globals>"),
            Self::Opaque(o) => write!(f, "{o:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<InstanceId> for Value {
    fn from(id: InstanceId) -> Self {
        Self::Object(id)
    }
}
