//! Cycle detection by instance identity.
//!
//! The tracker is keyed by live-instance identity, never by content: two
//! distinct instances with identical members are not recursion.

use std::collections::HashMap;

use spyglass_foundation::InstanceId;

use crate::render::Anchor;

/// What the tracker remembers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// A heap instance.
    Instance(InstanceId),
    /// The whole-environment container.
    Globals,
}

/// Visited composites of one top-level traversal.
#[derive(Clone, Debug, Default)]
pub struct IdentityTracker {
    instances: HashMap<InstanceId, Anchor>,
    globals: Option<Anchor>,
}

impl IdentityTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was already visited.
    #[must_use]
    pub fn seen(&self, key: IdentityKey) -> bool {
        self.anchor_of(key).is_some()
    }

    /// Records a visit. The first anchor recorded for a key is kept.
    pub fn add(&mut self, key: IdentityKey, anchor: Anchor) {
        match key {
            IdentityKey::Instance(id) => {
                self.instances.entry(id).or_insert(anchor);
            }
            IdentityKey::Globals => {
                self.globals.get_or_insert(anchor);
            }
        }
    }

    /// Anchor of the node that first rendered the key.
    #[must_use]
    pub fn anchor_of(&self, key: IdentityKey) -> Option<Anchor> {
        match key {
            IdentityKey::Instance(id) => self.instances.get(&id).copied(),
            IdentityKey::Globals => self.globals,
        }
    }

    /// Number of visited keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len() + usize::from(self.globals.is_some())
    }

    /// Returns true if nothing was visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
