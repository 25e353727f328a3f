//! Instance storage with generational indices.
//!
//! The heap hands out [`InstanceId`]s whose generation changes whenever a
//! slot is reused, so identities recorded during a traversal can never alias
//! a newer instance.

// Allow u64 to usize casts - we target 64-bit systems
#![allow(clippy::cast_possible_truncation)]

use spyglass_foundation::{Error, ErrorKind, InstanceId, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// Generational instance heap.
///
/// Released indices go on a free list. Generations are odd while a slot is
/// alive and even while it is free. A deserialized heap is checked against
/// these rules before use.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(into = "HeapParts", try_from = "HeapParts")
)]
pub struct Heap {
    generations: Vec<u32>,
    slots: Vec<Option<Instance>>,
    free_list: Vec<u64>,
    live_count: usize,
}

impl Heap {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an instance and returns its identity.
    pub fn alloc(&mut self, instance: Instance) -> InstanceId {
        self.live_count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.slots[idx] = Some(instance);
            InstanceId::new(index, self.generations[idx])
        } else {
            let index = self.generations.len() as u64;
            self.generations.push(1);
            self.slots.push(Some(instance));
            InstanceId::new(index, 1)
        }
    }

    /// Releases an instance, returning it.
    ///
    /// # Errors
    /// Returns an error if the identity is stale or was never allocated.
    pub fn release(&mut self, id: InstanceId) -> Result<Instance> {
        self.validate(id)?;

        let idx = id.index as usize;
        let instance = self
            .slots
            .get_mut(idx)
            .and_then(Option::take)
            .ok_or_else(|| Error::instance_not_found(id))?;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_list.push(id.index);
        self.live_count -= 1;
        Ok(instance)
    }

    /// Checks that an identity refers to a live instance.
    ///
    /// # Errors
    /// Returns `StaleInstance` on a generation mismatch and
    /// `InstanceNotFound` for unknown or free slots.
    pub fn validate(&self, id: InstanceId) -> Result<()> {
        let idx = id.index as usize;
        let Some(&current) = self.generations.get(idx) else {
            return Err(Error::instance_not_found(id));
        };
        if current != id.generation {
            return Err(Error::stale_instance(id));
        }
        if current % 2 == 0 {
            return Err(Error::instance_not_found(id));
        }
        Ok(())
    }

    /// Returns true if the identity refers to a live instance.
    #[must_use]
    pub fn exists(&self, id: InstanceId) -> bool {
        self.validate(id).is_ok()
    }

    /// Returns a live instance.
    ///
    /// # Errors
    /// See [`Heap::validate`].
    pub fn get(&self, id: InstanceId) -> Result<&Instance> {
        self.validate(id)?;
        self.slots
            .get(id.index as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::instance_not_found(id))
    }

    /// Returns a live instance mutably.
    ///
    /// # Errors
    /// See [`Heap::validate`].
    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut Instance> {
        self.validate(id)?;
        self.slots
            .get_mut(id.index as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::instance_not_found(id))
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if nothing is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Iterates over live instances.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> + '_ {
        self.generations
            .iter()
            .zip(&self.slots)
            .enumerate()
            .filter_map(|(idx, (generation, slot))| {
                slot.as_ref()
                    .map(|inst| (InstanceId::new(idx as u64, *generation), inst))
            })
    }
}

/// Stored form of a [`Heap`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct HeapParts {
    generations: Vec<u32>,
    slots: Vec<Option<Instance>>,
    free_list: Vec<u64>,
    live_count: usize,
}

impl From<Heap> for HeapParts {
    fn from(heap: Heap) -> Self {
        Self {
            generations: heap.generations,
            slots: heap.slots,
            free_list: heap.free_list,
            live_count: heap.live_count,
        }
    }
}

impl TryFrom<HeapParts> for Heap {
    type Error = Error;

    fn try_from(parts: HeapParts) -> Result<Self> {
        let corrupt = |reason: String| Error::new(ErrorKind::Serialization(reason));

        if parts.generations.len() != parts.slots.len() {
            return Err(corrupt(format!(
                "heap has {} generations for {} slots",
                parts.generations.len(),
                parts.slots.len()
            )));
        }
        for (idx, (generation, slot)) in parts.generations.iter().zip(&parts.slots).enumerate() {
            if slot.is_some() != (generation % 2 == 1) {
                return Err(corrupt(format!(
                    "heap slot {idx} has generation {generation} out of step with its contents"
                )));
            }
        }

        let live = parts.slots.iter().filter(|slot| slot.is_some()).count();
        if live != parts.live_count {
            return Err(corrupt(format!(
                "heap records {} live instances but holds {live}",
                parts.live_count
            )));
        }

        let mut listed = vec![false; parts.slots.len()];
        for &index in &parts.free_list {
            let idx = index as usize;
            match parts.slots.get(idx) {
                Some(None) if !listed[idx] => listed[idx] = true,
                _ => {
                    return Err(corrupt(format!(
                        "heap free list entry {index} is not a free slot"
                    )));
                }
            }
        }

        Ok(Self {
            generations: parts.generations,
            slots: parts.slots,
            free_list: parts.free_list,
            live_count: parts.live_count,
        })
    }
}
