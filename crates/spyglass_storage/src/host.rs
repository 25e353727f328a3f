//! The reference host: declared units, live instances, statics and globals.

use std::sync::Arc;

use spyglass_foundation::{Error, ErrorKind, InstanceId, Result, UnitId, UnitKind, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::heap::Heap;
use crate::instance::{ClassRef, ClosureInfo, Instance, InstanceKind, Slot};
use crate::registry::UnitRegistry;
use crate::schema::{DeclKind, UnitDecl};

/// A complete host runtime.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Host {
    registry: UnitRegistry,
    heap: Heap,
    statics: Vec<(UnitId, Arc<str>, Value)>,
    globals: Vec<(Arc<str>, Value)>,
}

impl Host {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit.
    ///
    /// # Errors
    /// See [`UnitRegistry::register`].
    pub fn declare(&mut self, decl: UnitDecl) -> Result<UnitId> {
        self.registry.register(decl)
    }

    /// The unit registry.
    #[must_use]
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// The instance heap.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Returns a live instance.
    ///
    /// # Errors
    /// Returns an error for stale or unknown identities.
    pub fn instance(&self, id: InstanceId) -> Result<&Instance> {
        self.heap.get(id)
    }

    /// Creates an instance of a registered type.
    ///
    /// Declared instance properties start with their default, or unset when
    /// the declaration has none.
    ///
    /// # Errors
    /// Returns an error if the type is unknown or not instantiable.
    pub fn instantiate(&mut self, class: &str) -> Result<InstanceId> {
        let unit_id = self
            .registry
            .lookup(class)
            .ok_or_else(|| Error::unit_not_found(class))?;
        let kind = self
            .registry
            .get(unit_id)
            .map_or(UnitKind::Type, |u| u.kind());
        if kind != UnitKind::Type {
            return Err(Error::new(ErrorKind::InvalidComposition {
                unit: class.to_string(),
                target: class.to_string(),
                reason: format!("{kind} cannot be instantiated"),
            }));
        }

        let mut instance = Instance::new(ClassRef::Loaded(unit_id), InstanceKind::Plain);
        for member in self.registry.reflect(unit_id) {
            if member.kind == DeclKind::Property && !member.is_static {
                let slot = member.value.map_or(Slot::Unset, Slot::Set);
                instance.put(member.name, slot);
            }
        }
        Ok(self.heap.alloc(instance))
    }

    /// Creates an instance of a type whose definition is unavailable.
    pub fn instantiate_unloaded(&mut self, class: impl Into<Arc<str>>) -> InstanceId {
        self.heap.alloc(Instance::new(
            ClassRef::Unloaded(class.into()),
            InstanceKind::Plain,
        ))
    }

    /// Creates a closure object.
    pub fn closure(&mut self, info: ClosureInfo) -> InstanceId {
        self.heap.alloc(Instance::new(
            ClassRef::Unloaded("Closure".into()),
            InstanceKind::Closure(info),
        ))
    }

    /// Writes a property, creating a dynamic one if undeclared.
    ///
    /// # Errors
    /// Returns an error for stale or unknown identities.
    pub fn set(&mut self, id: InstanceId, name: impl Into<Arc<str>>, value: Value) -> Result<()> {
        self.heap.get_mut(id)?.put(name, Slot::Set(value));
        Ok(())
    }

    /// Marks a property as unset.
    ///
    /// # Errors
    /// Returns an error for stale or unknown identities.
    pub fn unset(&mut self, id: InstanceId, name: impl Into<Arc<str>>) -> Result<()> {
        self.heap.get_mut(id)?.put(name, Slot::Unset);
        Ok(())
    }

    /// Records a value exposed by a debug-member provider.
    ///
    /// # Errors
    /// Returns an error for stale or unknown identities.
    pub fn set_debug_value(
        &mut self,
        id: InstanceId,
        name: impl Into<Arc<str>>,
        value: Value,
    ) -> Result<()> {
        self.heap.get_mut(id)?.put_debug(name, value);
        Ok(())
    }

    /// Releases an instance.
    ///
    /// # Errors
    /// Returns an error for stale or unknown identities.
    pub fn release(&mut self, id: InstanceId) -> Result<()> {
        self.heap.release(id).map(|_| ())
    }

    /// Assigns a static property.
    ///
    /// # Errors
    /// Returns an error if the type is unknown.
    pub fn set_static(&mut self, class: &str, name: impl Into<Arc<str>>, value: Value) -> Result<()> {
        let unit = self
            .registry
            .lookup(class)
            .ok_or_else(|| Error::unit_not_found(class))?;
        let name = name.into();
        match self
            .statics
            .iter_mut()
            .find(|(u, n, _)| *u == unit && *n == name)
        {
            Some((_, _, existing)) => *existing = value,
            None => self.statics.push((unit, name, value)),
        }
        Ok(())
    }

    /// Reads a static property as seen from `class`.
    ///
    /// Assignments on the class or its ancestors win over declared defaults.
    #[must_use]
    pub fn static_value(&self, class: UnitId, name: &str) -> Option<Value> {
        let chain = self.registry.ancestors(class);
        chain
            .iter()
            .find_map(|unit| {
                self.statics
                    .iter()
                    .find(|(u, n, _)| u == unit && &**n == name)
                    .map(|(_, _, v)| v.clone())
            })
            .or_else(|| {
                self.registry
                    .reflect(class)
                    .into_iter()
                    .find(|m| m.kind == DeclKind::Property && m.is_static && &*m.name == name)
                    .map(|m| m.value.unwrap_or(Value::Null))
            })
    }

    /// Sets a global variable.
    pub fn set_global(&mut self, name: impl Into<Arc<str>>, value: Value) {
        let name = name.into();
        match self.globals.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.globals.push((name, value)),
        }
    }

    /// Global variables in definition order.
    #[must_use]
    pub fn globals(&self) -> &[(Arc<str>, Value)] {
        &self.globals
    }
}
