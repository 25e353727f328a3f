//! Visibility-bypassing access to a host runtime.
//!
//! The engine never touches host storage directly. Everything it learns about
//! instances and their declarations comes through [`Introspector`], which a
//! host binding implements. The reference binding is [`spyglass_storage::Host`].

use std::sync::Arc;

use spyglass_foundation::{InstanceId, SourceId, UnitId, UnitKind, Value};
use spyglass_storage::{ClassRef, ClosureInfo, DeclKind, Host, InstanceKind, ReflectedMember, Slot};

/// Facts about a declared unit.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitInfo {
    /// Unit identity.
    pub id: UnitId,
    /// Unit name.
    pub name: Arc<str>,
    /// Unit kind.
    pub kind: UnitKind,
    /// Identity of the code unit it is defined in.
    pub source: SourceId,
    /// Parent type.
    pub parent: Option<UnitId>,
    /// Composed mixins, in declaration order.
    pub mixins: Vec<UnitId>,
    /// The host hides this unit's properties from reflection.
    pub hides_members: bool,
}

/// What an instance is, as far as the host can tell.
#[derive(Clone, Debug, PartialEq)]
pub enum InstanceShape {
    /// Instance of a loaded type.
    Object {
        /// The class.
        class: UnitId,
        /// Class name.
        class_name: Arc<str>,
    },
    /// Instance whose class definition is unavailable.
    Partial {
        /// Recorded class name.
        class_name: Arc<str>,
    },
    /// A closure.
    Closure(ClosureInfo),
}

/// Result of reading a property.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyRead {
    /// The property holds a value.
    Value(Value),
    /// The property exists but is uninitialized.
    Unset,
    /// No such property on the instance.
    Missing,
}

/// Host introspection capability.
pub trait Introspector {
    /// Describes a live instance; `None` for stale identities.
    fn describe(&self, id: InstanceId) -> Option<InstanceShape>;

    /// Describes a unit.
    fn unit_info(&self, unit: UnitId) -> Option<UnitInfo>;

    /// Members of a class as the host reflects them.
    fn list_members(&self, class: UnitId) -> Vec<ReflectedMember>;

    /// Reads a property regardless of its visibility.
    fn get_value(&self, id: InstanceId, name: &str) -> PropertyRead;

    /// Reads a static property as seen from `class`.
    fn static_value(&self, class: UnitId, name: &str) -> Option<Value>;

    /// Every property slot an instance holds, declared or not.
    fn instance_properties(&self, id: InstanceId) -> Vec<(Arc<str>, PropertyRead)>;

    /// Values exposed by debug-member providers.
    fn debug_values(&self, id: InstanceId) -> Vec<(Arc<str>, Value)>;

    /// Returns true if the unit itself declares the member.
    fn declares(&self, unit: UnitId, name: &str, kind: DeclKind) -> bool;

    /// Returns true if the unit declares the member itself or through any
    /// mixin it composes.
    fn declares_composed(&self, unit: UnitId, name: &str, kind: DeclKind) -> bool;

    /// The unit followed by its parent chain.
    fn ancestors(&self, unit: UnitId) -> Vec<UnitId>;

    /// Returns true if one unit descends from the other.
    fn is_related(&self, a: UnitId, b: UnitId) -> bool;

    /// Global variables.
    fn globals(&self) -> Vec<(Arc<str>, Value)>;

    /// The unit the host reports as declaring a member.
    fn declaring_type(&self, member: &ReflectedMember) -> Option<UnitInfo> {
        self.unit_info(member.declaring)
    }
}

fn read_slot(slot: &Slot) -> PropertyRead {
    match slot {
        Slot::Set(value) => PropertyRead::Value(value.clone()),
        Slot::Unset => PropertyRead::Unset,
    }
}

impl Introspector for Host {
    fn describe(&self, id: InstanceId) -> Option<InstanceShape> {
        let instance = self.instance(id).ok()?;
        Some(match (&instance.kind, &instance.class) {
            (InstanceKind::Closure(info), _) => InstanceShape::Closure(info.clone()),
            (InstanceKind::Plain, ClassRef::Loaded(class)) => InstanceShape::Object {
                class: *class,
                class_name: self.registry().get(*class)?.name().clone(),
            },
            (InstanceKind::Plain, ClassRef::Unloaded(name)) => InstanceShape::Partial {
                class_name: name.clone(),
            },
        })
    }

    fn unit_info(&self, unit: UnitId) -> Option<UnitInfo> {
        let u = self.registry().get(unit)?;
        Some(UnitInfo {
            id: u.id,
            name: u.name().clone(),
            kind: u.kind(),
            source: u.source(),
            parent: u.parent,
            mixins: u.mixins.clone(),
            hides_members: u.decl.hides_members,
        })
    }

    fn list_members(&self, class: UnitId) -> Vec<ReflectedMember> {
        self.registry().reflect(class)
    }

    fn get_value(&self, id: InstanceId, name: &str) -> PropertyRead {
        self.instance(id)
            .ok()
            .and_then(|inst| inst.slot(name))
            .map_or(PropertyRead::Missing, read_slot)
    }

    fn static_value(&self, class: UnitId, name: &str) -> Option<Value> {
        Host::static_value(self, class, name)
    }

    fn instance_properties(&self, id: InstanceId) -> Vec<(Arc<str>, PropertyRead)> {
        self.instance(id)
            .map(|inst| {
                inst.properties
                    .iter()
                    .map(|(name, slot)| (name.clone(), read_slot(slot)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn debug_values(&self, id: InstanceId) -> Vec<(Arc<str>, Value)> {
        self.instance(id)
            .map(|inst| inst.debug_values.clone())
            .unwrap_or_default()
    }

    fn declares(&self, unit: UnitId, name: &str, kind: DeclKind) -> bool {
        self.registry()
            .get(unit)
            .is_some_and(|u| u.decl.declares(name, kind))
    }

    fn declares_composed(&self, unit: UnitId, name: &str, kind: DeclKind) -> bool {
        self.registry().declares_composed(unit, name, kind)
    }

    fn ancestors(&self, unit: UnitId) -> Vec<UnitId> {
        self.registry().ancestors(unit)
    }

    fn is_related(&self, a: UnitId, b: UnitId) -> bool {
        self.registry().is_related(a, b)
    }

    fn globals(&self) -> Vec<(Arc<str>, Value)> {
        Host::globals(self).to_vec()
    }
}
