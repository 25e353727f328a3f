//! Registry of resolved code units.
//!
//! Besides name resolution, the registry reproduces how a reflective host
//! reports members: members a type obtains through mixins are flattened into
//! the type and reported as declared by it, while still carrying the source
//! identity of the unit that textually declared them.

use std::collections::HashMap;
use std::sync::Arc;

use spyglass_foundation::{Error, ErrorKind, Result, SourceId, UnitId, UnitKind, Value, Visibility};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::{DeclKind, UnitDecl};

/// A registered unit with its references resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// Registry identity.
    pub id: UnitId,
    /// The original declaration.
    pub decl: UnitDecl,
    /// Resolved parent type.
    pub parent: Option<UnitId>,
    /// Resolved interfaces.
    pub interfaces: Vec<UnitId>,
    /// Resolved mixins, in declaration order.
    pub mixins: Vec<UnitId>,
}

impl Unit {
    /// Unit name.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.decl.name
    }

    /// Unit kind.
    #[must_use]
    pub fn kind(&self) -> UnitKind {
        self.decl.kind
    }

    /// Source identity.
    #[must_use]
    pub fn source(&self) -> SourceId {
        self.decl.source
    }
}

/// A member as a reflective host reports it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReflectedMember {
    /// Member name.
    pub name: Arc<str>,
    /// Member kind.
    pub kind: DeclKind,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Whether the member is static.
    pub is_static: bool,
    /// The unit the host reports as declaring the member.
    pub declaring: UnitId,
    /// Source identity of the unit that textually declares the member.
    pub source: SourceId,
    /// Method parameters.
    pub params: Vec<Arc<str>>,
    /// Whether a method exposes a debug member.
    pub debug: bool,
    /// Constant value or property default.
    pub value: Option<Value>,
}

/// Registry of declared units.
///
/// Serialized as its declarations in registration order. Loading replays
/// them through [`UnitRegistry::register`], so resolved references always
/// point at earlier units.
#[derive(Clone, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(into = "Vec<UnitDecl>", try_from = "Vec<UnitDecl>")
)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    by_name: HashMap<Arc<str>, UnitId>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration.
    ///
    /// Referenced units must already be registered, which keeps the parent
    /// and mixin graphs acyclic.
    ///
    /// # Errors
    /// Returns an error if the name is taken, a referenced unit is unknown,
    /// or a reference has the wrong kind.
    pub fn register(&mut self, decl: UnitDecl) -> Result<UnitId> {
        if self.by_name.contains_key(&decl.name) {
            return Err(Error::new(ErrorKind::DuplicateUnit(decl.name.to_string())));
        }

        let parent = match &decl.parent {
            Some(name) => Some(self.resolve(&decl, name, &[UnitKind::Type], "parent")?),
            None => None,
        };
        let mixins = decl
            .mixins
            .iter()
            .map(|name| self.resolve(&decl, name, &[UnitKind::Mixin], "mixin"))
            .collect::<Result<Vec<_>>>()?;
        let interfaces = decl
            .interfaces
            .iter()
            .map(|name| self.resolve(&decl, name, &[UnitKind::Interface], "interface"))
            .collect::<Result<Vec<_>>>()?;

        #[allow(clippy::cast_possible_truncation)]
        let id = UnitId(self.units.len() as u32);
        self.by_name.insert(decl.name.clone(), id);
        self.units.push(Unit {
            id,
            decl,
            parent,
            interfaces,
            mixins,
        });
        Ok(id)
    }

    fn resolve(
        &self,
        decl: &UnitDecl,
        name: &str,
        allowed: &[UnitKind],
        role: &str,
    ) -> Result<UnitId> {
        let id = self.lookup(name).ok_or_else(|| Error::unit_not_found(name))?;
        let kind = self.units[id.0 as usize].kind();
        if allowed.contains(&kind) {
            Ok(id)
        } else {
            Err(Error::new(ErrorKind::InvalidComposition {
                unit: decl.name.to_string(),
                target: name.to_string(),
                reason: format!("{kind} cannot be used as {role}"),
            }))
        }
    }

    /// Looks up a unit by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<UnitId> {
        self.by_name.get(name).copied()
    }

    /// Returns a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.0 as usize)
    }

    /// Returns the number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterates over all units in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Returns the unit followed by its parent chain.
    ///
    /// Stops at the first repeated unit.
    #[must_use]
    pub fn ancestors(&self, id: UnitId) -> Vec<UnitId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(unit) = current.and_then(|id| self.get(id)) {
            if chain.contains(&unit.id) {
                break;
            }
            chain.push(unit.id);
            current = unit.parent;
        }
        chain
    }

    /// Returns true if `unit` is `other`, descends from it, or implements it.
    #[must_use]
    pub fn is_subtype(&self, unit: UnitId, other: UnitId) -> bool {
        self.ancestors(unit).into_iter().any(|id| {
            id == other
                || self
                    .get(id)
                    .is_some_and(|u| u.interfaces.contains(&other))
        })
    }

    /// Returns true if one unit descends from the other.
    #[must_use]
    pub fn is_related(&self, a: UnitId, b: UnitId) -> bool {
        self.ancestors(a).contains(&b) || self.ancestors(b).contains(&a)
    }

    /// Returns true if the unit declares `name` itself or through any
    /// mixin it composes, at any depth.
    #[must_use]
    pub fn declares_composed(&self, unit: UnitId, name: &str, kind: DeclKind) -> bool {
        let mut pending = vec![unit];
        let mut seen = Vec::new();
        while let Some(id) = pending.pop() {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            let Some(u) = self.get(id) else { continue };
            if u.decl.declares(name, kind) {
                return true;
            }
            pending.extend(u.mixins.iter().copied());
        }
        false
    }

    /// Lists the members of a type the way a reflective host reports them.
    ///
    /// Own declarations shadow mixin ones, which shadow inherited ones.
    /// Properties of units flagged `hides_members` are omitted. Interface
    /// constants come last.
    #[must_use]
    pub fn reflect(&self, class: UnitId) -> Vec<ReflectedMember> {
        let mut out = Vec::new();
        let ancestors = self.ancestors(class);
        for &id in &ancestors {
            self.collect_flattened(id, id, &mut Vec::new(), &mut out);
        }
        for &id in &ancestors {
            let Some(unit) = self.get(id) else { continue };
            for &iface in &unit.interfaces {
                self.collect_interface_constants(iface, &mut Vec::new(), &mut out);
            }
        }
        out
    }

    fn collect_flattened(
        &self,
        unit: UnitId,
        reported: UnitId,
        seen: &mut Vec<UnitId>,
        out: &mut Vec<ReflectedMember>,
    ) {
        if seen.contains(&unit) {
            return;
        }
        seen.push(unit);
        let Some(u) = self.get(unit) else { return };
        let source = u.source();
        let hides_own = u.decl.hides_members && unit == reported;

        if !hides_own {
            for p in &u.decl.properties {
                push_unique(
                    out,
                    ReflectedMember {
                        name: p.name.clone(),
                        kind: DeclKind::Property,
                        visibility: p.visibility,
                        is_static: p.is_static,
                        declaring: reported,
                        source,
                        params: Vec::new(),
                        debug: false,
                        value: p.default.clone(),
                    },
                );
            }
        }
        for c in &u.decl.constants {
            push_unique(
                out,
                ReflectedMember {
                    name: c.name.clone(),
                    kind: DeclKind::Constant,
                    visibility: c.visibility,
                    is_static: true,
                    declaring: reported,
                    source,
                    params: Vec::new(),
                    debug: false,
                    value: Some(c.value.clone()),
                },
            );
        }
        for m in &u.decl.methods {
            push_unique(
                out,
                ReflectedMember {
                    name: m.name.clone(),
                    kind: DeclKind::Method,
                    visibility: m.visibility,
                    is_static: m.is_static,
                    declaring: reported,
                    source,
                    params: m.params.clone(),
                    debug: m.debug,
                    value: None,
                },
            );
        }
        for &mixin in &u.mixins {
            self.collect_flattened(mixin, reported, seen, out);
        }
    }

    fn collect_interface_constants(
        &self,
        iface: UnitId,
        seen: &mut Vec<UnitId>,
        out: &mut Vec<ReflectedMember>,
    ) {
        if seen.contains(&iface) {
            return;
        }
        seen.push(iface);
        let Some(u) = self.get(iface) else { return };
        for c in &u.decl.constants {
            push_unique(
                out,
                ReflectedMember {
                    name: c.name.clone(),
                    kind: DeclKind::Constant,
                    visibility: c.visibility,
                    is_static: true,
                    declaring: iface,
                    source: u.source(),
                    params: Vec::new(),
                    debug: false,
                    value: Some(c.value.clone()),
                },
            );
        }
        if let Some(parent) = u.parent {
            self.collect_interface_constants(parent, seen, out);
        }
    }
}

impl From<UnitRegistry> for Vec<UnitDecl> {
    fn from(registry: UnitRegistry) -> Self {
        registry.units.into_iter().map(|unit| unit.decl).collect()
    }
}

impl TryFrom<Vec<UnitDecl>> for UnitRegistry {
    type Error = Error;

    fn try_from(decls: Vec<UnitDecl>) -> Result<Self> {
        let mut registry = Self::new();
        for decl in decls {
            registry.register(decl)?;
        }
        Ok(registry)
    }
}

fn push_unique(out: &mut Vec<ReflectedMember>, member: ReflectedMember) {
    if !out
        .iter()
        .any(|m| m.kind == member.kind && m.name == member.name)
    {
        out.push(member);
    }
}
