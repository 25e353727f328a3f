//! Member extraction.
//!
//! Lists an object's members in display order with their values, visibility
//! and true declaration site. Values are read through the introspector, so
//! protected and private state is visible; nothing is ever executed.

use std::fmt;
use std::sync::Arc;

use spyglass_foundation::{InstanceId, UnitId, Value, Visibility};
use spyglass_storage::{DeclKind, ReflectedMember};

use crate::allowlist;
use crate::config::Settings;
use crate::introspect::{InstanceShape, Introspector, PropertyRead};
use crate::provenance::{DeclarationSite, resolve_declaration_site};

/// What kind of member an entry is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    /// A property.
    Property,
    /// A value derived from a getter-style method.
    Getter,
    /// A constant.
    Constant,
    /// A method.
    Method,
    /// A value exposed by a debug provider.
    Debug,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Property => "property",
            Self::Getter => "getter",
            Self::Constant => "constant",
            Self::Method => "method",
            Self::Debug => "debug",
        })
    }
}

/// The value side of a member.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberValue {
    /// A readable value.
    Value(Value),
    /// Declared but uninitialized.
    Unset,
    /// Could not be derived without executing code.
    Unresolved,
    /// A method signature.
    Method {
        /// Parameter names.
        params: Vec<Arc<str>>,
    },
}

/// One extracted member.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// Member name.
    pub name: Arc<str>,
    /// Current value.
    pub value: MemberValue,
    /// Visibility.
    pub visibility: Visibility,
    /// Kind of member.
    pub kind: MemberKind,
    /// Where it was declared.
    pub origin: DeclarationSite,
    /// Belongs to the type rather than the instance.
    pub is_static: bool,
    /// Created at runtime rather than declared.
    pub is_synthetic: bool,
}

/// The code on whose behalf members are listed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CallerScope {
    /// Code outside any unit.
    #[default]
    Outside,
    /// Code inside a unit.
    Unit(UnitId),
}

/// Extracts members through an introspector.
pub struct MemberExtractor<'a> {
    host: &'a dyn Introspector,
    settings: &'a Settings,
    scope: CallerScope,
}

impl<'a> MemberExtractor<'a> {
    /// Creates an extractor.
    #[must_use]
    pub fn new(host: &'a dyn Introspector, settings: &'a Settings, scope: CallerScope) -> Self {
        Self {
            host,
            settings,
            scope,
        }
    }

    /// Lists members in display order: public, getters, protected, private,
    /// constants, methods, debug members.
    #[must_use]
    pub fn list_members(&self, id: InstanceId) -> Vec<Member> {
        match self.host.describe(id) {
            Some(InstanceShape::Object { class, .. }) => self.list_object(id, class),
            Some(InstanceShape::Partial { .. }) => self.dynamic_members(id, &[]),
            Some(InstanceShape::Closure(_)) | None => Vec::new(),
        }
    }

    fn list_object(&self, id: InstanceId, class: UnitId) -> Vec<Member> {
        let reflected = self.host.list_members(class);
        let mut properties = Vec::new();
        let mut constants = Vec::new();
        let mut methods = Vec::new();
        for m in &reflected {
            match m.kind {
                DeclKind::Property => properties.push(self.property(id, class, m)),
                DeclKind::Constant => constants.push(self.constant(m)),
                DeclKind::Method => methods.push(m),
            }
        }
        properties.extend(self.hidden_members(id, class, &properties));

        let declared: Vec<&str> = properties.iter().map(|m| &*m.name).collect();
        let dynamic = self.dynamic_members(id, &declared);

        let mut out = Vec::new();
        out.extend(
            properties
                .iter()
                .filter(|m| m.visibility == Visibility::Public)
                .cloned(),
        );
        out.extend(dynamic);

        if self.settings.analyse_getters {
            out.extend(methods.iter().filter_map(|m| self.getter(id, m)));
        }
        out.extend(
            properties
                .iter()
                .filter(|m| m.visibility == Visibility::Protected && self.allows(class, m))
                .cloned(),
        );
        out.extend(
            properties
                .into_iter()
                .filter(|m| m.visibility == Visibility::Private && self.allows(class, m)),
        );
        if self.settings.analyse_constants {
            out.extend(constants.into_iter().filter(|m| self.allows(class, m)));
        }
        if self.settings.analyse_methods {
            out.extend(
                methods
                    .iter()
                    .map(|m| self.method(m))
                    .filter(|m| self.allows(class, m)),
            );
        }
        if self.settings.analyse_debug_members {
            out.extend(self.debug_members(id, &methods));
        }
        out
    }

    /// Returns true if the member's visibility is enabled or in scope.
    fn allows(&self, class: UnitId, member: &Member) -> bool {
        match member.visibility {
            Visibility::Public => true,
            Visibility::Protected => {
                self.settings.analyse_protected
                    || matches!(self.scope, CallerScope::Unit(caller) if self.host.is_related(caller, class))
            }
            Visibility::Private => {
                self.settings.analyse_private
                    || matches!(self.scope, CallerScope::Unit(caller) if member.origin.unit() == Some(caller))
            }
        }
    }

    /// Reads a member's current value across any visibility boundary.
    #[must_use]
    pub fn resolve_value(&self, id: InstanceId, class: UnitId, member: &ReflectedMember) -> MemberValue {
        match member.kind {
            DeclKind::Property if member.is_static => self
                .host
                .static_value(class, &member.name)
                .map_or(MemberValue::Unset, MemberValue::Value),
            DeclKind::Property => match self.host.get_value(id, &member.name) {
                PropertyRead::Value(v) => MemberValue::Value(v),
                PropertyRead::Unset | PropertyRead::Missing => MemberValue::Unset,
            },
            DeclKind::Constant => member
                .value
                .clone()
                .map_or(MemberValue::Unresolved, MemberValue::Value),
            DeclKind::Method => MemberValue::Method {
                params: member.params.clone(),
            },
        }
    }

    fn property(&self, id: InstanceId, class: UnitId, m: &ReflectedMember) -> Member {
        Member {
            name: m.name.clone(),
            value: self.resolve_value(id, class, m),
            visibility: m.visibility,
            kind: MemberKind::Property,
            origin: resolve_declaration_site(self.host, m),
            is_static: m.is_static,
            is_synthetic: false,
        }
    }

    fn constant(&self, m: &ReflectedMember) -> Member {
        Member {
            name: m.name.clone(),
            value: m.value.clone().map_or(MemberValue::Unresolved, MemberValue::Value),
            visibility: m.visibility,
            kind: MemberKind::Constant,
            origin: resolve_declaration_site(self.host, m),
            is_static: true,
            is_synthetic: false,
        }
    }

    fn method(&self, m: &ReflectedMember) -> Member {
        Member {
            name: m.name.clone(),
            value: MemberValue::Method {
                params: m.params.clone(),
            },
            visibility: m.visibility,
            kind: MemberKind::Method,
            origin: resolve_declaration_site(self.host, m),
            is_static: m.is_static,
            is_synthetic: false,
        }
    }

    /// Synthesizes members for ancestors that hide theirs from reflection.
    fn hidden_members(&self, id: InstanceId, class: UnitId, declared: &[Member]) -> Vec<Member> {
        let mut out: Vec<Member> = Vec::new();
        for unit in self.host.ancestors(class) {
            let Some(info) = self.host.unit_info(unit) else {
                continue;
            };
            if !info.hides_members {
                continue;
            }
            for &name in allowlist::hidden_members(&info.name) {
                let taken = declared.iter().chain(&out).any(|m| &*m.name == name);
                if taken {
                    continue;
                }
                let value = match self.host.get_value(id, name) {
                    PropertyRead::Value(v) => MemberValue::Value(v),
                    PropertyRead::Unset | PropertyRead::Missing => MemberValue::Unset,
                };
                out.push(Member {
                    name: name.into(),
                    value,
                    visibility: allowlist::visibility_of(&info.name, name),
                    kind: MemberKind::Property,
                    origin: DeclarationSite::Unit {
                        id: info.id,
                        name: info.name.clone(),
                        kind: info.kind,
                    },
                    is_static: false,
                    is_synthetic: false,
                });
            }
        }
        out
    }

    /// Properties present on the instance that nothing declares.
    fn dynamic_members(&self, id: InstanceId, declared: &[&str]) -> Vec<Member> {
        self.host
            .instance_properties(id)
            .into_iter()
            .filter(|(name, _)| !declared.contains(&&**name))
            .map(|(name, read)| Member {
                name,
                value: match read {
                    PropertyRead::Value(v) => MemberValue::Value(v),
                    PropertyRead::Unset | PropertyRead::Missing => MemberValue::Unset,
                },
                visibility: Visibility::Public,
                kind: MemberKind::Property,
                origin: DeclarationSite::Instance,
                is_static: false,
                is_synthetic: true,
            })
            .collect()
    }

    /// Derives a getter value without calling the method.
    fn getter(&self, id: InstanceId, m: &ReflectedMember) -> Option<Member> {
        if m.visibility != Visibility::Public || m.is_static || !m.params.is_empty() {
            return None;
        }
        let candidates = getter_candidates(&m.name)?;
        let value = candidates
            .iter()
            .find_map(|name| match self.host.get_value(id, name) {
                PropertyRead::Value(v) => Some(MemberValue::Value(v)),
                PropertyRead::Unset => Some(MemberValue::Unset),
                PropertyRead::Missing => None,
            })
            .unwrap_or(MemberValue::Unresolved);
        Some(Member {
            name: format!("{}()", m.name).into(),
            value,
            visibility: Visibility::Public,
            kind: MemberKind::Getter,
            origin: resolve_declaration_site(self.host, m),
            is_static: false,
            is_synthetic: false,
        })
    }

    /// Values exposed by debug providers, attributed to the provider.
    fn debug_members(&self, id: InstanceId, methods: &[&ReflectedMember]) -> Vec<Member> {
        let Some(provider) = methods.iter().find(|m| m.debug) else {
            return Vec::new();
        };
        let origin = resolve_declaration_site(self.host, provider);
        self.host
            .debug_values(id)
            .into_iter()
            .map(|(name, value)| Member {
                name,
                value: MemberValue::Value(value),
                visibility: Visibility::Public,
                kind: MemberKind::Debug,
                origin: origin.clone(),
                is_static: false,
                is_synthetic: false,
            })
            .collect()
    }
}

/// Property names a getter-style method may expose, most likely first.
///
/// `getTotal` yields `total` then `getTotal`; `isOpen` yields `open` then
/// `isOpen`. Names without an uppercase letter after the prefix are not
/// getters.
#[must_use]
pub fn getter_candidates(method: &str) -> Option<Vec<String>> {
    let rest = ["get", "is", "has"]
        .iter()
        .find_map(|prefix| method.strip_prefix(prefix))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    let lower_camel: String = first.to_ascii_lowercase().to_string() + chars.as_str();
    Some(vec![lower_camel, method.to_string()])
}
