//! Declaration-site resolution.
//!
//! Reflective hosts report members obtained through mixins as declared by the
//! composing type. The source identity the member carries still points at the
//! unit that textually declares it, which is enough to find the real site.

use std::fmt;
use std::sync::Arc;

use spyglass_foundation::{UnitId, UnitKind};
use spyglass_storage::ReflectedMember;

use crate::introspect::Introspector;

/// Where a member was declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclarationSite {
    /// A declared unit.
    Unit {
        /// Unit identity.
        id: UnitId,
        /// Unit name.
        name: Arc<str>,
        /// Unit kind.
        kind: UnitKind,
    },
    /// Several sibling mixins declare the member; the host cannot tell which
    /// one supplied it.
    Indeterminate,
    /// Created on the instance at runtime.
    Instance,
}

impl DeclarationSite {
    /// The unit, if determined.
    #[must_use]
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::Unit { id, .. } => Some(*id),
            Self::Indeterminate | Self::Instance => None,
        }
    }
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit { name, kind, .. } => write!(f, "{kind} {name}"),
            Self::Indeterminate => write!(f, "indeterminate"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

/// Finds the unit that really declares `member`.
#[must_use]
pub fn resolve_declaration_site(host: &dyn Introspector, member: &ReflectedMember) -> DeclarationSite {
    let Some(declaring) = host.declaring_type(member) else {
        return DeclarationSite::Indeterminate;
    };
    if declaring.source == member.source {
        return site(host, declaring.id);
    }
    search_layer(host, &declaring.mixins, member)
}

fn search_layer(host: &dyn Introspector, layer: &[UnitId], member: &ReflectedMember) -> DeclarationSite {
    let mut candidates = layer
        .iter()
        .copied()
        .filter(|&m| host.declares_composed(m, &member.name, member.kind));

    let (Some(only), None) = (candidates.next(), candidates.next()) else {
        return DeclarationSite::Indeterminate;
    };
    if host.declares(only, &member.name, member.kind) {
        return site(host, only);
    }
    match host.unit_info(only) {
        Some(info) => search_layer(host, &info.mixins, member),
        None => DeclarationSite::Indeterminate,
    }
}

fn site(host: &dyn Introspector, id: UnitId) -> DeclarationSite {
    host.unit_info(id)
        .map_or(DeclarationSite::Indeterminate, |info| DeclarationSite::Unit {
            id,
            name: info.name,
            kind: info.kind,
        })
}
