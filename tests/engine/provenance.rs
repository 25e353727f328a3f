//! Integration tests for declaration-site resolution

use spyglass_engine::{DeclarationSite, resolve_declaration_site};
use spyglass_foundation::{SourceId, UnitKind, Value};
use spyglass_storage::{DeclKind, Host, PropertyDecl, ReflectedMember, UnitDecl};

fn property(host: &Host, class: &str, name: &str) -> ReflectedMember {
    let id = host.registry().lookup(class).unwrap();
    host.registry()
        .reflect(id)
        .into_iter()
        .find(|m| &*m.name == name && m.kind == DeclKind::Property)
        .unwrap()
}

fn site_name(site: &DeclarationSite) -> Option<String> {
    match site {
        DeclarationSite::Unit { name, .. } => Some(name.to_string()),
        _ => None,
    }
}

#[test]
fn own_declaration_wins_over_mixin() {
    let mut host = Host::new();
    host.declare(UnitDecl::new_mixin("Audit", SourceId(10)).with_property(PropertyDecl::public("by")))
        .unwrap();
    host.declare(
        UnitDecl::new_type("Order", SourceId(1))
            .uses("Audit")
            .with_property(PropertyDecl::public("by")),
    )
    .unwrap();
    let site = resolve_declaration_site(&host, &property(&host, "Order", "by"));
    assert_eq!(site_name(&site).as_deref(), Some("Order"));
}

#[test]
fn mixin_member_resolves_to_mixin() {
    let mut host = Host::new();
    host.declare(
        UnitDecl::new_mixin("Audit", SourceId(10))
            .with_property(PropertyDecl::protected("by").with_default(Value::from("system"))),
    )
    .unwrap();
    host.declare(UnitDecl::new_type("Order", SourceId(1)).uses("Audit"))
        .unwrap();

    let member = property(&host, "Order", "by");
    let order = host.registry().lookup("Order").unwrap();
    assert_eq!(member.declaring, order);

    let site = resolve_declaration_site(&host, &member);
    assert!(matches!(site, DeclarationSite::Unit { kind: UnitKind::Mixin, .. }));
    assert_eq!(site_name(&site).as_deref(), Some("Audit"));
}

#[test]
fn mixin_of_parent() {
    let mut host = Host::new();
    host.declare(UnitDecl::new_mixin("Audit", SourceId(10)).with_property(PropertyDecl::public("by")))
        .unwrap();
    host.declare(UnitDecl::new_type("Base", SourceId(1)).uses("Audit"))
        .unwrap();
    host.declare(UnitDecl::new_type("Order", SourceId(2)).extends("Base"))
        .unwrap();
    let site = resolve_declaration_site(&host, &property(&host, "Order", "by"));
    assert_eq!(site_name(&site).as_deref(), Some("Audit"));
}

#[test]
fn sibling_mixins_are_indeterminate() {
    let mut host = Host::new();
    host.declare(UnitDecl::new_mixin("Left", SourceId(10)).with_property(PropertyDecl::public("x")))
        .unwrap();
    host.declare(UnitDecl::new_mixin("Right", SourceId(11)).with_property(PropertyDecl::public("x")))
        .unwrap();
    host.declare(UnitDecl::new_type("Both", SourceId(1)).uses("Left").uses("Right"))
        .unwrap();
    let site = resolve_declaration_site(&host, &property(&host, "Both", "x"));
    assert_eq!(site, DeclarationSite::Indeterminate);
    assert_eq!(site.unit(), None);
}
