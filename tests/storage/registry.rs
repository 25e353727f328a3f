//! Integration tests for the unit registry

use spyglass_foundation::{ErrorKind, SourceId, UnitKind, Value, Visibility};
use spyglass_storage::{ConstantDecl, DeclKind, MethodDecl, PropertyDecl, UnitDecl, UnitRegistry};

// =============================================================================
// Registration
// =============================================================================

#[test]
fn duplicate_names_are_rejected() {
    let mut reg = UnitRegistry::new();
    reg.register(UnitDecl::new_type("A", SourceId(1))).unwrap();
    let err = reg.register(UnitDecl::new_type("A", SourceId(2))).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateUnit(_)));
}

#[test]
fn references_must_exist() {
    let mut reg = UnitRegistry::new();
    let err = reg
        .register(UnitDecl::new_type("A", SourceId(1)).extends("Missing"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnitNotFound(_)));
}

#[test]
fn references_must_have_the_right_kind() {
    let mut reg = UnitRegistry::new();
    reg.register(UnitDecl::new_type("T", SourceId(1))).unwrap();
    let err = reg
        .register(UnitDecl::new_type("U", SourceId(2)).uses("T"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidComposition { .. }));
}

#[test]
fn ancestry() {
    let mut reg = UnitRegistry::new();
    let iface = reg.register(UnitDecl::new_interface("Named", SourceId(1))).unwrap();
    let base = reg
        .register(UnitDecl::new_type("Base", SourceId(2)).implements("Named"))
        .unwrap();
    let child = reg
        .register(UnitDecl::new_type("Child", SourceId(3)).extends("Base"))
        .unwrap();
    let other = reg.register(UnitDecl::new_type("Other", SourceId(4))).unwrap();

    assert_eq!(reg.ancestors(child), vec![child, base]);
    assert!(reg.is_subtype(child, iface));
    assert!(reg.is_related(base, child));
    assert!(!reg.is_related(child, other));
    assert_eq!(reg.get(iface).unwrap().kind(), UnitKind::Interface);
}

// =============================================================================
// Reflection
// =============================================================================

fn composed() -> (UnitRegistry, spyglass_foundation::UnitId) {
    let mut reg = UnitRegistry::new();
    reg.register(
        UnitDecl::new_interface("HasId", SourceId(1))
            .with_constant(ConstantDecl::new("PREFIX", Value::from("id-"))),
    )
    .unwrap();
    reg.register(
        UnitDecl::new_mixin("Timestamps", SourceId(2))
            .with_property(PropertyDecl::protected("created"))
            .with_method(MethodDecl::public("touch")),
    )
    .unwrap();
    reg.register(
        UnitDecl::new_type("Model", SourceId(3))
            .with_property(PropertyDecl::private("id"))
            .with_property(PropertyDecl::public("name")),
    )
    .unwrap();
    let user = reg
        .register(
            UnitDecl::new_type("User", SourceId(4))
                .extends("Model")
                .implements("HasId")
                .uses("Timestamps")
                .with_property(PropertyDecl::public("name").with_default(Value::from("anon"))),
        )
        .unwrap();
    (reg, user)
}

#[test]
fn reflection_flattens_mixins_into_composing_type() {
    let (reg, user) = composed();
    let members = reg.reflect(user);

    let created = members.iter().find(|m| &*m.name == "created").unwrap();
    assert_eq!(created.declaring, user);
    assert_eq!(created.source, SourceId(2));
    assert_eq!(created.visibility, Visibility::Protected);

    let touch = members.iter().find(|m| &*m.name == "touch").unwrap();
    assert_eq!(touch.kind, DeclKind::Method);
    assert_eq!(touch.source, SourceId(2));
}

#[test]
fn own_declarations_shadow_inherited_ones() {
    let (reg, user) = composed();
    let members = reg.reflect(user);
    let names: Vec<_> = members
        .iter()
        .filter(|m| &*m.name == "name" && m.kind == DeclKind::Property)
        .collect();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].source, SourceId(4));
    assert_eq!(names[0].value, Some(Value::from("anon")));
}

#[test]
fn interface_constants_come_last() {
    let (reg, user) = composed();
    let members = reg.reflect(user);
    let last = members.last().unwrap();
    assert_eq!(&*last.name, "PREFIX");
    assert_eq!(last.kind, DeclKind::Constant);
}

#[test]
fn declares_composed_looks_through_mixins() {
    let (reg, user) = composed();
    assert!(reg.declares_composed(user, "created", DeclKind::Property));
    assert!(!reg.declares_composed(user, "id", DeclKind::Property));
}
