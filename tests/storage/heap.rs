//! Integration tests for the instance heap and host

use spyglass_foundation::{ErrorKind, SourceId, Value};
use spyglass_storage::{ClassRef, ClosureInfo, Host, PropertyDecl, Slot, UnitDecl};

fn host() -> Host {
    let mut host = Host::new();
    host.declare(
        UnitDecl::new_type("Point", SourceId(1))
            .with_property(PropertyDecl::public("x").with_default(Value::Int(0)))
            .with_property(PropertyDecl::public("y"))
            .with_property(PropertyDecl::public("origin").with_default(Value::Null).into_static()),
    )
    .unwrap();
    host
}

#[test]
fn instantiate_applies_defaults() {
    let mut host = host();
    let p = host.instantiate("Point").unwrap();
    let inst = host.instance(p).unwrap();
    assert_eq!(inst.slot("x"), Some(&Slot::Set(Value::Int(0))));
    assert_eq!(inst.slot("y"), Some(&Slot::Unset));
    assert_eq!(inst.slot("origin"), None);
}

#[test]
fn released_ids_go_stale() {
    let mut host = host();
    let p = host.instantiate("Point").unwrap();
    host.release(p).unwrap();

    let err = host.instance(p).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StaleInstance(_)));

    let q = host.instantiate("Point").unwrap();
    assert_eq!(q.index, p.index);
    assert_ne!(q.generation, p.generation);
    assert!(host.instance(p).is_err());
}

#[test]
fn unknown_types_and_mixins_cannot_be_instantiated() {
    let mut host = host();
    host.declare(UnitDecl::new_mixin("Mix", SourceId(2))).unwrap();
    assert!(matches!(
        host.instantiate("Nope").unwrap_err().kind,
        ErrorKind::UnitNotFound(_)
    ));
    assert!(host.instantiate("Mix").is_err());
}

#[test]
fn unloaded_and_closure_instances() {
    let mut host = host();
    let ghost = host.instantiate_unloaded("Ghost");
    assert_eq!(host.instance(ghost).unwrap().class, ClassRef::Unloaded("Ghost".into()));

    let f = host.closure(ClosureInfo {
        params: vec!["a".into()],
        ..ClosureInfo::default()
    });
    assert!(host.instance(f).unwrap().is_closure());
}

#[test]
fn statics_and_globals() {
    let mut host = host();
    let point = host.registry().lookup("Point").unwrap();
    assert_eq!(host.static_value(point, "origin"), Some(Value::Null));

    host.set_static("Point", "origin", Value::Int(5)).unwrap();
    assert_eq!(host.static_value(point, "origin"), Some(Value::Int(5)));

    host.set_global("answer", Value::Int(42));
    assert_eq!(host.globals().len(), 1);
}

#[test]
fn dynamic_properties_are_added() {
    let mut host = host();
    let p = host.instantiate("Point").unwrap();
    host.set(p, "extra", Value::from("dyn")).unwrap();
    host.unset(p, "x").unwrap();
    let inst = host.instance(p).unwrap();
    assert_eq!(inst.slot("extra"), Some(&Slot::Set(Value::from("dyn"))));
    assert_eq!(inst.slot("x"), Some(&Slot::Unset));
}
