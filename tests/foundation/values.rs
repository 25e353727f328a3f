//! Integration tests for Value types
//!
//! Tests value construction, equality, and identity display.

use spyglass_foundation::{Category, Entry, InstanceId, Key, Opaque, ResourceHandle, Value};
use std::sync::Arc;

// =============================================================================
// Value Construction
// =============================================================================

#[test]
fn list_keys_are_sequential() {
    let v = Value::list([Value::from(1), Value::from("two"), Value::Null]);
    let entries = v.as_seq().unwrap();
    let keys: Vec<_> = entries.iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys, vec![Key::Index(0), Key::Index(1), Key::Index(2)]);
}

#[test]
fn assoc_preserves_order() {
    let v = Value::assoc([("b", Value::from(1)), ("a", Value::from(2))]);
    let names: Vec<String> = v.as_seq().unwrap().iter().map(|e| e.key.to_string()).collect();
    assert_eq!(names, vec!["b", "a"]);
}

#[test]
fn conversions() {
    assert_eq!(Value::from(7i32).as_int(), Some(7));
    assert_eq!(Value::from("s").as_str(), Some("s"));
    assert_eq!(Value::from(String::from("t")).as_str(), Some("t"));
    let id = InstanceId::new(3, 1);
    assert_eq!(Value::from(id).as_instance(), Some(id));
    assert!(Value::Null.is_null());
}

// =============================================================================
// Equality
// =============================================================================

#[test]
fn nan_equals_itself() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
}

#[test]
fn objects_compare_by_identity() {
    let a = Value::Object(InstanceId::new(0, 1));
    let b = Value::Object(InstanceId::new(1, 1));
    assert_ne!(a, b);
    assert_eq!(a, Value::Object(InstanceId::new(0, 1)));
}

#[test]
fn sequences_compare_structurally() {
    let a = Value::list([Value::from(1), Value::from(2)]);
    let b = Value::Seq(
        [
            Entry { key: Key::Index(0), value: Value::from(1) },
            Entry { key: Key::Index(1), value: Value::from(2) },
        ]
        .into_iter()
        .collect(),
    );
    assert_eq!(a, b);
}

#[test]
fn opaque_probe_is_optional() {
    let plain = Opaque::new("gmp");
    assert!(plain.probe().is_none());
    let probed = plain.with_probe(Arc::new(|| -> Option<Arc<str>> { Some(Arc::from("12345")) }));
    let label = probed.probe().and_then(|p| p());
    assert_eq!(label.as_deref(), Some("12345"));
}

#[test]
fn resource_debug() {
    let v = Value::Resource(ResourceHandle { kind: "stream".into(), id: 4 });
    assert_eq!(format!("{v:?}"), "resource(stream#4)");
}

// =============================================================================
// Identity and Categories
// =============================================================================

#[test]
fn instance_id_display() {
    assert_eq!(InstanceId::new(12, 3).to_string(), "#12");
    assert_eq!(InstanceId::null().to_string(), "#null");
    assert!(InstanceId::null().is_null());
}

#[test]
fn category_labels() {
    assert_eq!(Category::Sequence.label(), "array");
    assert_eq!(Category::PartialInstance.to_string(), "incomplete object");
    assert!(Category::Globals.is_composite());
    assert!(!Category::String.is_composite());
}
