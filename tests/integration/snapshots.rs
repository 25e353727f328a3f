//! Snapshot persistence feeding inspection

use std::sync::Arc;

use spyglass::engine::{FixedMemoryProbe, Settings};
use spyglass::foundation::{ErrorKind, SourceId, Value};
use spyglass::runtime::{
    HostSnapshot, Inspector, SnapshotFormat, from_bytes, load_from_file, save_to_file, to_bytes,
};
use spyglass::storage::{ClosureInfo, Host, MethodDecl, PropertyDecl, UnitDecl};

fn shop() -> HostSnapshot {
    let mut host = Host::new();
    host.declare(
        UnitDecl::new_mixin("Timestamps", SourceId(1))
            .with_property(PropertyDecl::protected("created").with_default(Value::Int(0))),
    )
    .unwrap();
    host.declare(
        UnitDecl::new_type("Cart", SourceId(2))
            .uses("Timestamps")
            .with_property(PropertyDecl::public("items"))
            .with_property(PropertyDecl::private("owner"))
            .with_method(MethodDecl::public("total")),
    )
    .unwrap();
    let cart = host.instantiate("Cart").unwrap();
    let hook = host.closure(ClosureInfo {
        params: vec!["event".into()],
        bound: Some(cart),
        defined_at: "cart.src:40".into(),
        captured: Vec::new(),
    });
    host.set(cart, "items", Value::list([Value::from("apple"), Value::Int(3), Value::Object(hook)]))
        .unwrap();
    host.set_global("cart", Value::Object(cart));
    HostSnapshot::new(host, "cart", Value::Object(cart))
}

fn inspector() -> Inspector {
    Inspector::new(Settings::default().with_chunk_threshold(0))
        .with_probe(Arc::new(FixedMemoryProbe::new(0)))
}

fn render(snapshot: &HostSnapshot) -> String {
    let mut out = Vec::new();
    inspector()
        .inspect(&snapshot.host, &snapshot.name, &snapshot.root, &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn loaded_snapshot_renders_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let original = shop();
    let expected = render(&original);

    for file in ["cart.msgpack", "cart.json"] {
        let path = dir.path().join(file);
        save_to_file(&original, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(render(&loaded), expected, "{file}");
    }
}

#[test]
fn snapshot_rendering_shows_mixin_origin() {
    let text = render(&shop());
    assert!(text.contains("protected created (integer) 0 <mixin Timestamps>"));
    assert!(text.contains("private owner (uninitialized)"));
    assert!(text.contains("public total (method) total()"));

    let bound = text.lines().find(|l| l.trim_start().starts_with("bound (Cart)")).unwrap();
    assert!(bound.ends_with("*RECURSION* -> #n1"));
}

fn tampered(snapshot: &HostSnapshot, edit: impl FnOnce(&mut serde_json::Value)) -> Vec<u8> {
    let bytes = to_bytes(snapshot, SnapshotFormat::Json).unwrap();
    let mut doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    edit(&mut doc);
    serde_json::to_vec(&doc).unwrap()
}

fn assert_rejected(bytes: &[u8]) {
    let err = from_bytes(bytes, SnapshotFormat::Json).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)), "{err}");
}

#[test]
fn snapshot_with_self_parent_is_rejected() {
    let mut host = Host::new();
    host.declare(UnitDecl::new_type("Node", SourceId(1)).with_property(PropertyDecl::public("next")))
        .unwrap();
    let node = host.instantiate("Node").unwrap();
    let snapshot = HostSnapshot::new(host, "node", Value::Object(node));

    let bytes = tampered(&snapshot, |doc| {
        doc["host"]["registry"][0]["parent"] = "Node".into();
    });
    assert_rejected(&bytes);
}

#[test]
fn snapshot_with_mixin_cycle_is_rejected() {
    let bytes = tampered(&shop(), |doc| {
        doc["host"]["registry"][0]["mixins"] = serde_json::json!(["Timestamps"]);
    });
    assert_rejected(&bytes);

    let bytes = tampered(&shop(), |doc| {
        let units = doc["host"]["registry"].as_array_mut().unwrap();
        units.swap(0, 1);
    });
    assert_rejected(&bytes);
}

#[test]
fn snapshot_with_inconsistent_heap_is_rejected() {
    let bytes = tampered(&shop(), |doc| {
        let generations = doc["host"]["heap"]["generations"].as_array_mut().unwrap();
        generations.push(1.into());
        generations.push(1.into());
        doc["root"] = serde_json::json!({ "Object": { "index": 3, "generation": 1 } });
    });
    assert_rejected(&bytes);

    let bytes = tampered(&shop(), |doc| {
        doc["host"]["heap"]["live_count"] = 0.into();
    });
    assert_rejected(&bytes);

    let bytes = tampered(&shop(), |doc| {
        doc["host"]["heap"]["free_list"] = serde_json::json!([99]);
    });
    assert_rejected(&bytes);
}
