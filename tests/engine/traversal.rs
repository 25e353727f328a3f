//! Integration tests for tree building

use std::sync::Arc;

use spyglass_engine::{
    FixedMemoryProbe, Fuse, Limits, Marker, MessageKey, RenderNode, ResourceGovernor, Settings,
    TypeRouter,
};
use spyglass_foundation::{Category, SourceId, Value};
use spyglass_storage::{Host, PropertyDecl, UnitDecl};

type Log = Vec<(MessageKey, Vec<String>)>;

fn governor(max_depth: usize) -> ResourceGovernor {
    ResourceGovernor::with_probe(
        Limits {
            max_runtime: None,
            memory_limit: 0,
            min_memory_left: 0,
            max_calls: 0,
            max_depth,
        },
        Arc::new(Fuse::new()),
        Arc::new(FixedMemoryProbe::new(0)),
    )
}

fn chain_host(len: usize) -> (Host, Vec<spyglass_foundation::InstanceId>) {
    let mut host = Host::new();
    host.declare(UnitDecl::new_type("Link", SourceId(1)).with_property(PropertyDecl::public("next")))
        .unwrap();
    let ids: Vec<_> = (0..len).map(|_| host.instantiate("Link").unwrap()).collect();
    for pair in ids.windows(2) {
        host.set(pair[0], "next", Value::Object(pair[1])).unwrap();
    }
    (host, ids)
}

fn build(host: &Host, gov: &mut ResourceGovernor, value: &Value) -> RenderNode {
    let settings = Settings::default();
    let mut diag = Log::new();
    TypeRouter::new(host, &settings, gov, &mut diag).dispatch("root", value)
}

fn markers(tree: &RenderNode) -> (usize, usize) {
    let (mut recursion, mut truncated) = (0, 0);
    tree.walk(&mut |n, _| match n.marker {
        Marker::Recursion(_) => recursion += 1,
        Marker::Truncated => truncated += 1,
        _ => {}
    });
    (recursion, truncated)
}

// =============================================================================
// Shape
// =============================================================================

#[test]
fn nested_objects_become_nested_composites() {
    let mut host = Host::new();
    host.declare(UnitDecl::new_type("Leaf", SourceId(3)).with_property(PropertyDecl::public("v")))
        .unwrap();
    host.declare(UnitDecl::new_type("Mid", SourceId(2)).with_property(PropertyDecl::public("leaf")))
        .unwrap();
    host.declare(UnitDecl::new_type("Top", SourceId(1)).with_property(PropertyDecl::public("mid")))
        .unwrap();
    let leaf = host.instantiate("Leaf").unwrap();
    let mid = host.instantiate("Mid").unwrap();
    let top = host.instantiate("Top").unwrap();
    host.set(leaf, "v", Value::Int(7)).unwrap();
    host.set(mid, "leaf", Value::Object(leaf)).unwrap();
    host.set(top, "mid", Value::Object(mid)).unwrap();

    let mut gov = governor(5);
    let tree = build(&host, &mut gov, &Value::Object(top));

    let mut composites = 0;
    let mut leaves = 0;
    tree.walk(&mut |n, _| {
        if n.is_composite() {
            composites += 1;
        } else {
            leaves += 1;
        }
    });
    assert_eq!((composites, leaves), (3, 1));
    assert_eq!(markers(&tree), (0, 0));
    assert_eq!(gov.deepest(), 3);

    let v = &tree.children[0].children[0].children[0];
    assert_eq!(v.category, Category::Integer);
    assert_eq!(v.summary, "7");
}

#[test]
fn self_reference_is_marked_once() {
    let (mut host, ids) = chain_host(1);
    host.set(ids[0], "next", Value::Object(ids[0])).unwrap();

    let mut gov = governor(10);
    let tree = build(&host, &mut gov, &Value::Object(ids[0]));
    assert_eq!(markers(&tree), (1, 0));
    assert_eq!(tree.children[0].marker, Marker::Recursion(tree.anchor.unwrap()));
}

#[test]
fn cycle_through_a_sequence() {
    let (mut host, ids) = chain_host(2);
    host.set(ids[1], "next", Value::list([Value::Int(1), Value::Object(ids[0])]))
        .unwrap();

    let mut gov = governor(10);
    let tree = build(&host, &mut gov, &Value::Object(ids[0]));
    assert_eq!(markers(&tree), (1, 0));
}

#[test]
fn shared_reference_without_cycle_is_marked() {
    let (mut host, ids) = chain_host(1);
    let pair = Value::list([Value::Object(ids[0]), Value::Object(ids[0])]);
    host.set(ids[0], "next", Value::Null).unwrap();

    let mut gov = governor(10);
    let tree = build(&host, &mut gov, &pair);
    assert!(tree.children[0].is_composite());
    assert!(matches!(tree.children[1].marker, Marker::Recursion(_)));
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn depth_limit_truncates_once() {
    for max_depth in [1, 2, 4] {
        let (host, ids) = chain_host(8);
        let mut gov = governor(max_depth);
        let tree = build(&host, &mut gov, &Value::Object(ids[0]));
        assert_eq!(markers(&tree), (0, 1), "max_depth {max_depth}");
        assert_eq!(gov.deepest(), max_depth + 1);
        assert_eq!(gov.depth(), 0);
    }
}

#[test]
fn tripped_fuse_renders_nothing() {
    let (host, ids) = chain_host(3);
    let mut gov = governor(10);
    gov.fuse().trip();
    let tree = build(&host, &mut gov, &Value::Object(ids[0]));
    assert_eq!(tree.marker, Marker::Broken);
    assert_eq!(tree.count(), 1);
}

#[test]
fn repeated_traversal_is_identical() {
    let (mut host, ids) = chain_host(4);
    host.set(ids[3], "next", Value::Object(ids[1])).unwrap();

    let first = build(&host, &mut governor(10), &Value::Object(ids[0]));
    let second = build(&host, &mut governor(10), &Value::Object(ids[0]));
    assert_eq!(first, second);
}

#[test]
fn stale_reference_is_reported() {
    let (mut host, ids) = chain_host(1);
    host.release(ids[0]).unwrap();

    let settings = Settings::default();
    let mut gov = governor(5);
    let mut diag = Log::new();
    let node = TypeRouter::new(&host, &settings, &mut gov, &mut diag)
        .dispatch("gone", &Value::Object(ids[0]));
    assert_eq!(node.category, Category::Unknown);
    assert!(diag.iter().any(|(k, _)| *k == MessageKey::IntrospectionGap));
}

// =============================================================================
// Properties
// =============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chains_truncate_at_most_once(len in 1usize..12, max_depth in 1usize..12) {
            let (host, ids) = chain_host(len);
            let mut gov = governor(max_depth);
            let tree = build(&host, &mut gov, &Value::Object(ids[0]));

            let expected = usize::from(len > max_depth);
            prop_assert_eq!(markers(&tree), (0, expected));
            prop_assert_eq!(gov.deepest(), len.min(max_depth + 1));
            prop_assert_eq!(gov.depth(), 0);
        }
    }
}
