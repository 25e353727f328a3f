//! Inspector sessions from settings to emitted document

use std::collections::HashMap;
use std::sync::Arc;

use spyglass::engine::{FixedMemoryProbe, Fuse, HostModel, MessageKey, Settings};
use spyglass::foundation::{SourceId, Value};
use spyglass::runtime::{Inspector, OutputFormat};
use spyglass::storage::{Host, PropertyDecl, UnitDecl};

fn tree_host(depth: usize) -> (Host, Value) {
    let mut host = Host::new();
    host.declare(
        UnitDecl::new_type("Tree", SourceId(1))
            .with_property(PropertyDecl::public("label"))
            .with_property(PropertyDecl::public("left"))
            .with_property(PropertyDecl::public("right")),
    )
    .unwrap();

    fn grow(host: &mut Host, depth: usize, label: &str) -> Value {
        let node = host.instantiate("Tree").unwrap();
        host.set(node, "label", Value::from(format!("{label}:{}", "x".repeat(30))))
            .unwrap();
        if depth > 0 {
            let left = grow(host, depth - 1, &format!("{label}L"));
            let right = grow(host, depth - 1, &format!("{label}R"));
            host.set(node, "left", left).unwrap();
            host.set(node, "right", right).unwrap();
        } else {
            host.set(node, "left", Value::Null).unwrap();
            host.set(node, "right", Value::Null).unwrap();
        }
        Value::Object(node)
    }

    let root = grow(&mut host, depth, "t");
    (host, root)
}

fn inspector(settings: Settings) -> Inspector {
    Inspector::new(settings).with_probe(Arc::new(FixedMemoryProbe::new(0)))
}

#[test]
fn spilling_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let (host, root) = tree_host(5);
    let base = Settings::default().with_max_depth(10);

    let mut inline = Vec::new();
    inspector(base.clone().with_chunk_threshold(0))
        .inspect(&host, "tree", &root, &mut inline)
        .unwrap();

    let mut spilled = Vec::new();
    let report = inspector(base.with_chunk_threshold(128).with_chunk_dir(dir.path()))
        .inspect(&host, "tree", &root, &mut spilled)
        .unwrap();

    assert!(report.spilled > 0);
    assert_eq!(spilled, inline);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn json_session_with_several_roots() {
    let (host, root) = tree_host(1);
    let inspector = inspector(Settings::default().with_chunk_threshold(0)).with_format(OutputFormat::Json);
    let mut session = inspector.session();
    session.inspect(&host, "tree", &root);
    session.inspect(&host, "all", &Value::Globals);
    session.inspect(&host, "n", &Value::Int(1));

    let mut out = Vec::new();
    let report = session.finish(&mut out).unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(report.rendered, 3);
    let trees = doc["trees"].as_array().unwrap();
    assert_eq!(trees.len(), 3);
    assert_eq!(trees[0]["type"], "Tree");
    assert_eq!(trees[1]["category"], "globals");
    assert_eq!(trees[2]["summary"], "1");
}

#[test]
fn depth_limit_from_settings_source() {
    let (host, root) = tree_host(4);
    let source: HashMap<String, String> = [
        ("max-nesting-level".to_string(), "2".to_string()),
        ("chunk-threshold-bytes".to_string(), "0".to_string()),
        ("analyse-private".to_string(), "maybe".to_string()),
    ]
    .into_iter()
    .collect();
    let inspector = Inspector::from_source(&source).with_probe(Arc::new(FixedMemoryProbe::new(0)));
    assert_eq!(inspector.settings().max_depth, 2);

    let mut out = Vec::new();
    inspector.inspect(&host, "tree", &root, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("*DEPTH TOO GREAT*"));
    assert!(text.contains("invalid-setting"));
}

#[test]
fn memory_exhaustion_disables_every_session_until_reset() {
    let (host, root) = tree_host(2);
    let probe = Arc::new(FixedMemoryProbe::new(900 * 1024 * 1024));
    let fuse = Arc::new(Fuse::new());
    let inspector = Inspector::new(
        Settings::default()
            .with_chunk_threshold(0)
            .with_memory(1024, 256),
    )
    .with_fuse(Arc::clone(&fuse))
    .with_probe(probe.clone());

    let report = inspector.inspect(&host, "tree", &root, &mut Vec::new()).unwrap();
    assert_eq!(report.rendered, 0);
    assert!(inspector.is_disabled());

    probe.set(0);
    let report = inspector.inspect(&host, "tree", &root, &mut Vec::new()).unwrap();
    assert_eq!(report.skipped, 1);

    inspector.reset();
    let report = inspector.inspect(&host, "tree", &root, &mut Vec::new()).unwrap();
    assert_eq!(report.rendered, 1);
    assert_eq!(fuse.trip_count(), 1);
}

#[test]
fn cli_model_gives_each_invocation_a_budget() {
    let (host, root) = tree_host(0);
    let settings = Settings::default()
        .with_chunk_threshold(0)
        .with_max_calls(2)
        .with_host_model(HostModel::Cli);
    let mut session = inspector(settings.clone()).session();
    for name in ["a", "b", "c"] {
        assert!(session.inspect(&host, name, &root));
    }

    let mut request = inspector(settings.with_host_model(HostModel::Request)).session();
    assert!(request.inspect(&host, "a", &root));
    assert!(!request.inspect(&host, "b", &root));
    assert!(request.diagnostics().contains(MessageKey::CallBudgetSpent));
}

#[test]
fn diagnostics_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let (host, root) = tree_host(0);
    let settings = Settings::default()
        .with_chunk_threshold(0)
        .with_max_calls(1)
        .with_log_dir(dir.path().join("logs"));
    let mut session = inspector(settings).session();
    session.inspect(&host, "a", &root);
    session.inspect(&host, "b", &root);

    let report = session.finish(&mut Vec::new()).unwrap();
    let text = std::fs::read_to_string(report.log_file.unwrap()).unwrap();
    assert!(text.contains("call-budget-spent"));
}
