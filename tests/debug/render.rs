//! Integration tests for renderers over real traversals

use std::sync::Arc;

use spyglass_debug::{DiagnosticLog, DocumentFormat, JsonRenderer, TextRenderer};
use spyglass_engine::{
    FixedMemoryProbe, Fuse, InlineSink, Limits, Presenter, ResourceGovernor, Settings, TypeRouter,
};
use spyglass_foundation::{SourceId, Value};
use spyglass_storage::{Host, PropertyDecl, UnitDecl};

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

fn people() -> (Host, Value) {
    let mut host = Host::new();
    host.declare(
        UnitDecl::new_type("Person", SourceId(1))
            .with_property(PropertyDecl::public("name"))
            .with_property(PropertyDecl::private("friend")),
    )
    .unwrap();
    let ann = host.instantiate("Person").unwrap();
    let bob = host.instantiate("Person").unwrap();
    host.set(ann, "name", Value::from("Ann\n\u{1e}")).unwrap();
    host.set(bob, "name", Value::from("Bob")).unwrap();
    host.set(ann, "friend", Value::Object(bob)).unwrap();
    host.set(bob, "friend", Value::Object(ann)).unwrap();
    (host, Value::Object(ann))
}

fn render(format: &dyn DocumentFormat, log: &mut DiagnosticLog) -> String {
    let (host, root) = people();
    let settings = Settings::default();
    let mut gov = governor(10);
    let node = TypeRouter::new(&host, &settings, &mut gov, log).dispatch("ann", &root);
    Presenter::new(format.renderer()).present(&node, &mut InlineSink)
}

#[test]
fn text_rendering_of_a_cycle() {
    let mut log = DiagnosticLog::default();
    let text = render(&TextRenderer::new(), &mut log);

    assert!(text.starts_with("ann (Person)"));
    assert!(text.contains("name (string) Ann..."));
    assert!(!text.contains('\u{1e}'));
    assert!(text.contains("friend (Person)"));
    assert!(text.contains("*RECURSION* -> #n1"));
    assert!(text.lines().any(|l| l.trim_start().starts_with("| ")));
}

#[test]
fn json_rendering_of_a_cycle() {
    let mut log = DiagnosticLog::default();
    let json = render(&JsonRenderer::new(), &mut log);
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(doc["type"], "Person");
    assert_eq!(doc["anchor"], "n1");
    let friend = &doc["children"][1];
    assert_eq!(friend["visibility"], "private");
    assert_eq!(friend["children"][1]["recursion"], "n1");
}

#[test]
fn documents_carry_diagnostics() {
    let mut log = DiagnosticLog::default();
    log.push(spyglass_engine::MessageKey::CallBudgetLow, vec!["3".into()]);
    let records: Vec<_> = log.iter().collect();

    let text = TextRenderer::new()
        .document(vec!["x (int) 1\n".into()], &records)
        .concat();
    assert!(text.contains("-- diagnostics --"));

    let json = JsonRenderer::new().document(Vec::new(), &records).concat();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc["trees"].as_array().unwrap().len(), 0);
    assert_eq!(doc["diagnostics"][0]["key"], "call-budget-low");
}
