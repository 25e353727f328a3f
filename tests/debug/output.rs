//! Integration tests for output assembly

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use spyglass_debug::output::{ChunkJanitor, OutputAccumulator, OutputConfig, sweep};
use spyglass_debug::TextRenderer;
use spyglass_engine::{Anchor, Presenter, RenderNode};
use spyglass_foundation::Category;

fn files_in(dir: &Path) -> usize {
    fs::read_dir(dir).map_or(0, |entries| entries.count())
}

fn wide_tree(width: usize) -> RenderNode {
    let mut root = RenderNode::leaf("root", Category::Sequence, format!("{width} items")).with_anchor(Anchor(1));
    for i in 0..width {
        let mut child = RenderNode::leaf(i.to_string(), Category::Sequence, "2 items")
            .with_anchor(Anchor(u32::try_from(i).unwrap() + 2));
        child.children.push(RenderNode::leaf("0", Category::String, "x".repeat(40)));
        child.children.push(RenderNode::leaf("1", Category::Integer, i.to_string()));
        root.children.push(child);
    }
    root
}

#[test]
fn spilled_document_matches_inline() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = TextRenderer::new();
    let tree = wide_tree(50);

    let mut inline = OutputAccumulator::inline();
    let fragment = Presenter::new(&renderer).present(&tree, &mut inline);
    inline.append(fragment);
    let expected = inline.emit_to_string().unwrap();

    let mut acc = OutputAccumulator::new(OutputConfig::new().with_chunk_dir(dir.path()).with_threshold(64));
    let fragment = Presenter::new(&renderer).present(&tree, &mut acc);
    assert!(acc.spilled_count() > 10);
    assert!(fragment.len() < expected.len());
    acc.append(fragment);

    assert_eq!(acc.emit_to_string().unwrap(), expected);
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn concurrent_sessions_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let config = OutputConfig::new().with_chunk_dir(dir.path()).with_threshold(1);
    let mut a = OutputAccumulator::new(config.clone());
    let mut b = OutputAccumulator::new(config);

    let ta = a.absorb("from a".to_string());
    let tb = b.absorb("from b".to_string());
    assert_ne!(a.session_key(), b.session_key());
    assert_eq!(files_in(dir.path()), 2);

    a.append(ta);
    b.append(tb);
    assert_eq!(a.emit_to_string().unwrap(), "from a");
    assert_eq!(b.emit_to_string().unwrap(), "from b");
    assert_eq!(files_in(dir.path()), 0);
}

#[test]
fn spill_dir_is_created_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut acc = OutputAccumulator::new(OutputConfig::new().with_chunk_dir(&nested).with_threshold(1));
    let token = acc.absorb("payload".to_string());
    assert!(nested.is_dir());
    acc.append(token);
    assert_eq!(acc.emit_to_string().unwrap(), "payload");
}

#[test]
fn sweep_removes_only_stale_chunks() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("spyglass-old-0.chunk"), "x").unwrap();
    fs::write(dir.path().join("unrelated.txt"), "y").unwrap();

    let now = SystemTime::now();
    assert_eq!(sweep(dir.path(), Duration::from_secs(3600), now).unwrap(), 0);

    let later = now + Duration::from_secs(7200);
    assert_eq!(sweep(dir.path(), Duration::from_secs(3600), later).unwrap(), 1);
    assert!(dir.path().join("unrelated.txt").exists());
    assert_eq!(files_in(dir.path()), 1);
}

#[test]
fn janitor_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let janitor = ChunkJanitor::new();
    assert!(janitor.sweep_once(dir.path(), Duration::ZERO).is_some());
    assert!(janitor.has_swept());
    assert!(janitor.sweep_once(dir.path(), Duration::ZERO).is_none());
}
