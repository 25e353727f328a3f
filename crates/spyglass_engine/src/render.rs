//! Render tree and the renderer facility.
//!
//! The engine produces [`RenderNode`] trees. A [`Renderer`] turns nodes into
//! text fragments; the [`Presenter`] walks a tree bottom-up and hands every
//! fragment to a [`FragmentSink`], which may replace large fragments by
//! short tokens.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use spyglass_foundation::{Category, Visibility};

use crate::members::MemberKind;
use crate::provenance::DeclarationSite;

// =============================================================================
// Render Tree
// =============================================================================

/// Stable id linking a recursion marker to the node it refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Anchor(pub u32);

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Why a node stops short.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Marker {
    /// Fully rendered.
    #[default]
    None,
    /// Already rendered at the given anchor.
    Recursion(Anchor),
    /// Nesting limit reached.
    Truncated,
    /// Produced after the fuse tripped; renders nothing.
    Broken,
}

/// One node of the render tree.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderNode {
    /// Name under which the value was reached.
    pub name: Arc<str>,
    /// Runtime category.
    pub category: Category,
    /// Short one-line summary.
    pub summary: String,
    /// Longer payload such as full string contents.
    pub detail: Option<String>,
    /// Type shown next to the name.
    pub type_label: String,
    /// Additional key/value facts.
    pub extra: BTreeMap<String, String>,
    /// Anchor of composites that can be referred back to.
    pub anchor: Option<Anchor>,
    /// Why the node stops short, if it does.
    pub marker: Marker,
    /// Child nodes.
    pub children: Vec<RenderNode>,
    /// Visibility, for object members.
    pub visibility: Option<Visibility>,
    /// Declaration site, for object members.
    pub origin: Option<DeclarationSite>,
    /// Member kind, for object members.
    pub member_kind: Option<MemberKind>,
}

impl RenderNode {
    /// Creates a childless node.
    #[must_use]
    pub fn leaf(name: impl Into<Arc<str>>, category: Category, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category,
            summary: summary.into(),
            detail: None,
            type_label: category.label().to_string(),
            extra: BTreeMap::new(),
            anchor: None,
            marker: Marker::None,
            children: Vec::new(),
            visibility: None,
            origin: None,
            member_kind: None,
        }
    }

    /// Node returned once the fuse has tripped.
    #[must_use]
    pub fn broken(name: impl Into<Arc<str>>) -> Self {
        Self::leaf(name, Category::Unknown, "").with_marker(Marker::Broken)
    }

    /// Builder method to set the type label.
    #[must_use]
    pub fn with_type_label(mut self, label: impl Into<String>) -> Self {
        self.type_label = label.into();
        self
    }

    /// Builder method to set the detail payload.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Builder method to add an extra fact.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Builder method to set the marker.
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    /// Builder method to set the anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Returns true if the node has children or an anchor.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.anchor.is_some() || !self.children.is_empty()
    }

    /// Visits this node and its descendants depth-first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a RenderNode, usize)) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            visit(node, depth);
            for child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_, _| n += 1);
        n
    }
}

// =============================================================================
// Renderer Facility
// =============================================================================

/// Turns render nodes into text.
///
/// `depth` is the nesting level of the node in the tree, root at zero.
pub trait Renderer {
    /// Renders a node without children.
    fn render_leaf(&self, node: &RenderNode, depth: usize) -> String;

    /// Renders a composite node around its already rendered children.
    fn render_composite(&self, node: &RenderNode, children: &[String], depth: usize) -> String;

    /// Renders a reference back to an already rendered composite.
    fn render_recursion_marker(&self, node: &RenderNode, target: Anchor, depth: usize) -> String;

    /// Renders a composite cut off by the nesting limit.
    fn render_truncated_marker(&self, node: &RenderNode, depth: usize) -> String;
}

/// Receives rendered fragments.
pub trait FragmentSink {
    /// Takes a fragment and returns what the parent should embed instead.
    fn absorb(&mut self, fragment: String) -> String;
}

/// Keeps every fragment inline.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineSink;

impl FragmentSink for InlineSink {
    fn absorb(&mut self, fragment: String) -> String {
        fragment
    }
}

// =============================================================================
// Presenter
// =============================================================================

/// Renders a tree bottom-up, one fragment per node.
pub struct Presenter<'a> {
    renderer: &'a dyn Renderer,
}

impl<'a> Presenter<'a> {
    /// Creates a presenter.
    #[must_use]
    pub fn new(renderer: &'a dyn Renderer) -> Self {
        Self { renderer }
    }

    /// Renders `root`, returning the fragment handed back by the sink for it.
    ///
    /// Nodes produced after the fuse tripped are skipped.
    pub fn present(&self, root: &RenderNode, sink: &mut dyn FragmentSink) -> String {
        self.present_at(root, 0, sink)
    }

    fn present_at(&self, node: &RenderNode, depth: usize, sink: &mut dyn FragmentSink) -> String {
        let fragment = match node.marker {
            Marker::Broken => return String::new(),
            Marker::Recursion(target) => self.renderer.render_recursion_marker(node, target, depth),
            Marker::Truncated => self.renderer.render_truncated_marker(node, depth),
            Marker::None if node.is_composite() => {
                let children: Vec<String> = node
                    .children
                    .iter()
                    .filter(|c| c.marker != Marker::Broken)
                    .map(|child| self.present_at(child, depth + 1, sink))
                    .collect();
                self.renderer.render_composite(node, &children, depth)
            }
            Marker::None => self.renderer.render_leaf(node, depth),
        };
        sink.absorb(fragment)
    }
}
