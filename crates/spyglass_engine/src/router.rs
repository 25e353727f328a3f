//! Type-based dispatch.
//!
//! [`TypeRouter::dispatch`] classifies a value by runtime category and builds
//! its render subtree. Composite categories pass through the nesting limit
//! and the identity tracker before any of their members are visited.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use spyglass_foundation::{Category, InstanceId, Opaque, Value};

use crate::config::Settings;
use crate::diagnostics::{Diagnostics, MessageKey};
use crate::governor::ResourceGovernor;
use crate::identity::{IdentityKey, IdentityTracker};
use crate::introspect::{InstanceShape, Introspector};
use crate::members::{CallerScope, Member, MemberExtractor, MemberValue};
use crate::render::{Anchor, Marker, RenderNode};

const SUMMARY_CHARS: usize = 80;

/// Routes values to the matching analysis and builds render trees.
///
/// A router lives for one top-level traversal; its identity tracker starts
/// empty and never forgets.
pub struct TypeRouter<'a> {
    host: &'a dyn Introspector,
    settings: &'a Settings,
    governor: &'a mut ResourceGovernor,
    diag: &'a mut dyn Diagnostics,
    tracker: IdentityTracker,
    scope: CallerScope,
    next_anchor: u32,
}

impl<'a> TypeRouter<'a> {
    /// Creates a router for one traversal.
    pub fn new(
        host: &'a dyn Introspector,
        settings: &'a Settings,
        governor: &'a mut ResourceGovernor,
        diag: &'a mut dyn Diagnostics,
    ) -> Self {
        Self {
            host,
            settings,
            governor,
            diag,
            tracker: IdentityTracker::new(),
            scope: CallerScope::Outside,
            next_anchor: 0,
        }
    }

    /// Builder method to set the caller scope.
    #[must_use]
    pub fn with_scope(mut self, scope: CallerScope) -> Self {
        self.scope = scope;
        self
    }

    /// Composites visited so far.
    #[must_use]
    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    /// Primary runtime category of a value.
    #[must_use]
    pub fn classify(&self, value: &Value) -> Category {
        match value {
            Value::String(_) => Category::String,
            Value::Int(_) => Category::Integer,
            Value::Null => Category::Null,
            Value::Seq(_) => Category::Sequence,
            Value::Object(id) => match self.host.describe(*id) {
                Some(InstanceShape::Object { .. } | InstanceShape::Closure(_)) => Category::Object,
                Some(InstanceShape::Partial { .. }) => Category::PartialInstance,
                None => Category::Unknown,
            },
            Value::Globals => Category::Globals,
            Value::Bool(_) => Category::Boolean,
            Value::Float(_) => Category::Float,
            Value::Resource(_) => Category::Resource,
            Value::Opaque(_) => Category::Unknown,
        }
    }

    /// Builds the render subtree for `value` reached under `name`.
    ///
    /// Returns a broken node without doing anything once the fuse trips.
    pub fn dispatch(&mut self, name: impl Into<Arc<str>>, value: &Value) -> RenderNode {
        let name = name.into();
        if self.governor.check_break(self.diag) {
            return RenderNode::broken(name);
        }

        match value {
            Value::String(s) => string_node(name, s),
            Value::Int(n) => RenderNode::leaf(name, Category::Integer, n.to_string()),
            Value::Null => RenderNode::leaf(name, Category::Null, "null"),
            Value::Bool(b) => RenderNode::leaf(name, Category::Boolean, b.to_string()),
            Value::Float(f) => RenderNode::leaf(name, Category::Float, format!("{f:?}")),
            Value::Resource(handle) => {
                RenderNode::leaf(name, Category::Resource, format!("{} #{}", handle.kind, handle.id))
                    .with_type_label(format!("resource ({})", handle.kind))
            }
            Value::Seq(entries) => {
                let head = RenderNode::leaf(name, Category::Sequence, format!("{} items", entries.len()))
                    .with_extra("count", entries.len().to_string());
                self.descend(None, head, |router| {
                    entries
                        .iter()
                        .map(|entry| router.dispatch(entry.key.to_string(), &entry.value))
                        .collect()
                })
            }
            Value::Object(id) => self.object(name, *id),
            Value::Globals => {
                let head = RenderNode::leaf(name, Category::Globals, "global scope");
                self.descend(Some(IdentityKey::Globals), head, |router| {
                    router
                        .host
                        .globals()
                        .iter()
                        .map(|(name, value)| router.dispatch(name.clone(), value))
                        .collect()
                })
            }
            Value::Opaque(opaque) => self.opaque(name, opaque),
        }
    }

    /// Runs the composite protocol around `build`.
    ///
    /// Depth is pushed before and popped after on every path.
    fn descend(
        &mut self,
        key: Option<IdentityKey>,
        head: RenderNode,
        build: impl FnOnce(&mut Self) -> Vec<RenderNode>,
    ) -> RenderNode {
        self.governor.enter_nesting();
        let node = if self.governor.check_nesting_too_deep() {
            head.with_marker(Marker::Truncated)
        } else if let Some(anchor) = key.and_then(|k| self.tracker.anchor_of(k)) {
            head.with_marker(Marker::Recursion(anchor))
        } else {
            self.next_anchor += 1;
            let anchor = Anchor(self.next_anchor);
            if let Some(k) = key {
                self.tracker.add(k, anchor);
            }
            let mut node = head.with_anchor(anchor);
            node.children = build(self);
            node
        };
        self.governor.leave_nesting();
        node
    }

    fn object(&mut self, name: Arc<str>, id: InstanceId) -> RenderNode {
        let Some(shape) = self.host.describe(id) else {
            self.diag
                .add_message(MessageKey::IntrospectionGap, vec![format!("{id:?}")]);
            return RenderNode::leaf(name, Category::Unknown, format!("stale reference {id}"));
        };
        let key = Some(IdentityKey::Instance(id));

        match shape {
            InstanceShape::Object { class_name, .. } => {
                let head = RenderNode::leaf(name, Category::Object, class_name.to_string())
                    .with_type_label(class_name.to_string())
                    .with_extra("id", id.to_string());
                self.descend(key, head, |router| router.members(id))
            }
            InstanceShape::Partial { class_name } => {
                let head = RenderNode::leaf(name, Category::PartialInstance, class_name.to_string())
                    .with_type_label(format!("{} ({class_name})", Category::PartialInstance.label()))
                    .with_extra("id", id.to_string())
                    .with_extra("incomplete", "true");
                self.descend(key, head, |router| router.members(id))
            }
            InstanceShape::Closure(info) => {
                let params = info
                    .params
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let head = RenderNode::leaf(name, Category::Object, format!("closure({params})"))
                    .with_type_label("Closure")
                    .with_extra("id", id.to_string())
                    .with_extra("parameters", params)
                    .with_extra("defined at", info.defined_at.to_string());
                self.descend(key, head, |router| {
                    let mut children = Vec::new();
                    if let Some(bound) = info.bound {
                        children.push(router.dispatch("bound", &Value::Object(bound)));
                    }
                    for (var, value) in &info.captured {
                        let node = router.dispatch(var.clone(), value);
                        children.push(node.with_extra("captured", "true"));
                    }
                    children
                })
            }
        }
    }

    fn members(&mut self, id: InstanceId) -> Vec<RenderNode> {
        let members = MemberExtractor::new(self.host, self.settings, self.scope).list_members(id);
        members.into_iter().map(|m| self.member_node(m)).collect()
    }

    fn member_node(&mut self, member: Member) -> RenderNode {
        let mut node = match &member.value {
            MemberValue::Value(value) => self.dispatch(member.name.clone(), value),
            other => {
                if self.governor.check_break(self.diag) {
                    return RenderNode::broken(member.name);
                }
                match other {
                    MemberValue::Unset => RenderNode::leaf(member.name.clone(), Category::Null, "uninitialized")
                        .with_type_label("uninitialized"),
                    MemberValue::Method { params } => {
                        let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
                        RenderNode::leaf(
                            member.name.clone(),
                            Category::Unknown,
                            format!("{}({})", member.name, params.join(", ")),
                        )
                        .with_type_label("method")
                    }
                    MemberValue::Unresolved | MemberValue::Value(_) => {
                        RenderNode::leaf(member.name.clone(), Category::Unknown, "unresolved")
                            .with_type_label("unresolved")
                    }
                }
            }
        };
        if node.marker == Marker::Broken {
            return node;
        }
        if member.is_static {
            node = node.with_extra("static", "true");
        }
        if member.is_synthetic {
            node = node.with_extra("dynamic", "true");
        }
        node.visibility = Some(member.visibility);
        node.origin = Some(member.origin);
        node.member_kind = Some(member.kind);
        node
    }

    /// Gives an unclassifiable value one guarded secondary probe.
    fn opaque(&mut self, name: Arc<str>, opaque: &Opaque) -> RenderNode {
        let fallback = |name: Arc<str>| {
            RenderNode::leaf(name, Category::Unknown, opaque.label.to_string())
        };
        let Some(probe) = opaque.probe() else {
            return fallback(name);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| probe())) {
            Ok(Some(description)) => RenderNode::leaf(name, Category::Unknown, description.to_string())
                .with_type_label(opaque.label.to_string())
                .with_extra("probed", "true"),
            Ok(None) => fallback(name),
            Err(_) => {
                tracing::warn!(label = %opaque.label, "classification probe panicked");
                self.diag
                    .add_message(MessageKey::ProbeFailed, vec![opaque.label.to_string()]);
                fallback(name)
            }
        }
    }
}

fn string_node(name: Arc<str>, s: &str) -> RenderNode {
    let length = s.chars().count();
    let node = if length > SUMMARY_CHARS || s.contains('\n') {
        let head: String = s
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(SUMMARY_CHARS - 3)
            .collect();
        RenderNode::leaf(name, Category::String, format!("{head}...")).with_detail(s)
    } else {
        RenderNode::leaf(name, Category::String, s)
    };
    node.with_extra("length", length.to_string())
}
