//! Text and JSON renderers.
//!
//! Both renderers escape every control character in node content. The
//! output accumulator relies on this: its spill tokens are delimited by
//! control characters that can then never appear in rendered text.

use std::fmt::Write;

use spyglass_engine::{Anchor, RenderNode, Renderer};

use crate::diagnostics::Diagnostic;

// =============================================================================
// Document Trait
// =============================================================================

/// A renderer that can also frame a whole document.
pub trait DocumentFormat: Renderer {
    /// This format as a plain renderer.
    fn renderer(&self) -> &dyn Renderer;

    /// Parts of the final document in order, given the rendered root
    /// fragments and the diagnostics.
    fn document(&self, roots: Vec<String>, diagnostics: &[&Diagnostic]) -> Vec<String>;
}

// =============================================================================
// Escaping
// =============================================================================

/// Replaces control characters with visible escapes.
#[must_use]
pub fn escape_control(s: &str) -> String {
    if !s.chars().any(char::is_control) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

// =============================================================================
// Text Renderer
// =============================================================================

/// Renders an indented plain-text tree.
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Whether to show declaration sites.
    pub show_origin: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            indent: 2,
            show_origin: true,
        }
    }
}

impl TextRenderer {
    /// Creates a renderer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the indentation width.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Builder method to hide declaration sites.
    #[must_use]
    pub fn without_origin(mut self) -> Self {
        self.show_origin = false;
        self
    }

    fn head(&self, node: &RenderNode, depth: usize) -> String {
        let mut line = " ".repeat(depth * self.indent);
        if let Some(visibility) = node.visibility {
            let _ = write!(line, "{visibility} ");
        }
        let _ = write!(line, "{} ({})", escape_control(&node.name), escape_control(&node.type_label));
        if !node.summary.is_empty() && node.summary != node.type_label {
            let _ = write!(line, " {}", escape_control(&node.summary));
        }
        let facts: Vec<String> = node
            .extra
            .iter()
            .map(|(k, v)| format!("{}={}", escape_control(k), escape_control(v)))
            .collect();
        if !facts.is_empty() {
            let _ = write!(line, " [{}]", facts.join(", "));
        }
        if self.show_origin {
            if let Some(origin) = &node.origin {
                let _ = write!(line, " <{}>", escape_control(&origin.to_string()));
            }
        }
        line
    }
}

impl Renderer for TextRenderer {
    fn render_leaf(&self, node: &RenderNode, depth: usize) -> String {
        let mut out = self.head(node, depth);
        out.push('\n');
        if let Some(detail) = &node.detail {
            let pad = " ".repeat((depth + 1) * self.indent);
            for line in detail.lines() {
                let _ = writeln!(out, "{pad}| {}", escape_control(line));
            }
        }
        out
    }

    fn render_composite(&self, node: &RenderNode, children: &[String], depth: usize) -> String {
        let mut out = self.head(node, depth);
        if let Some(anchor) = node.anchor {
            let _ = write!(out, " #{anchor}");
        }
        out.push('\n');
        for child in children {
            out.push_str(child);
        }
        out
    }

    fn render_recursion_marker(&self, node: &RenderNode, target: Anchor, depth: usize) -> String {
        let mut out = self.head(node, depth);
        let _ = writeln!(out, " *RECURSION* -> #{target}");
        out
    }

    fn render_truncated_marker(&self, node: &RenderNode, depth: usize) -> String {
        let mut out = self.head(node, depth);
        out.push_str(" *DEPTH TOO GREAT*\n");
        out
    }
}

impl DocumentFormat for TextRenderer {
    fn renderer(&self) -> &dyn Renderer {
        self
    }

    fn document(&self, roots: Vec<String>, diagnostics: &[&Diagnostic]) -> Vec<String> {
        let mut parts = roots;
        if !diagnostics.is_empty() {
            let mut section = String::from("-- diagnostics --\n");
            for d in diagnostics {
                let _ = writeln!(
                    section,
                    "[{}] {}: {}",
                    d.severity,
                    d.key,
                    escape_control(&d.message())
                );
            }
            parts.push(section);
        }
        parts
    }
}

// =============================================================================
// JSON Renderer
// =============================================================================

/// Renders the tree as JSON objects.
#[derive(Clone, Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Creates a JSON renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders the fields shared by every node, without the closing brace.
    fn open(node: &RenderNode) -> String {
        let mut out = String::from("{");
        let _ = write!(
            out,
            "\"name\":{},\"category\":{},\"type\":{},\"summary\":{}",
            json_string(&node.name),
            json_string(node.category.label()),
            json_string(&node.type_label),
            json_string(&node.summary)
        );
        if let Some(detail) = &node.detail {
            let _ = write!(out, ",\"detail\":{}", json_string(detail));
        }
        if !node.extra.is_empty() {
            let fields: Vec<String> = node
                .extra
                .iter()
                .map(|(k, v)| format!("{}:{}", json_string(k), json_string(v)))
                .collect();
            let _ = write!(out, ",\"extra\":{{{}}}", fields.join(","));
        }
        if let Some(visibility) = node.visibility {
            let _ = write!(out, ",\"visibility\":{}", json_string(&visibility.to_string()));
        }
        if let Some(origin) = &node.origin {
            let _ = write!(out, ",\"origin\":{}", json_string(&origin.to_string()));
        }
        if let Some(kind) = node.member_kind {
            let _ = write!(out, ",\"kind\":{}", json_string(&kind.to_string()));
        }
        out
    }
}

impl Renderer for JsonRenderer {
    fn render_leaf(&self, node: &RenderNode, _depth: usize) -> String {
        let mut out = Self::open(node);
        out.push('}');
        out
    }

    fn render_composite(&self, node: &RenderNode, children: &[String], _depth: usize) -> String {
        let mut out = Self::open(node);
        if let Some(anchor) = node.anchor {
            let _ = write!(out, ",\"anchor\":{}", json_string(&anchor.to_string()));
        }
        out.push_str(",\"children\":[");
        out.push_str(&children.join(","));
        out.push_str("]}");
        out
    }

    fn render_recursion_marker(&self, node: &RenderNode, target: Anchor, _depth: usize) -> String {
        let mut out = Self::open(node);
        let _ = write!(out, ",\"recursion\":{}}}", json_string(&target.to_string()));
        out
    }

    fn render_truncated_marker(&self, node: &RenderNode, _depth: usize) -> String {
        let mut out = Self::open(node);
        out.push_str(",\"truncated\":true}");
        out
    }
}

impl DocumentFormat for JsonRenderer {
    fn renderer(&self) -> &dyn Renderer {
        self
    }

    fn document(&self, roots: Vec<String>, diagnostics: &[&Diagnostic]) -> Vec<String> {
        let mut parts = vec!["{\"trees\":[".to_string()];
        for (i, root) in roots.into_iter().enumerate() {
            if i > 0 {
                parts.push(",".to_string());
            }
            parts.push(root);
        }
        let records: Vec<String> = diagnostics
            .iter()
            .map(|d| {
                format!(
                    "{{\"id\":{},\"key\":{},\"severity\":{},\"message\":{}}}",
                    d.id,
                    json_string(d.key.as_str()),
                    json_string(&d.severity.to_string()),
                    json_string(&d.message())
                )
            })
            .collect();
        parts.push(format!("],\"diagnostics\":[{}]}}\n", records.join(",")));
        parts
    }
}
