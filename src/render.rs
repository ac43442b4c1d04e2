//! Tree rendering: turn a resolved `CourseTree` into the node and summary
//! markup fragments the document shell expects. Pure functions of the tree.

use std::fmt::Write as _;

use crate::types::{ComponentNode, CourseTree};

/// Icon for types outside the fixed table.
const DEFAULT_ICON: &str = "📦";

/// Nodes at this level and deeper start with their children collapsed.
const FIRST_COLLAPSED_LEVEL: usize = 2;

/// Accumulates markup and hands out source-block ids in pre-order, so the
/// same tree always renders to the same string.
struct TreeWriter {
    /// Id for the next source block.
    next_id: usize,
    /// Markup written so far.
    out: String,
}

impl TreeWriter {
    /// Write `node` and its subtree at nesting `level` (root is 0).
    fn node(&mut self, node: &ComponentNode, level: usize) {
        let xml_id = format!("xml-{}", self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let collapsed = level >= FIRST_COLLAPSED_LEVEL;

        self.out.push_str("<div class=\"tree-node\">\n");
        if !node.children.is_empty() {
            let marker = if collapsed { "[+]" } else { "[-]" };
            let _ = write!(self.out, "<span class=\"tree-toggle\" onclick=\"toggleNode(this)\">{marker}</span>");
        }
        let _ = writeln!(
            self.out,
            "<span class=\"xml-toggle\" onclick=\"toggleXml('{xml_id}', this)\">[show xml]</span>"
        );
        let _ = writeln!(
            self.out,
            "<span class=\"tree-content\">{} <span class=\"component-type\">[{}]</span> \
             <span class=\"component-name\">{}</span> <span class=\"component-url\">({})</span></span>",
            icon_for(&node.component_type),
            escape_html(&node.component_type),
            escape_html(&node.display_name),
            escape_html(&node.reference_name),
        );
        let _ = writeln!(
            self.out,
            "<div class=\"component-xml\" id=\"{xml_id}\" hidden><pre>{}</pre></div>",
            escape_html(&node.raw_source)
        );

        if !node.children.is_empty() {
            let class = if collapsed { "tree-children collapsed" } else { "tree-children" };
            let _ = writeln!(self.out, "<div class=\"{class}\">");
            for child in &node.children {
                self.node(child, level.saturating_add(1));
            }
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n");
    }
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    return out;
}

/// Icon shown next to a component of the given type.
pub fn icon_for(component_type: &str) -> &'static str {
    return match component_type {
        "chapter" => "📚",
        "course" => "🎓",
        "discussion" => "💬",
        "html" => "📋",
        "problem" => "❓",
        "sequential" => "📄",
        "vertical" => "📝",
        "video" => "🎥",
        _ => DEFAULT_ICON,
    };
}

/// Summary items: one per component type, in type order.
pub fn render_summary(tree: &CourseTree) -> String {
    let mut out = String::new();
    for (component_type, count) in &tree.counts {
        let _ = writeln!(
            out,
            "<div class=\"summary-item\">{} <strong>{count}</strong><br>{}</div>",
            icon_for(component_type),
            escape_html(component_type)
        );
    }
    return out;
}

/// Nested node markup for the whole tree, root first.
pub fn render_tree(tree: &CourseTree) -> String {
    let mut writer = TreeWriter { next_id: 0, out: String::new() };
    writer.node(&tree.root, 0);
    return writer.out;
}
