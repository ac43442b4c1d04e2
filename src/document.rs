//! Document assembly: splice rendered fragments into the static shell.

use crate::render::{self, escape_html};
use crate::types::CourseTree;

/// Static HTML/CSS/JS shell with `{{title}}`, `{{summary}}` and `{{tree}}` slots.
const SHELL: &str = include_str!("../assets/shell.html");

/// Fill the shell's three slots in a single left-to-right pass. Inserted
/// text is never rescanned, so course content that happens to contain a
/// slot marker stays literal. `title` is escaped; the fragments are
/// expected to be markup already.
pub fn assemble(title: &str, summary: &str, tree: &str) -> String {
    let title = escape_html(title);
    let mut out = String::with_capacity(SHELL.len().saturating_add(summary.len()).saturating_add(tree.len()));
    let mut rest = SHELL;

    while let Some((before, after)) = rest.split_once("{{") {
        out.push_str(before);
        let Some((key, tail)) = after.split_once("}}") else {
            out.push_str("{{");
            rest = after;
            continue;
        };
        match key {
            "summary" => out.push_str(summary),
            "title" => out.push_str(&title),
            "tree" => out.push_str(tree),
            _ => {
                out.push_str("{{");
                rest = after;
                continue;
            },
        }
        rest = tail;
    }
    out.push_str(rest);
    return out;
}

/// Render a complete interactive document for `tree`.
pub fn render_document(tree: &CourseTree) -> String {
    let title = format!("{} Structure", tree.root.display_name);
    return assemble(&title, &render::render_summary(tree), &render::render_tree(tree));
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;
    use crate::types::ComponentNode;

    fn course(display_name: &str, raw_source: &str) -> CourseTree {
        CourseTree::new(ComponentNode {
            children: Vec::new(),
            component_type: "course".to_string(),
            display_name: display_name.to_string(),
            raw_source: raw_source.to_string(),
            reference_name: "run1".to_string(),
        })
    }

    #[test]
    fn fills_every_slot() {
        let html = assemble("My Title", "<i>summary</i>", "<b>tree</b>");
        assert!(html.contains("<title>My Title</title>"));
        assert!(html.contains("<h1>📋 My Title</h1>"));
        assert!(html.contains("<i>summary</i>"));
        assert!(html.contains("<b>tree</b>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn inserted_markers_are_not_expanded() {
        let html = assemble("{{tree}}", "{{title}}", "T");
        assert!(html.contains("<title>{{tree}}</title>"));
        assert_eq!(html.matches("{{title}}").count(), 1);
    }

    #[test]
    fn title_is_escaped() {
        let html = assemble("A <b> & C", "", "");
        assert!(html.contains("<title>A &lt;b&gt; &amp; C</title>"));
    }

    #[test]
    fn document_uses_course_name_and_is_stable() {
        let tree = course("Demo", "<course display_name=\"Demo\"/>");
        let html = render_document(&tree);
        assert!(html.contains("<title>Demo Structure</title>"));
        assert!(html.contains("<strong>1</strong><br>course"));
        assert!(html.contains("&lt;course display_name=&quot;Demo&quot;/&gt;"));
        assert_eq!(html, render_document(&tree));
    }
}
