/// Core domain types for olxtree references, nodes, and resolved trees.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

/// Name of the descriptor file at a package root.
pub const DESCRIPTOR_FILE: &str = "course.xml";

/// Type tag of the root component.
pub const COURSE_TYPE: &str = "course";

/// A (type, reference name) pair. Identifies a fragment file by convention
/// as `{type}/{reference_name}.xml` under the package root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ComponentRef {
    /// Component type, which is also the fragment's directory name.
    pub component_type: String,
    /// Opaque reference name, unique only within its type.
    pub reference_name: String,
}

/// One resolved fragment. Children are owned, so the structure is a tree
/// even when the package reuses a fragment from two parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentNode {
    /// Child nodes in declaration order.
    pub children: Vec<ComponentNode>,
    /// Component type tag.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Human label; the reference name when the fragment declares none.
    pub display_name: String,
    /// Verbatim fragment text. Empty when the fragment could not be read.
    pub raw_source: String,
    /// Reference name the node was resolved from.
    pub reference_name: String,
}

/// A resolved course: the root node plus its type-frequency table.
#[derive(Debug, Clone, Serialize)]
pub struct CourseTree {
    /// Component type to number of nodes of that type, ordered by type.
    pub counts: BTreeMap<String, usize>,
    /// Root node, always of type `course`.
    pub root: ComponentNode,
}

impl ComponentRef {
    /// Location of this reference's fragment file under `root`, or `None`
    /// when either part is absolute or steps outside its directory.
    pub fn fragment_path(&self, root: &Path) -> Option<PathBuf> {
        if !is_plain_name(&self.component_type) || !is_plain_name(&self.reference_name) {
            return None;
        }
        return Some(
            root.join(&self.component_type)
                .join(format!("{}.xml", self.reference_name)),
        );
    }

    /// Build a reference from borrowed parts.
    pub fn new(component_type: &str, reference_name: &str) -> Self {
        return Self {
            component_type: component_type.to_string(),
            reference_name: reference_name.to_string(),
        };
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}/{}", self.component_type, self.reference_name);
    }
}

impl ComponentNode {
    /// A childless node standing in for a fragment that could not be expanded.
    pub fn placeholder(reference: &ComponentRef, label: &str) -> Self {
        return Self {
            children: Vec::new(),
            component_type: reference.component_type.clone(),
            display_name: format!("{label} {}", reference.component_type),
            raw_source: String::new(),
            reference_name: reference.reference_name.clone(),
        };
    }
}

impl CourseTree {
    /// Wrap a resolved root and compute its frequency table in one traversal.
    pub fn new(root: ComponentNode) -> Self {
        let mut counts = BTreeMap::new();
        count_components(&root, &mut counts);
        return Self { counts, root };
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        return self.counts.values().sum();
    }
}

/// Tally `node` and all of its descendants by type.
fn count_components(node: &ComponentNode, counts: &mut BTreeMap<String, usize>) {
    let slot = counts.entry(node.component_type.clone()).or_insert(0);
    *slot = slot.saturating_add(1);
    for child in &node.children {
        count_components(child, counts);
    }
}

/// Whether `name` is a non-empty relative path made only of normal
/// components, so joining it cannot leave the directory it is joined to.
fn is_plain_name(name: &str) -> bool {
    let path = Path::new(name);
    return path.components().next().is_some()
        && path.components().all(|part| return matches!(part, Component::Normal(_)));
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn leaf(component_type: &str, name: &str) -> ComponentNode {
        ComponentNode {
            children: Vec::new(),
            component_type: component_type.to_string(),
            display_name: name.to_string(),
            raw_source: String::new(),
            reference_name: name.to_string(),
        }
    }

    #[test]
    fn counts_every_node_by_type() {
        let mut chapter = leaf("chapter", "ch1");
        chapter.children.push(leaf("sequential", "s1"));
        chapter.children.push(leaf("sequential", "s2"));
        let mut course = leaf("course", "run1");
        course.children.push(chapter);

        let tree = CourseTree::new(course);
        assert_eq!(tree.counts.get("course"), Some(&1));
        assert_eq!(tree.counts.get("chapter"), Some(&1));
        assert_eq!(tree.counts.get("sequential"), Some(&2));
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn fragment_path_follows_type_directory_convention() {
        let reference = ComponentRef::new("vertical", "abc123");
        let path = reference.fragment_path(Path::new("/pkg"));
        assert_eq!(path, Some(PathBuf::from("/pkg/vertical/abc123.xml")));
        assert_eq!(reference.to_string(), "vertical/abc123");
    }

    #[test]
    fn fragment_path_rejects_names_that_leave_the_package() {
        let root = Path::new("/pkg");
        for name in ["/etc/passwd", "../../outside", "a/../../b", ".", ".."] {
            assert_eq!(ComponentRef::new("chapter", name).fragment_path(root), None, "{name}");
        }
        assert_eq!(ComponentRef::new("..", "ch1").fragment_path(root), None);
        assert_eq!(
            ComponentRef::new("html", "intro.v2").fragment_path(root),
            Some(PathBuf::from("/pkg/html/intro.v2.xml"))
        );
    }

    #[test]
    fn placeholder_is_labelled_and_childless() {
        let node = ComponentNode::placeholder(&ComponentRef::new("problem", "p9"), "Missing");
        assert_eq!(node.display_name, "Missing problem");
        assert_eq!(node.reference_name, "p9");
        assert!(node.children.is_empty());
    }
}
