//! Structure resolution: walk fragment references from `course.xml` down
//! and assemble the owned, ordered `CourseTree`.

use std::path::Path;

use roxmltree::Document;

use crate::config::{CyclePolicy, DEFAULT_MAX_DEPTH};
use crate::error::Error;
use crate::fragment::{self, ChildDecl, FragmentStatus, InlineChild};
use crate::progress::Progress;
use crate::types::{COURSE_TYPE, ComponentNode, ComponentRef, CourseTree, DESCRIPTOR_FILE};

/// Inline tags kept under the course even when they expand to nothing.
const STRUCTURAL_TAGS: [&str; 3] = ["chapter", "sequential", "vertical"];

/// Knobs for one resolution session.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// What to do when a reference revisits one of its ancestors.
    pub cycles: CyclePolicy,
    /// Deepest level expanded below the course (which is level 0).
    pub max_depth: usize,
    /// Reporter for verbose output.
    pub progress: Progress,
}

/// Depth-first expansion state. `chain` holds the references from the
/// course down to the node currently being expanded.
struct Walker<'a> {
    /// Ancestors of the current node, course first.
    chain: Vec<ComponentRef>,
    /// Session options.
    options: ResolveOptions,
    /// Package root.
    root: &'a Path,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        return Self {
            cycles: CyclePolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            progress: Progress::silent(),
        };
    }
}

impl Walker<'_> {
    /// Expand one reference into a full subtree.
    ///
    /// # Errors
    ///
    /// Returns `Error::CyclicReference` or `Error::DepthExceeded` under
    /// `CyclePolicy::Error`; every other problem becomes a placeholder node.
    fn expand(&mut self, reference: &ComponentRef, depth: usize) -> Result<ComponentNode, Error> {
        let progress = self.options.progress;

        if self.chain.contains(reference) {
            progress.at(depth, format_args!("cycle at {reference}"));
            if self.options.cycles == CyclePolicy::Error {
                let mut chain = self.chain.clone();
                chain.push(reference.clone());
                return Err(Error::CyclicReference { chain });
            }
            return Ok(ComponentNode::placeholder(reference, "Cyclic"));
        }

        if depth > self.options.max_depth {
            progress.at(depth, format_args!("depth limit at {reference}"));
            if self.options.cycles == CyclePolicy::Error {
                return Err(Error::DepthExceeded {
                    max_depth: self.options.max_depth,
                    reference: reference.clone(),
                });
            }
            return Ok(ComponentNode::placeholder(reference, "Too deep"));
        }

        progress.at(depth, format_args!("following {reference}"));
        let fragment = fragment::read(self.root, reference);
        match fragment.status {
            FragmentStatus::Invalid => progress.at(depth, format_args!("  invalid fragment {reference}")),
            FragmentStatus::Missing => progress.at(depth, format_args!("  missing fragment {reference}")),
            FragmentStatus::Parsed => {},
        }

        self.chain.push(reference.clone());
        let mut children = Vec::new();
        for child in fragment.references() {
            children.push(self.expand(child, depth.saturating_add(1))?);
        }
        self.chain.pop();

        return Ok(ComponentNode {
            children,
            component_type: reference.component_type.clone(),
            display_name: fragment.display_name,
            raw_source: fragment.raw_source,
            reference_name: fragment.reference_name,
        });
    }

    /// Turn inline course content into a placeholder node, expanding the
    /// references declared directly inside it. Returns `None` for inline
    /// markup that is neither structural nor gained any children.
    ///
    /// # Errors
    ///
    /// Propagates cycle and depth errors from `expand`.
    fn expand_inline(&mut self, inline: &InlineChild) -> Result<Option<ComponentNode>, Error> {
        let tag = inline.component_type.as_str();
        self.options.progress.at(1, format_args!("inline {tag}"));

        let mut children = Vec::new();
        for reference in &inline.references {
            children.push(self.expand(reference, 2)?);
        }

        if children.is_empty() && !STRUCTURAL_TAGS.contains(&tag) {
            return Ok(None);
        }

        return Ok(Some(ComponentNode {
            children,
            component_type: tag.to_string(),
            display_name: inline
                .display_name
                .clone()
                .unwrap_or_else(|| return format!("Inline {tag}")),
            raw_source: inline.raw_source.clone(),
            reference_name: format!("inline_{tag}"),
        }));
    }
}

/// Read `course.xml` and return the course reference name it declares.
///
/// # Errors
///
/// Returns `Error::DescriptorMalformed` if the descriptor is absent, unreadable,
/// or not XML, and `Error::DescriptorMissing` if it has no `url_name`.
pub fn read_descriptor(root: &Path) -> Result<String, Error> {
    let path = root.join(DESCRIPTOR_FILE);
    let bytes = std::fs::read(&path).map_err(|e| {
        return Error::DescriptorMalformed { path: path.clone(), reason: e.to_string() };
    })?;
    let text = fragment::decode_xml(bytes).ok_or_else(|| {
        return Error::DescriptorMalformed {
            path: path.clone(),
            reason: "text is not valid in its declared encoding".to_string(),
        };
    })?;
    let doc = Document::parse(&text).map_err(|e| {
        return Error::DescriptorMalformed { path: path.clone(), reason: e.to_string() };
    })?;

    return doc
        .root_element()
        .attribute("url_name")
        .filter(|name| return !name.is_empty())
        .map(str::to_string)
        .ok_or(Error::DescriptorMissing { path });
}

/// Resolve the package rooted at `root` into a `CourseTree`.
///
/// # Errors
///
/// Returns descriptor errors (`DescriptorMalformed`, `DescriptorMissing`),
/// `Error::CourseFragmentMissing` if the declared course file is absent,
/// `Error::CourseFragmentInvalid` if it is not well-formed XML, or
/// cycle/depth errors under `CyclePolicy::Error`.
pub fn resolve(root: &Path, options: ResolveOptions) -> Result<CourseTree, Error> {
    let course_name = read_descriptor(root)?;
    let course_ref = ComponentRef::new(COURSE_TYPE, &course_name);
    let course_path = course_ref.fragment_path(root).ok_or_else(|| {
        return Error::DescriptorMalformed {
            path: root.join(DESCRIPTOR_FILE),
            reason: format!("url_name {course_name:?} is not a plain file name"),
        };
    })?;
    if !course_path.is_file() {
        return Err(Error::CourseFragmentMissing { path: course_path });
    }

    options.progress.note(format_args!("course url_name: {course_name}"));
    let course = fragment::read(root, &course_ref);
    if course.status == FragmentStatus::Invalid {
        return Err(Error::CourseFragmentInvalid { path: course_path });
    }
    options.progress.note(format_args!("course: {}", course.display_name));

    let mut walker = Walker {
        chain: vec![course_ref],
        options,
        root,
    };

    let mut children = Vec::new();
    for decl in &course.children {
        match decl {
            ChildDecl::Inline(inline) => {
                if let Some(node) = walker.expand_inline(inline)? {
                    children.push(node);
                }
            },
            ChildDecl::Reference(reference) => children.push(walker.expand(reference, 1)?),
        }
    }

    let tree = CourseTree::new(ComponentNode {
        children,
        component_type: COURSE_TYPE.to_string(),
        display_name: course.display_name,
        raw_source: course.raw_source,
        reference_name: course_name,
    });
    options.progress.note(format_args!("resolved {} components", tree.node_count()));
    return Ok(tree);
}
