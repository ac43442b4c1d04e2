//! Core CLI commands for olxtree: render, outline, json.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::document;
use crate::error;
use crate::locator::PackageSession;
use crate::progress::Progress;
use crate::resolver::{self, ResolveOptions};
use crate::types::{ComponentNode, CourseTree};

/// A resolved package whose session has already been closed.
struct Resolved {
    /// Input base name, for default output naming.
    stem: String,
    /// The resolved course.
    tree: CourseTree,
}

/// Default document location: `{stem}_structure.html` in the configured
/// output directory, or the working directory.
pub fn default_output_path(config: &Config, stem: &str) -> PathBuf {
    let dir = config.output_dir.clone().unwrap_or_else(|| return PathBuf::from("."));
    return dir.join(format!("{stem}_structure.html"));
}

/// Print the resolved tree and type counts as JSON.
///
/// # Errors
///
/// Returns locator, resolution, or serialization errors.
pub fn json(path: &Path, pretty: bool, verbose: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let resolved = resolve_package(path, &config, verbose)?;
    let text = if pretty {
        serde_json::to_string_pretty(&resolved.tree)?
    } else {
        serde_json::to_string(&resolved.tree)?
    };
    println!("{text}");
    return Ok(());
}

/// Print an indented text outline followed by the type counts.
///
/// # Errors
///
/// Returns locator or resolution errors.
pub fn outline(path: &Path, verbose: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let resolved = resolve_package(path, &config, verbose)?;
    print!("{}", outline_text(&resolved.tree));
    return Ok(());
}

/// Text outline of a tree: one line per node, two spaces per level, then a
/// blank line and one `type: count` line per component type.
pub fn outline_text(tree: &CourseTree) -> String {
    let mut out = String::new();
    write_outline_node(&tree.root, 0, &mut out);
    out.push('\n');
    for (component_type, count) in &tree.counts {
        let _ = writeln!(out, "{component_type}: {count}");
    }
    return out;
}

/// Resolve a package and write its interactive HTML document.
///
/// # Errors
///
/// Returns config, locator, or resolution errors, or `Error::Io` if the
/// document cannot be written.
pub fn render(path: &Path, output: Option<&Path>, verbose: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let resolved = resolve_package(path, &config, verbose)?;

    let target = output.map_or_else(
        || return default_output_path(&config, &resolved.stem),
        Path::to_path_buf,
    );
    if let Some(parent) = target.parent().filter(|p| return !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let html = document::render_document(&resolved.tree);
    std::fs::write(&target, html)?;

    let count = resolved.tree.node_count();
    println!("Wrote {} ({count} components)", target.display());
    return Ok(());
}

/// Open the package, resolve it, and release any extracted storage before
/// returning. The session is dropped on every error path as well.
///
/// # Errors
///
/// Returns locator or resolution errors, or `Error::Io` if cleanup fails.
fn resolve_package(path: &Path, config: &Config, verbose: bool) -> Result<Resolved, error::Error> {
    let progress = Progress::new(verbose || config.verbose);
    let session = PackageSession::open(path, progress)?;
    if session.is_extracted() {
        progress.note(format_args!("resolving extracted copy of {}", path.display()));
    }
    let options = ResolveOptions {
        cycles: config.cycles,
        max_depth: config.max_depth,
        progress,
    };

    let tree = resolver::resolve(session.root(), options)?;
    let stem = session.source_stem();
    session.close()?;
    return Ok(Resolved { stem, tree });
}

/// Append one outline line for `node`, then its children one level deeper.
fn write_outline_node(node: &ComponentNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{indent}{}: {} ({})",
        node.component_type, node.display_name, node.reference_name
    );
    for child in &node.children {
        write_outline_node(child, depth.saturating_add(1), out);
    }
}
