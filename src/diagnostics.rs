use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;
use crate::types::ComponentRef;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened and,
/// where there is one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CorruptArchive { path, reason } => render_corrupt_archive(path, reason),
        Error::CourseFragmentInvalid { path } => render_course_fragment_invalid(path),
        Error::CourseFragmentMissing { path } => render_course_fragment_missing(path),
        Error::CyclicReference { chain } => render_cyclic_reference(chain),
        Error::DepthExceeded { max_depth, reference } => render_depth_exceeded(*max_depth, reference),
        Error::DescriptorMalformed { path, reason } => render_descriptor_malformed(path, reason),
        Error::DescriptorMissing { path } => render_descriptor_missing(path),
        Error::StructureNotFound { path } => render_structure_not_found(path),
        Error::UnsupportedFormat { path } => render_unsupported_format(path),
        Error::ConfigInvalid { .. }
        | Error::Io(_)
        | Error::Json(_)
        | Error::PathNotFound { .. }
        | Error::TomlDe(_) => render_generic(e),
    };
}

fn render_corrupt_archive(path: &Path, reason: &str) -> String {
    return format!("\
# Error: Corrupt Archive

`{}` could not be extracted: {reason}

## Fix

Re-export the course, or unpack it yourself and pass the directory instead.
", path.display());
}

fn render_course_fragment_invalid(path: &Path) -> String {
    return format!("\
# Error: Course Fragment Unparsable

`{}` is not well-formed XML, so the course has no structure to show.

## Fix

Open the file and repair it, or re-export the course.
", path.display());
}

fn render_course_fragment_missing(path: &Path) -> String {
    return format!("\
# Error: Course Fragment Missing

`course.xml` points at `{}`, which does not exist.

## Fix

Check the `url_name` attribute in `course.xml` against the files in `course/`.
", path.display());
}

fn render_cyclic_reference(chain: &[ComponentRef]) -> String {
    let chain_str = chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ");

    return format!("\
# Error: Cyclic Reference

Fragments reference each other in a loop: {chain_str}

## Fix

Remove the reference that points back up the chain, or set
`cycles = \"placeholder\"` in `{CONFIG_FILE}` to render the loop as a placeholder.
");
}

fn render_depth_exceeded(max_depth: usize, reference: &ComponentRef) -> String {
    return format!("\
# Error: Reference Depth Exceeded

Expansion passed {max_depth} levels at `{reference}`.

## Fix

Raise `max_depth` in `{CONFIG_FILE}`, or set `cycles = \"placeholder\"` to cut
the branch off instead of failing.
");
}

fn render_descriptor_malformed(path: &Path, reason: &str) -> String {
    return format!("\
# Error: Descriptor Malformed

Could not read `{}`: {reason}

## Fix

The package root must hold a well-formed `course.xml` such as:

    <course url_name=\"2024_T1\" org=\"Org\" course=\"CS101\"/>
", path.display());
}

fn render_descriptor_missing(path: &Path) -> String {
    return format!("\
# Error: Descriptor Has No Course Reference

`{}` has no `url_name` attribute on its root element.

## Fix

Add the name of the course run, matching a file in `course/`:

    <course url_name=\"2024_T1\"/>
", path.display());
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { reason } => format!("\
# Error: Invalid Config

{reason}

## Fix

Edit `{CONFIG_FILE}`.
"),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        Error::PathNotFound { path } => format!("\
# Error: Path Not Found

`{}` does not exist.
", path.display()),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML in {CONFIG_FILE}

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        Error::CorruptArchive { .. }
        | Error::CourseFragmentInvalid { .. }
        | Error::CourseFragmentMissing { .. }
        | Error::CyclicReference { .. }
        | Error::DepthExceeded { .. }
        | Error::DescriptorMalformed { .. }
        | Error::DescriptorMissing { .. }
        | Error::StructureNotFound { .. }
        | Error::UnsupportedFormat { .. } => format!("\
# Error

{e}
"),
    };
}

fn render_structure_not_found(path: &Path) -> String {
    return format!("\
# Error: Course Structure Not Found

No `course.xml` exists anywhere under `{}`.

## Fix

Pass the root of an OLX export: the directory (or archive of it) that
contains `course.xml` alongside folders such as `course/` and `chapter/`.
", path.display());
}

fn render_unsupported_format(path: &Path) -> String {
    return format!("\
# Error: Unsupported Format

`{}` is not a directory or a supported archive.

## Supported inputs

- a directory
- `.zip`
- `.tar.gz`, `.tgz`, `.gz`
", path.display());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn cycle_diagnostic_shows_chain() {
        let e = Error::CyclicReference {
            chain: vec![ComponentRef::new("course", "c"), ComponentRef::new("chapter", "a")],
        };
        let md = render_error(&e);
        assert!(md.starts_with("# Error: Cyclic Reference"));
        assert!(md.contains("course/c -> chapter/a"));
    }

    #[test]
    fn unparsable_course_fragment_names_the_file() {
        let md = render_error(&Error::CourseFragmentInvalid { path: PathBuf::from("pkg/course/run1.xml") });
        assert!(md.starts_with("# Error: Course Fragment Unparsable"));
        assert!(md.contains("`pkg/course/run1.xml`"));
    }

    #[test]
    fn every_locator_error_has_a_heading() {
        let path = PathBuf::from("pkg.rar");
        for e in [
            Error::UnsupportedFormat { path: path.clone() },
            Error::StructureNotFound { path: path.clone() },
            Error::CorruptArchive { path: path.clone(), reason: "bad".to_string() },
            Error::PathNotFound { path },
        ] {
            assert!(render_error(&e).starts_with("# Error: "));
        }
    }
}
