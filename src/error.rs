/// Crate-level error types for olxtree diagnostics.
use std::path::PathBuf;

use crate::types::ComponentRef;

/// Fatal failures while locating, resolving, or exporting a course package.
/// Per-fragment problems below the course fragment never surface here; they
/// degrade to placeholder nodes inside the tree instead.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file parsed but holds an unusable value.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// Description of the offending setting.
        reason: String,
    },

    /// The archive could not be opened or unpacked.
    #[error("corrupt archive: {}: {reason}", path.display())]
    CorruptArchive {
        /// Archive that failed to extract.
        path: PathBuf,
        /// Message from the archive reader.
        reason: String,
    },

    /// The course fragment exists but is not well-formed XML.
    #[error("course fragment unparsable: {}", path.display())]
    CourseFragmentInvalid {
        /// Location of the course fragment.
        path: PathBuf,
    },

    /// The descriptor names a course fragment that does not exist.
    #[error("course fragment not found: {}", path.display())]
    CourseFragmentMissing {
        /// Expected location of the course fragment.
        path: PathBuf,
    },

    /// A fragment references one of its own ancestors.
    #[error("cyclic reference: {}", chain.iter().map(|r| return r.to_string()).collect::<Vec<_>>().join(" -> "))]
    CyclicReference {
        /// Ancestor chain from the course down to the repeated reference.
        chain: Vec<ComponentRef>,
    },

    /// Expansion went deeper than the configured limit.
    #[error("reference depth exceeds {max_depth} at {reference}")]
    DepthExceeded {
        /// Configured maximum depth.
        max_depth: usize,
        /// Reference at which the limit was hit.
        reference: ComponentRef,
    },

    /// The descriptor file is readable XML but declares no course reference.
    #[error("descriptor declares no url_name: {}", path.display())]
    DescriptorMissing {
        /// Path to the descriptor file.
        path: PathBuf,
    },

    /// The descriptor file cannot be read or parsed.
    #[error("descriptor malformed: {}: {reason}", path.display())]
    DescriptorMalformed {
        /// Path to the descriptor file.
        path: PathBuf,
        /// Description of the read or parse failure.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The input path does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound {
        /// Path supplied by the caller.
        path: PathBuf,
    },

    /// No `course.xml` anywhere under the candidate root.
    #[error("no course.xml found under {}", path.display())]
    StructureNotFound {
        /// Directory that was searched.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The input is a file with an extension we cannot unpack.
    #[error("unsupported package format: {}", path.display())]
    UnsupportedFormat {
        /// Path supplied by the caller.
        path: PathBuf,
    },
}
