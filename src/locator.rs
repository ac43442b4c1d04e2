//! Package location: turn a directory or archive path into a scoped session
//! rooted at the directory that holds `course.xml`.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::Error;
use crate::progress::Progress;
use crate::types::DESCRIPTOR_FILE;

/// Archive suffixes stripped when deriving an output name, longest first.
const ARCHIVE_SUFFIXES: [&str; 4] = [".tar.gz", ".tgz", ".zip", ".gz"];

/// How the input path has to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    /// A plain directory, used in place.
    Directory,
    /// A gzip-compressed tarball (`.tar.gz`, `.tgz`, `.gz`).
    TarGz,
    /// A zip archive.
    Zip,
}

/// A located package. Owns the extraction directory for archive input;
/// dropping the session (or calling [`PackageSession::close`]) deletes it.
/// On drop the deletion is done by the `temp` field's own `TempDir` drop;
/// this type's `Drop` only reports it.
#[derive(Debug)]
pub struct PackageSession {
    /// Reporter for verbose output.
    progress: Progress,
    /// Directory holding `course.xml`.
    root: PathBuf,
    /// The path the caller asked to open.
    source: PathBuf,
    /// Extraction directory for archive input.
    temp: Option<TempDir>,
}

impl PackageSession {
    /// Delete any extracted storage now, reporting failures instead of
    /// swallowing them the way `Drop` has to.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the extraction directory cannot be removed.
    pub fn close(mut self) -> Result<(), Error> {
        let Some(temp) = self.temp.take() else {
            return Ok(());
        };
        self.progress.note(format_args!("cleaning up {}", temp.path().display()));
        temp.close()?;
        return Ok(());
    }

    /// Whether the package was unpacked into temporary storage.
    pub const fn is_extracted(&self) -> bool {
        return self.temp.is_some();
    }

    /// Open `path` as a course package.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if nothing exists at `path`,
    /// `Error::UnsupportedFormat` for files that are not zip or gzip tar archives,
    /// `Error::CorruptArchive` if extraction fails,
    /// `Error::StructureNotFound` if no `course.xml` is present,
    /// or `Error::Io` for other filesystem failures.
    pub fn open(path: &Path, progress: Progress) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::PathNotFound { path: path.to_path_buf() });
        }

        let format = detect_format(path)?;
        let temp = match format {
            PackageFormat::Directory => None,
            PackageFormat::TarGz | PackageFormat::Zip => {
                Some(extract_archive(path, format, progress)?)
            },
        };

        // A failed search drops `temp` here, so extraction never leaks.
        let candidate = temp.as_ref().map_or(path, |t| return t.path());
        let root = find_package_root(candidate)?;
        progress.note(format_args!("package root: {}", root.display()));

        return Ok(Self {
            progress,
            root,
            source: path.to_path_buf(),
            temp,
        });
    }

    /// Directory holding `course.xml`.
    pub fn root(&self) -> &Path {
        return &self.root;
    }

    /// Input base name with any archive suffix removed, e.g. `demo` for
    /// `demo.tar.gz`. Used for default output naming.
    pub fn source_stem(&self) -> String {
        return package_stem(&self.source);
    }
}

impl Drop for PackageSession {
    fn drop(&mut self) {
        if let Some(temp) = &self.temp {
            self.progress.note(format_args!("cleaning up {}", temp.path().display()));
        }
    }
}

/// Classify `path` as a directory or a supported archive by extension,
/// case-insensitively.
///
/// # Errors
///
/// Returns `Error::UnsupportedFormat` for files with any other extension.
pub fn detect_format(path: &Path) -> Result<PackageFormat, Error> {
    if path.is_dir() {
        return Ok(PackageFormat::Directory);
    }

    let name = path
        .file_name()
        .map(|n| return n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".zip") {
        return Ok(PackageFormat::Zip);
    }
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") || name.ends_with(".gz") {
        return Ok(PackageFormat::TarGz);
    }
    return Err(Error::UnsupportedFormat { path: path.to_path_buf() });
}

/// Unpack an archive into a fresh temporary directory.
///
/// # Errors
///
/// Returns `Error::CorruptArchive` if the archive cannot be read,
/// or `Error::Io` if the archive or temp directory cannot be opened.
fn extract_archive(path: &Path, format: PackageFormat, progress: Progress) -> Result<TempDir, Error> {
    progress.note(format_args!("extracting {}", path.display()));
    let temp = tempfile::Builder::new().prefix("olxtree_").tempdir()?;
    let file = File::open(path)?;

    let corrupt = |reason: String| {
        return Error::CorruptArchive { path: path.to_path_buf(), reason };
    };

    match format {
        PackageFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file).map_err(|e| return corrupt(e.to_string()))?;
            archive.extract(temp.path()).map_err(|e| return corrupt(e.to_string()))?;
        },
        PackageFormat::TarGz => {
            let mut archive = tar::Archive::new(GzDecoder::new(file));
            archive.unpack(temp.path()).map_err(|e| return corrupt(e.to_string()))?;
        },
        PackageFormat::Directory => {},
    }

    progress.note(format_args!("extracted to {}", temp.path().display()));
    return Ok(temp);
}

/// Locate the package root under `dir`. First match wins:
/// a sole subdirectory holding `course.xml`, then `dir` itself,
/// then the shallowest `course.xml` anywhere below.
///
/// # Errors
///
/// Returns `Error::StructureNotFound` if no `course.xml` exists,
/// or `Error::Io` if `dir` cannot be listed.
pub fn find_package_root(dir: &Path) -> Result<PathBuf, Error> {
    let entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    if let [sole] = entries.as_slice() {
        let candidate = sole.path();
        if candidate.is_dir() && candidate.join(DESCRIPTOR_FILE).is_file() {
            return Ok(candidate);
        }
    }

    if dir.join(DESCRIPTOR_FILE).is_file() {
        return Ok(dir.to_path_buf());
    }

    let nested = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && e.file_name() == DESCRIPTOR_FILE)
        .min_by_key(walkdir::DirEntry::depth);

    return nested
        .and_then(|e| return e.path().parent().map(Path::to_path_buf))
        .ok_or_else(|| return Error::StructureNotFound { path: dir.to_path_buf() });
}

/// Base name of `path` with a trailing archive suffix removed.
fn package_stem(path: &Path) -> String {
    let Some(name) = path.file_name().map(|n| return n.to_string_lossy().into_owned()) else {
        return "course".to_string();
    };
    let lowered = name.to_lowercase();
    for suffix in ARCHIVE_SUFFIXES {
        if !lowered.ends_with(suffix) {
            continue;
        }
        let keep = name.len().saturating_sub(suffix.len());
        if let Some(stem) = name.get(..keep).filter(|s| return !s.is_empty()) {
            return stem.to_string();
        }
    }
    return name;
}
