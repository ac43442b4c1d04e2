use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// Config file name looked up in the working directory.
pub const CONFIG_FILE: &str = ".olxtree.toml";

/// Default maximum expansion depth below the course.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Tool configuration loaded from `.olxtree.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Policy for references that revisit an ancestor or exceed `max_depth`.
    pub cycles: CyclePolicy,
    /// Deepest level expanded below the course.
    pub max_depth: usize,
    /// Directory for generated documents; the working directory when unset.
    pub output_dir: Option<PathBuf>,
    /// Emit progress lines on stderr.
    pub verbose: bool,
}

/// What the resolver does with a reference it cannot safely expand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Abort resolution with a diagnostic.
    Error,
    /// Emit a childless placeholder node and keep going.
    #[default]
    Placeholder,
}

/// Raw TOML structure for `.olxtree.toml`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OlxtreeTomlConfig {
    /// See [`Config::cycles`].
    #[serde(default)]
    cycles: CyclePolicy,
    /// See [`Config::max_depth`].
    max_depth: Option<usize>,
    /// See [`Config::output_dir`].
    output_dir: Option<PathBuf>,
    /// See [`Config::verbose`].
    #[serde(default)]
    verbose: bool,
}

impl Config {
    /// Load config from `.olxtree.toml` in the given directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if `max_depth` is zero.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` if `max_depth` is zero.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: OlxtreeTomlConfig = toml::from_str(content)?;
        let max_depth = raw.max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
        if max_depth == 0 {
            return Err(Error::ConfigInvalid {
                reason: "max_depth must be at least 1".to_string(),
            });
        }

        return Ok(Self {
            cycles: raw.cycles,
            max_depth,
            output_dir: raw.output_dir,
            verbose: raw.verbose,
        });
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            cycles: CyclePolicy::Placeholder,
            max_depth: DEFAULT_MAX_DEPTH,
            output_dir: None,
            verbose: false,
        };
    }
}
