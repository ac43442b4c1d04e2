//! Verbose progress reporting on stderr.

use std::fmt;

/// Writes `olxtree:`-prefixed progress lines to stderr when enabled.
/// Disabled reporters are inert, so callers never branch on verbosity.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Whether lines are emitted at all.
    enabled: bool,
}

impl Progress {
    /// Emit one line, indented two spaces per `depth`.
    pub fn at(self, depth: usize, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        let indent = "  ".repeat(depth);
        eprintln!("olxtree: {indent}{args}");
    }

    /// Emit one top-level line.
    pub fn note(self, args: fmt::Arguments<'_>) {
        return self.at(0, args);
    }

    /// A reporter that prints only when `enabled` is set.
    pub const fn new(enabled: bool) -> Self {
        return Self { enabled };
    }

    /// A reporter that never prints.
    pub const fn silent() -> Self {
        return Self { enabled: false };
    }
}
