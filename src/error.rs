//! Error types for the upgrade pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::AmbiguousOption;

/// Fatal errors. Anything that only deserves a diagnostic is logged instead.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// An abbreviated option name matches more than one connection option
    #[error("{}:{line}: {source}", path.display())]
    AmbiguousOption {
        path: PathBuf,
        line: usize,
        source: AmbiguousOption,
    },

    /// A line in the server section that cannot be parsed (strict mode only)
    #[error("{}:{line}: malformed directive '{text}'", path.display())]
    MalformedDirective {
        path: PathBuf,
        line: usize,
        text: String,
    },

    /// An `!include` or `!includedir` target does not exist
    #[error(
        "{}:{line}: included path '{}' not found: {source}",
        included_from.display(),
        path.display()
    )]
    MissingInclude {
        path: PathBuf,
        included_from: PathBuf,
        line: usize,
        source: io::Error,
    },

    #[error("failed to access '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl UpgradeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        UpgradeError::Io {
            path: path.into(),
            source,
        }
    }
}
