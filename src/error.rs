//! Error types for directory hashing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring, walking or hashing a directory tree
#[derive(Debug, Error)]
pub enum DirhashError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{}: Not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(
        "Unknown algorithm: {0:?} (available: {})",
        crate::algorithm::algorithms_available().join(", ")
    )]
    UnknownAlgorithm(String),

    #[error("Invalid entry properties: {0}")]
    InvalidEntryProperties(String),

    #[error("Invalid match pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The ignore file named by `DIRHASH_IGNORE` does not exist
    #[error("DIRHASH_IGNORE={}: No such file", .0.display())]
    IgnoreFileNotFound(PathBuf),

    /// A symbolic link resolves to a directory that is already being visited
    /// in the current branch. Both occurrence paths are absolute.
    #[error(
        "Symlink recursion: {} is reached first at {} and again at {}",
        .real_path.display(),
        .first_path.display(),
        .second_path.display()
    )]
    SymlinkRecursion {
        real_path: PathBuf,
        first_path: PathBuf,
        second_path: PathBuf,
    },

    #[error("{}: Nothing to hash", .0.display())]
    NothingToHash(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start hashing workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DirhashError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DirhashError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors detected from the inputs alone, before any traversal.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            DirhashError::InvalidArgument(_)
                | DirhashError::NotADirectory(_)
                | DirhashError::UnknownAlgorithm(_)
                | DirhashError::InvalidEntryProperties(_)
                | DirhashError::InvalidPattern { .. }
                | DirhashError::IgnoreFileNotFound(_)
        )
    }
}

impl From<::config::ConfigError> for DirhashError {
    fn from(err: ::config::ConfigError) -> Self {
        DirhashError::Config(err.to_string())
    }
}

pub type Result<T, E = DirhashError> = std::result::Result<T, E>;
