//! Error types for environment state tracking

use std::path::PathBuf;

/// Errors raised while capturing or diffing environment state
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// Filesystem access failed
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A manifest exists but cannot be parsed
    #[error("failed to parse manifest {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    /// The capture root does not exist or is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
