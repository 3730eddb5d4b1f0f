//! Error types for checkpoint management

use std::path::PathBuf;

/// Errors raised by checkpoint creation and restore
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// No checkpoint exists with the requested id
    #[error("checkpoint not found: {0}")]
    CheckpointNotFound(String),

    /// Filesystem access failed
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored manifest or blob is corrupt
    #[error("corrupt snapshot {id}: {message}")]
    CorruptSnapshot { id: String, message: String },

    /// Environment capture failed while collecting tracked files
    #[error(transparent)]
    Env(#[from] recast_env::EnvError),
}
