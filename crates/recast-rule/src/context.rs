//! Per-file execution scope for one transformation

use crate::transformation::TransformError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem metadata of the file under transformation
#[derive(Debug, Clone, Default)]
pub struct FileMetadata {
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

/// Execution scope for one (transformation, file) pair
///
/// Created fresh for each invocation, owned exclusively by it, and
/// discarded after use. Holds the file's content as read from disk at
/// context-creation time plus the resolved declared dependencies of the
/// surrounding project.
#[derive(Debug, Clone)]
pub struct TransformationContext {
    pub path: PathBuf,
    pub original_content: String,
    pub metadata: FileMetadata,
    /// Declared dependency name → version of the surrounding project
    pub dependencies: BTreeMap<String, String>,
}

impl TransformationContext {
    /// Build a context from in-memory content (primarily for tests)
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        original_content: impl Into<String>,
        dependencies: BTreeMap<String, String>,
    ) -> Self {
        let original_content = original_content.into();
        let size_bytes = original_content.len() as u64;
        Self {
            path: path.into(),
            original_content,
            metadata: FileMetadata {
                size_bytes,
                modified: None,
            },
            dependencies,
        }
    }

    /// Build a context from the file's current on-disk content
    ///
    /// # Errors
    /// Returns `TransformError::Io` if the file cannot be read.
    pub fn from_file(
        path: impl AsRef<Path>,
        dependencies: BTreeMap<String, String>,
    ) -> Result<Self, TransformError> {
        let path = path.as_ref();
        let original_content =
            std::fs::read_to_string(path).map_err(|source| TransformError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let metadata = std::fs::metadata(path)
            .map(|m| FileMetadata {
                size_bytes: m.len(),
                modified: m.modified().ok(),
            })
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            original_content,
            metadata,
            dependencies,
        })
    }

    /// File extension, lowercased
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_file_reads_content_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, "pub fn f() {}").unwrap();

        let ctx = TransformationContext::from_file(&path, BTreeMap::new()).unwrap();
        assert_eq!(ctx.original_content, "pub fn f() {}");
        assert_eq!(ctx.metadata.size_bytes, 13);
        assert_eq!(ctx.extension().as_deref(), Some("rs"));
    }

    #[test]
    fn from_file_missing_path_is_io_error() {
        let result =
            TransformationContext::from_file("/nonexistent/file.rs", BTreeMap::new());
        assert!(matches!(result, Err(TransformError::Io { .. })));
    }
}
