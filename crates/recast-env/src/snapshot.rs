//! Environment snapshots and diffs
//!
//! An [`EnvironmentSnapshot`] captures the observable state of a working
//! tree: per-file content hashes, declared dependency versions, and the
//! presence of known build-artifact directories. Two snapshots combine via
//! the pure [`diff`] function.

use crate::error::EnvError;
use crate::hash::ContentHash;
use crate::manifest::parse_declared_dependencies;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Directories never hashed into a snapshot: build output, dependency
/// caches, and version-control metadata.
static IGNORED_DIRS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "target",
        "node_modules",
        ".git",
        ".hg",
        ".svn",
        "dist",
        "build",
        "__pycache__",
        ".venv",
    ])
});

/// Build-artifact directories whose presence is tracked (not hashed).
const BUILD_ARTIFACT_DIRS: &[&str] = &["target", "dist", "build", "out"];

/// Point-in-time state of a working tree
///
/// Immutable once captured. Paths are relative to the capture root with
/// forward-slash separators, so snapshots compare across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Relative file path → content hash
    pub files: BTreeMap<String, ContentHash>,
    /// Declared dependency name → version
    pub dependencies: BTreeMap<String, String>,
    /// Build-artifact directories present at capture time
    pub build_artifacts: Vec<String>,
    /// Capture timestamp (informational; never part of any derived id)
    pub captured_at: DateTime<Utc>,
}

impl EnvironmentSnapshot {
    /// Capture the current state of the tree rooted at `root`
    ///
    /// # Errors
    /// - `EnvError::NotADirectory` if `root` is not a directory
    /// - `EnvError::Io` if a file cannot be read
    /// - `EnvError::ManifestParse` if a present manifest is malformed
    pub fn capture(root: impl AsRef<Path>) -> Result<Self, EnvError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(EnvError::NotADirectory(root.to_path_buf()));
        }

        let mut files = BTreeMap::new();
        hash_tree(root, root, &mut files)?;

        let dependencies = parse_declared_dependencies(root)?;

        let build_artifacts: Vec<String> = BUILD_ARTIFACT_DIRS
            .iter()
            .filter(|dir| root.join(dir).is_dir())
            .map(|dir| (*dir).to_string())
            .collect();

        tracing::debug!(
            files = files.len(),
            dependencies = dependencies.len(),
            "captured environment snapshot"
        );

        Ok(Self {
            files,
            dependencies,
            build_artifacts,
            captured_at: Utc::now(),
        })
    }

    /// Number of hashed files
    #[inline]
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Hash recorded for a relative path, if present
    #[inline]
    #[must_use]
    pub fn file_hash(&self, relative: &str) -> Option<&ContentHash> {
        self.files.get(relative)
    }
}

fn hash_tree(
    root: &Path,
    dir: &Path,
    files: &mut BTreeMap<String, ContentHash>,
) -> Result<(), EnvError> {
    let entries = std::fs::read_dir(dir).map_err(|source| EnvError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| EnvError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if IGNORED_DIRS.contains(name.as_ref()) {
                continue;
            }
            hash_tree(root, &path, files)?;
        } else if path.is_file() {
            let hash = ContentHash::compute_file(&path).map_err(|e| match e {
                crate::hash::HashError::Io { path, source } => EnvError::Io { path, source },
                other => EnvError::Io {
                    path: path.clone(),
                    source: std::io::Error::other(other.to_string()),
                },
            })?;
            files.insert(relative_key(root, &path), hash);
        }
    }

    Ok(())
}

/// Relative path with forward-slash separators
pub(crate) fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A dependency whose declared version differs between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChange {
    pub name: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Difference between two environment snapshots
///
/// The file sets are disjoint: a path appears in exactly one of
/// `files_changed`, `files_added`, or `files_removed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDiff {
    pub files_changed: Vec<String>,
    pub files_added: Vec<String>,
    pub files_removed: Vec<String>,
    pub dependencies_changed: Vec<DependencyChange>,
    /// Build-artifact directories present after but not before
    pub build_artifacts_added: Vec<String>,
}

impl EnvironmentDiff {
    /// True when nothing differs between the two snapshots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files_changed.is_empty()
            && self.files_added.is_empty()
            && self.files_removed.is_empty()
            && self.dependencies_changed.is_empty()
            && self.build_artifacts_added.is_empty()
    }

    /// All file paths touched in any way (changed, added, or removed)
    #[must_use]
    pub fn touched_files(&self) -> Vec<&str> {
        self.files_changed
            .iter()
            .chain(&self.files_added)
            .chain(&self.files_removed)
            .map(String::as_str)
            .collect()
    }
}

/// Compute the difference between two snapshots
///
/// Pure: neither input is mutated, and identical inputs produce the
/// all-empty diff. Output vectors are sorted (BTreeMap iteration order).
#[must_use]
pub fn diff(before: &EnvironmentSnapshot, after: &EnvironmentSnapshot) -> EnvironmentDiff {
    let mut out = EnvironmentDiff::default();

    for (path, hash) in &before.files {
        match after.files.get(path) {
            Some(after_hash) if after_hash != hash => out.files_changed.push(path.clone()),
            Some(_) => {}
            None => out.files_removed.push(path.clone()),
        }
    }
    for path in after.files.keys() {
        if !before.files.contains_key(path) {
            out.files_added.push(path.clone());
        }
    }

    for (name, version) in &before.dependencies {
        match after.dependencies.get(name) {
            Some(after_version) if after_version != version => {
                out.dependencies_changed.push(DependencyChange {
                    name: name.clone(),
                    before: Some(version.clone()),
                    after: Some(after_version.clone()),
                });
            }
            Some(_) => {}
            None => out.dependencies_changed.push(DependencyChange {
                name: name.clone(),
                before: Some(version.clone()),
                after: None,
            }),
        }
    }
    for (name, version) in &after.dependencies {
        if !before.dependencies.contains_key(name) {
            out.dependencies_changed.push(DependencyChange {
                name: name.clone(),
                before: None,
                after: Some(version.clone()),
            });
        }
    }

    for artifact in &after.build_artifacts {
        if !before.build_artifacts.contains(artifact) {
            out.build_artifacts_added.push(artifact.clone());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn capture_hashes_files_and_skips_ignored_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "target/debug/out.o", "binary");
        write(dir.path(), "node_modules/pkg/index.js", "js");

        let snapshot = EnvironmentSnapshot::capture(dir.path()).unwrap();

        assert!(snapshot.file_hash("src/main.rs").is_some());
        assert!(snapshot.file_hash("target/debug/out.o").is_none());
        assert!(snapshot.file_hash("node_modules/pkg/index.js").is_none());
    }

    #[test]
    fn capture_records_build_artifact_presence() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "target/debug/out.o", "binary");
        write(dir.path(), "src/lib.rs", "");

        let snapshot = EnvironmentSnapshot::capture(dir.path()).unwrap();
        assert_eq!(snapshot.build_artifacts, vec!["target".to_string()]);
    }

    #[test]
    fn diff_of_snapshot_with_itself_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "x");
        write(dir.path(), "b.txt", "y");

        let snapshot = EnvironmentSnapshot::capture(dir.path()).unwrap();
        assert!(diff(&snapshot, &snapshot).is_empty());
    }

    #[test]
    fn diff_separates_changed_added_removed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "changed.txt", "v1");
        write(dir.path(), "removed.txt", "gone");
        let before = EnvironmentSnapshot::capture(dir.path()).unwrap();

        write(dir.path(), "changed.txt", "v2");
        write(dir.path(), "added.txt", "new");
        std::fs::remove_file(dir.path().join("removed.txt")).unwrap();
        let after = EnvironmentSnapshot::capture(dir.path()).unwrap();

        let d = diff(&before, &after);
        assert_eq!(d.files_changed, vec!["changed.txt".to_string()]);
        assert_eq!(d.files_added, vec!["added.txt".to_string()]);
        assert_eq!(d.files_removed, vec!["removed.txt".to_string()]);

        // Disjointness: each path appears in exactly one set.
        assert!(!d.files_changed.iter().any(|p| d.files_added.contains(p)));
        assert!(!d.files_changed.iter().any(|p| d.files_removed.contains(p)));
    }

    #[test]
    fn diff_does_not_mutate_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "x");
        let before = EnvironmentSnapshot::capture(dir.path()).unwrap();
        write(dir.path(), "a.txt", "y");
        let after = EnvironmentSnapshot::capture(dir.path()).unwrap();

        let before_copy = before.clone();
        let after_copy = after.clone();
        let _ = diff(&before, &after);

        assert_eq!(before, before_copy);
        assert_eq!(after, after_copy);
    }

    #[test]
    fn diff_reports_dependency_changes() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Cargo.toml",
            "[dependencies]\nserde = \"1.0\"\nremoved = \"0.1\"\n",
        );
        let before = EnvironmentSnapshot::capture(dir.path()).unwrap();

        write(
            dir.path(),
            "Cargo.toml",
            "[dependencies]\nserde = \"1.1\"\nadded = \"2.0\"\n",
        );
        let after = EnvironmentSnapshot::capture(dir.path()).unwrap();

        let d = diff(&before, &after);
        let names: Vec<&str> = d
            .dependencies_changed
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert!(names.contains(&"serde"));
        assert!(names.contains(&"removed"));
        assert!(names.contains(&"added"));
    }

    #[test]
    fn diff_reports_new_build_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/lib.rs", "");
        let before = EnvironmentSnapshot::capture(dir.path()).unwrap();

        write(dir.path(), "dist/bundle.js", "js");
        let after = EnvironmentSnapshot::capture(dir.path()).unwrap();

        let d = diff(&before, &after);
        assert_eq!(d.build_artifacts_added, vec!["dist".to_string()]);
    }
}
