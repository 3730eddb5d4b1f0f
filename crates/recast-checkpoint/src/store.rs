//! Snapshot store contract and the content-addressed filesystem store
//!
//! The [`SnapshotStore`] trait mirrors the version-control snapshot
//! primitive: `create_snapshot(files, message) -> id`,
//! `restore_snapshot(id)`, `list_snapshots()`. The pipeline depends only
//! on this contract, so a git-backed store can replace [`FsSnapshotStore`]
//! without touching any caller.

use crate::error::CheckpointError;
use chrono::{DateTime, Utc};
use recast_env::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Stable, content-derived checkpoint identifier
///
/// Derived from the sorted path → hash manifest, so two checkpoints of
/// identical change sets share an id. Never derived from wall-clock time
/// or random values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CheckpointId(ContentHash);

impl CheckpointId {
    /// Derive the id for a manifest of (relative path, content hash) pairs
    #[must_use]
    pub fn derive(manifest: &BTreeMap<String, ContentHash>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (path, hash) in manifest {
            hasher.update(path.as_bytes());
            hasher.update(&[0]);
            hasher.update(hash.as_bytes());
        }
        Self(ContentHash::new(*hasher.finalize().as_bytes()))
    }

    /// Short display form (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        self.0.short()
    }
}

impl Display for CheckpointId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A restorable snapshot of tracked files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Content-derived identifier
    pub id: CheckpointId,
    /// Creation timestamp (informational only)
    pub created_at: DateTime<Utc>,
    /// Human-readable message supplied at creation
    pub message: String,
    /// Tracked file paths covered by this checkpoint
    pub files: Vec<String>,
}

/// Per-checkpoint manifest persisted by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotManifest {
    id: CheckpointId,
    created_at: DateTime<Utc>,
    message: String,
    files: BTreeMap<String, ContentHash>,
}

/// Version-control snapshot primitive
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot of the given files
    ///
    /// `files` maps relative paths to full file contents. Returns the
    /// content-derived id; snapshotting an identical file set returns the
    /// same id without duplicating storage.
    fn create_snapshot(
        &self,
        files: &BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Result<CheckpointId, CheckpointError>;

    /// Restore every file of the snapshot into `root`, byte-for-byte
    ///
    /// Returns the restored relative paths.
    ///
    /// # Errors
    /// `CheckpointError::CheckpointNotFound` for an unknown id.
    fn restore_snapshot(
        &self,
        id: &CheckpointId,
        root: &Path,
    ) -> Result<Vec<String>, CheckpointError>;

    /// List all stored snapshots, oldest first
    fn list_snapshots(&self) -> Result<Vec<Checkpoint>, CheckpointError>;
}

/// Content-addressed snapshot store on the local filesystem
///
/// Layout under the store directory:
/// - `blobs/<content-hash>` — deduplicated file contents
/// - `manifests/<checkpoint-id>.json` — path → hash manifest
#[derive(Debug)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Open (creating if needed) a store at `dir`
    ///
    /// # Errors
    /// Returns error if the store directories cannot be created
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        for sub in ["blobs", "manifests"] {
            let path = dir.join(sub);
            std::fs::create_dir_all(&path)
                .map_err(|source| CheckpointError::Io { path, source })?;
        }
        Ok(Self { dir })
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.dir.join("blobs").join(hash.to_string())
    }

    fn manifest_path(&self, id: &CheckpointId) -> PathBuf {
        self.dir.join("manifests").join(format!("{id}.json"))
    }

    fn load_manifest(&self, id: &CheckpointId) -> Result<SnapshotManifest, CheckpointError> {
        let path = self.manifest_path(id);
        if !path.is_file() {
            return Err(CheckpointError::CheckpointNotFound(id.to_string()));
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|source| CheckpointError::Io { path, source })?;
        serde_json::from_str(&text).map_err(|e| CheckpointError::CorruptSnapshot {
            id: id.to_string(),
            message: e.to_string(),
        })
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn create_snapshot(
        &self,
        files: &BTreeMap<String, Vec<u8>>,
        message: &str,
    ) -> Result<CheckpointId, CheckpointError> {
        let manifest: BTreeMap<String, ContentHash> = files
            .iter()
            .map(|(path, contents)| (path.clone(), ContentHash::compute(contents)))
            .collect();
        let id = CheckpointId::derive(&manifest);

        for (path, contents) in files {
            let blob = self.blob_path(&manifest[path]);
            if !blob.exists() {
                std::fs::write(&blob, contents)
                    .map_err(|source| CheckpointError::Io { path: blob, source })?;
            }
        }

        let manifest_path = self.manifest_path(&id);
        if !manifest_path.exists() {
            let record = SnapshotManifest {
                id,
                created_at: Utc::now(),
                message: message.to_string(),
                files: manifest,
            };
            let json =
                serde_json::to_string_pretty(&record).map_err(|e| {
                    CheckpointError::CorruptSnapshot {
                        id: id.to_string(),
                        message: e.to_string(),
                    }
                })?;
            std::fs::write(&manifest_path, json).map_err(|source| CheckpointError::Io {
                path: manifest_path,
                source,
            })?;
        }

        tracing::info!(id = %id.short(), files = files.len(), "snapshot created");
        Ok(id)
    }

    fn restore_snapshot(
        &self,
        id: &CheckpointId,
        root: &Path,
    ) -> Result<Vec<String>, CheckpointError> {
        let manifest = self.load_manifest(id)?;
        let mut restored = Vec::with_capacity(manifest.files.len());

        for (relative, hash) in &manifest.files {
            let blob = self.blob_path(hash);
            let contents = std::fs::read(&blob).map_err(|source| CheckpointError::Io {
                path: blob,
                source,
            })?;

            let target = root.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&target, &contents).map_err(|source| CheckpointError::Io {
                path: target,
                source,
            })?;
            restored.push(relative.clone());
        }

        tracing::info!(id = %id.short(), files = restored.len(), "snapshot restored");
        Ok(restored)
    }

    fn list_snapshots(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let manifests_dir = self.dir.join("manifests");
        let entries = std::fs::read_dir(&manifests_dir).map_err(|source| CheckpointError::Io {
            path: manifests_dir,
            source,
        })?;

        let mut checkpoints = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CheckpointError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let text = std::fs::read_to_string(entry.path()).map_err(|source| {
                CheckpointError::Io {
                    path: entry.path(),
                    source,
                }
            })?;
            let manifest: SnapshotManifest =
                serde_json::from_str(&text).map_err(|e| CheckpointError::CorruptSnapshot {
                    id: entry.path().display().to_string(),
                    message: e.to_string(),
                })?;
            checkpoints.push(Checkpoint {
                id: manifest.id,
                created_at: manifest.created_at,
                message: manifest.message,
                files: manifest.files.into_keys().collect(),
            });
        }

        checkpoints.sort_by_key(|c| c.created_at);
        Ok(checkpoints)
    }
}
