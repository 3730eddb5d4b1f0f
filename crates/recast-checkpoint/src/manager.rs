//! Checkpoint manager
//!
//! Captures restorable snapshots of a working tree before risky
//! operations, and restores a named checkpoint on demand.

use crate::error::CheckpointError;
use crate::store::{Checkpoint, CheckpointId, SnapshotStore};
use chrono::Utc;
use parking_lot::RwLock;
use recast_env::{ContentHash, EnvironmentSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Options controlling checkpoint creation
#[derive(Debug, Clone)]
pub struct CheckpointOptions {
    /// Include files outside version control
    pub include_untracked: bool,
    /// The version-control tracked set; required when
    /// `include_untracked` is false
    pub tracked: Option<BTreeSet<String>>,
    /// Human-readable checkpoint message
    pub message: String,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            include_untracked: true,
            tracked: None,
            message: String::new(),
        }
    }
}

/// Result of a checkpoint attempt
#[derive(Debug, Clone)]
pub enum CheckpointOutcome {
    /// A checkpoint was created
    Created(Checkpoint),
    /// The tree matches the most recent checkpoint; nothing stored
    Unchanged(CheckpointId),
}

impl CheckpointOutcome {
    /// The created checkpoint, if any
    #[must_use]
    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        match self {
            Self::Created(checkpoint) => Some(checkpoint),
            Self::Unchanged(_) => None,
        }
    }

    /// Id of the checkpoint covering the current tree state
    ///
    /// On the unchanged path this is the prior checkpoint's id; the tree
    /// is always restorable to it.
    #[must_use]
    pub fn id(&self) -> CheckpointId {
        match self {
            Self::Created(checkpoint) => checkpoint.id,
            Self::Unchanged(id) => *id,
        }
    }
}

/// Manages checkpoints for one working tree
///
/// The manager is the sole restorer of the tree by contract; callers
/// serialize runs against the same tree.
pub struct CheckpointManager {
    root: PathBuf,
    store: Arc<dyn SnapshotStore>,
    /// Manifest and id of the most recent checkpoint; an unchanged tree
    /// reuses the id instead of storing an empty snapshot
    last: RwLock<Option<(BTreeMap<String, ContentHash>, CheckpointId)>>,
}

impl CheckpointManager {
    /// Create a manager for the tree at `root` backed by `store`
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            root: root.into(),
            store,
            last: RwLock::new(None),
        }
    }

    /// Working tree root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Capture the current tree state as a checkpoint
    ///
    /// Reports [`CheckpointOutcome::Unchanged`] with the prior
    /// checkpoint's id when no tracked file changed since the last
    /// checkpoint, rather than storing an empty snapshot.
    ///
    /// # Errors
    /// Returns error if the tree cannot be read or the store write fails.
    pub fn create(
        &self,
        options: &CheckpointOptions,
    ) -> Result<CheckpointOutcome, CheckpointError> {
        let snapshot = EnvironmentSnapshot::capture(&self.root)?;

        let manifest: BTreeMap<String, ContentHash> = snapshot
            .files
            .into_iter()
            .filter(|(path, _)| {
                options.include_untracked
                    || options
                        .tracked
                        .as_ref()
                        .is_some_and(|tracked| tracked.contains(path))
            })
            .collect();

        if let Some((last_manifest, last_id)) = self.last.read().as_ref() {
            if last_manifest == &manifest {
                tracing::info!(
                    root = %self.root.display(),
                    id = %last_id,
                    "tree unchanged since last checkpoint"
                );
                return Ok(CheckpointOutcome::Unchanged(*last_id));
            }
        }

        let mut contents = BTreeMap::new();
        for path in manifest.keys() {
            let full = self.root.join(path);
            let bytes = std::fs::read(&full)
                .map_err(|source| CheckpointError::Io { path: full, source })?;
            contents.insert(path.clone(), bytes);
        }

        let id = self.store.create_snapshot(&contents, &options.message)?;
        let checkpoint = Checkpoint {
            id,
            created_at: Utc::now(),
            message: options.message.clone(),
            files: manifest.keys().cloned().collect(),
        };

        *self.last.write() = Some((manifest, id));
        Ok(CheckpointOutcome::Created(checkpoint))
    }

    /// Restore the checkpoint with the given id, byte-for-byte
    ///
    /// Returns the restored relative paths.
    ///
    /// # Errors
    /// `CheckpointError::CheckpointNotFound` if the id is unknown.
    pub fn restore(&self, id: &CheckpointId) -> Result<Vec<String>, CheckpointError> {
        let restored = self.store.restore_snapshot(id, &self.root)?;
        // The tree no longer matches the last created manifest.
        *self.last.write() = None;
        Ok(restored)
    }

    /// List all checkpoints in the backing store
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn list(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        self.store.list_snapshots()
    }
}
