//! Recast Checkpoint Manager
//!
//! Captures restorable, content-addressed snapshots of a working tree and
//! restores them on demand. Checkpoint identifiers are derived from
//! content, never from wall-clock time or random values, so identical
//! change sets produce identical ids.
//!
//! The [`SnapshotStore`] trait is the version-control primitive boundary;
//! [`FsSnapshotStore`] is the built-in content-addressed implementation.

mod error;
mod manager;
mod store;

pub use error::CheckpointError;
pub use manager::{CheckpointManager, CheckpointOptions, CheckpointOutcome};
pub use store::{Checkpoint, CheckpointId, FsSnapshotStore, SnapshotStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
