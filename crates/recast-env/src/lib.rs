//! Recast Environment State Tracker
//!
//! Content-hashes every file under a working tree, records declared
//! dependency versions and build-artifact presence, and diffs two such
//! snapshots into added/changed/removed sets.
//!
//! # Core Concepts
//!
//! - [`ContentHash`]: 32-byte Blake3 hash for content addressing
//! - [`EnvironmentSnapshot`]: immutable point-in-time state of a tree
//! - [`diff`]: pure comparison of two snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! let before = EnvironmentSnapshot::capture(&root)?;
//! // ... apply transformations ...
//! let after = EnvironmentSnapshot::capture(&root)?;
//! let changes = recast_env::diff(&before, &after);
//! ```

mod error;
mod hash;
mod manifest;
mod snapshot;

pub use error::EnvError;
pub use hash::{ContentHash, HashError};
pub use manifest::parse_declared_dependencies;
pub use snapshot::{diff, DependencyChange, EnvironmentDiff, EnvironmentSnapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
