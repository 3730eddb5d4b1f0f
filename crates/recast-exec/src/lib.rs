//! Recast Transformation Executor
//!
//! Applies transformations to files one at a time: fresh per-file
//! context, optional pre-apply validation, timed and memory-probed
//! apply, tree-sitter syntax gating of the proposal, and a write that
//! happens only when everything upstream passed. Successful
//! applications with undo payloads accumulate in a [`RollbackPlan`]
//! that the [`RollbackManager`] replays strictly in reverse.

mod executor;
mod metrics;
mod rollback;
mod syntax;

pub use executor::{Executor, TransformationResult};
pub use metrics::{complexity_estimate, ExecutionMetrics};
pub use rollback::{
    RollbackEntry, RollbackFailure, RollbackManager, RollbackPlan, RollbackReport,
};
pub use syntax::{SyntaxLanguage, SyntaxValidator, SyntaxVerdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
