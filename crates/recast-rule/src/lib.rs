//! Recast Transformation Model
//!
//! The data model shared by the plan builder, executor, and rollback
//! manager:
//!
//! - [`Transformation`]: the closed capability interface every editing
//!   rule satisfies (`apply` mandatory, `validate`/`rollback` optional)
//! - [`TransformationSpec`]: immutable metadata (id, risk, category,
//!   dependencies, conflicts)
//! - [`TransformationContext`]: per-(transformation, file) execution scope
//! - [`CodeChange`]: one located edit
//! - [`TransformationRegistry`]: explicitly constructed rule store

mod change;
mod context;
mod registry;
mod transformation;
mod types;

pub use change::{ChangeKind, CodeChange, Span};
pub use context::{FileMetadata, TransformationContext};
pub use registry::{RegistryError, TransformationRegistry};
pub use transformation::{
    ApplyOutcome, RollbackHook, RuleValidation, TransformError, Transformation,
    TransformationSpec,
};
pub use types::{Category, RiskLevel, TransformationId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
