//! Recast Transformation Plan Builder
//!
//! Given a set of registered transformation ids, detects pairwise
//! conflicts, attempts automatic resolution, computes a
//! dependency-respecting execution order (with concurrency layers), and
//! estimates aggregate risk and impact.
//!
//! # Guarantees
//!
//! - The execution order never places a transformation before any of its
//!   declared dependencies within the requested set.
//! - Optimize-order reordering happens only inside dependency layers, so
//!   it cannot violate the dependency partial order.
//! - A plan containing a `Manual` conflict resolution reports
//!   [`TransformationPlan::requires_manual_approval`] and must not be
//!   auto-executed.

mod builder;
mod conflict;
mod error;
mod impact;
mod order;

pub use builder::{PlanBuilder, PlanOptions, TransformationPlan};
pub use conflict::{ConflictResolution, ResolutionStrategy};
pub use error::PlanError;
pub use impact::ImpactEstimate;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
