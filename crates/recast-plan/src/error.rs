//! Error types for plan construction

use recast_rule::TransformationId;

/// Errors raised while building a transformation plan
///
/// Both variants are unrecoverable configuration errors: they abort the
/// whole run before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A requested id is not present in the registry
    #[error("unknown transformation: {0}")]
    UnknownTransformation(TransformationId),

    /// The declared dependencies of the requested set contain a cycle
    #[error("circular dependency involving transformation: {0}")]
    CircularDependency(TransformationId),
}
