//! The transformation capability interface
//!
//! Every editing rule satisfies one closed interface: a mandatory `apply`
//! plus optional `validate` and `rollback` capabilities. Absence of an
//! optional hook is represented explicitly by `Option`, never by
//! downstream feature probing.

use crate::change::CodeChange;
use crate::context::TransformationContext;
use crate::types::{Category, RiskLevel, TransformationId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Static metadata of a registered transformation
///
/// Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationSpec {
    pub id: TransformationId,
    pub name: String,
    pub description: String,
    pub version: String,
    pub risk: RiskLevel,
    pub category: Category,
    /// Transformations that must be applied before this one
    pub dependencies: Vec<TransformationId>,
    /// Transformations this one cannot share a plan with unresolved
    pub conflicts: Vec<TransformationId>,
}

impl TransformationSpec {
    /// Create a spec with empty dependency and conflict lists
    #[must_use]
    pub fn new(
        id: impl Into<TransformationId>,
        name: impl Into<String>,
        risk: RiskLevel,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            risk,
            category,
            dependencies: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Set the description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare dependencies on other transformations
    #[inline]
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<TransformationId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Declare conflicts with other transformations
    #[inline]
    #[must_use]
    pub fn with_conflicts(mut self, conflicts: Vec<TransformationId>) -> Self {
        self.conflicts = conflicts;
        self
    }
}

/// Result of a successful `apply`
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Ordered located edits
    pub changes: Vec<CodeChange>,
    /// The full proposed file content
    pub content: String,
    /// Opaque data the rollback hook needs to undo this application
    pub rollback_payload: Option<serde_json::Value>,
}

impl ApplyOutcome {
    /// Outcome whose proposed content equals the original (no-op)
    #[must_use]
    pub fn unchanged(ctx: &TransformationContext) -> Self {
        Self {
            changes: Vec::new(),
            content: ctx.original_content.clone(),
            rollback_payload: None,
        }
    }
}

/// Verdict of the optional pre-apply validation hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleValidation {
    /// The rule's effect is already present; applying again is a no-op
    AlreadySatisfied,
    /// The rule applies to this file
    Applicable,
}

/// Undo capability of a transformation
pub trait RollbackHook: Send + Sync {
    /// Undo a previous application, given the payload recorded by `apply`
    ///
    /// Returns the restored file content; the caller performs the write.
    ///
    /// # Errors
    /// Returns error if the payload is invalid or the undo cannot be
    /// computed from it.
    fn undo(
        &self,
        ctx: &TransformationContext,
        payload: &serde_json::Value,
    ) -> Result<String, TransformError>;
}

/// A named, versioned unit of change
///
/// Implementations are immutable once registered and shared behind `Arc`.
pub trait Transformation: Send + Sync {
    /// Static metadata (id, risk, category, dependencies, conflicts)
    fn spec(&self) -> &TransformationSpec;

    /// Apply the rule to one file's context
    ///
    /// # Errors
    /// Returns error when the rule cannot produce a proposal for this
    /// file; the executor converts this into a failed result, never a
    /// panic or propagated error.
    fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError>;

    /// Optional pre-apply validation; `None` when the rule has no
    /// validator
    fn validate(&self, _ctx: &TransformationContext) -> Option<RuleValidation> {
        None
    }

    /// Optional undo capability; `None` when the rule cannot undo itself
    fn rollback(&self) -> Option<&dyn RollbackHook> {
        None
    }
}

/// Errors raised by transformation hooks
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The apply hook could not produce a proposal
    #[error("apply failed: {0}")]
    ApplyFailed(String),

    /// The rollback hook could not undo its effect
    #[error("rollback failed: {0}")]
    RollbackFailed(String),

    /// The recorded rollback payload is unusable
    #[error("invalid rollback payload: {0}")]
    InvalidPayload(String),

    /// File access failed while building a context
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
