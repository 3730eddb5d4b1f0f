//! Ordered rollback
//!
//! Each successful application that carried a rollback payload is
//! recorded in application order; undoing walks the records strictly in
//! reverse, once each. Entries whose transformation has no rollback hook
//! are skipped with a warning rather than failing the whole pass.

use recast_rule::{TransformationContext, TransformationId, TransformationRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One undoable application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackEntry {
    pub transformation_id: TransformationId,
    pub path: PathBuf,
    /// Opaque payload the transformation's hook recorded during apply
    pub payload: serde_json::Value,
}

/// Append-only record of undoable applications, in application order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub created_at: chrono::DateTime<chrono::Utc>,
    entries: Vec<RollbackEntry>,
}

impl RollbackPlan {
    /// Create an empty plan
    #[must_use]
    pub fn new() -> Self {
        Self {
            created_at: chrono::Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Record an application; must be called in application order
    pub fn record(
        &mut self,
        transformation_id: TransformationId,
        path: impl Into<PathBuf>,
        payload: serde_json::Value,
    ) {
        self.entries.push(RollbackEntry {
            transformation_id,
            path: path.into(),
            payload,
        });
    }

    /// Recorded entries, oldest first
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[RollbackEntry] {
        &self.entries
    }

    /// Number of recorded entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no applications were recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One failed undo attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackFailure {
    pub transformation_id: TransformationId,
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of executing a rollback plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollbackReport {
    /// True when every entry was either undone or cleanly skipped
    pub success: bool,
    /// Ids undone, in undo (reverse-application) order
    pub undone: Vec<TransformationId>,
    /// Ids skipped because the transformation exposes no rollback hook
    pub skipped: Vec<TransformationId>,
    pub failures: Vec<RollbackFailure>,
}

/// Executes rollback plans against the current filesystem state
#[derive(Debug, Default)]
pub struct RollbackManager {
    dependencies: BTreeMap<String, String>,
}

impl RollbackManager {
    /// Create a manager with the project's declared dependencies
    #[must_use]
    pub fn new(dependencies: BTreeMap<String, String>) -> Self {
        Self { dependencies }
    }

    /// Undo every recorded application in strict reverse order
    ///
    /// Each entry is attempted exactly once. A failing or missing hook
    /// does not stop later entries; all failures are collected and
    /// reflected in the report's `success` flag.
    pub fn execute(
        &self,
        plan: &RollbackPlan,
        registry: &TransformationRegistry,
    ) -> RollbackReport {
        let mut report = RollbackReport {
            success: true,
            ..RollbackReport::default()
        };

        for entry in plan.entries.iter().rev() {
            let id = entry.transformation_id.clone();

            let Some(transformation) = registry.get(&id) else {
                tracing::warn!(id = %id, "transformation no longer registered, skipping undo");
                report.skipped.push(id);
                continue;
            };

            let Some(hook) = transformation.rollback() else {
                tracing::warn!(id = %id, "no rollback hook, skipping undo");
                report.skipped.push(id);
                continue;
            };

            match self.undo_entry(hook, entry) {
                Ok(()) => report.undone.push(id),
                Err(reason) => {
                    tracing::error!(id = %id, path = %entry.path.display(), %reason, "undo failed");
                    report.failures.push(RollbackFailure {
                        transformation_id: id,
                        path: entry.path.clone(),
                        reason,
                    });
                    report.success = false;
                }
            }
        }

        report
    }

    fn undo_entry(
        &self,
        hook: &dyn recast_rule::RollbackHook,
        entry: &RollbackEntry,
    ) -> Result<(), String> {
        // Fresh context per entry: earlier undos in this pass may already
        // have rewritten the same file.
        let ctx = TransformationContext::from_file(&entry.path, self.dependencies.clone())
            .map_err(|e| e.to_string())?;
        let restored = hook.undo(&ctx, &entry.payload).map_err(|e| e.to_string())?;
        write_restored(&entry.path, &restored)
    }
}

fn write_restored(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content).map_err(|e| format!("write failed at {}: {e}", path.display()))
}
