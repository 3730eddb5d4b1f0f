//! Transformation executor
//!
//! Applies a single transformation to a single file: builds a fresh
//! context, runs the optional validator, times the apply, syntax-checks
//! the proposal, and only then writes. Hook failures are converted into
//! failed results; nothing past this boundary propagates an error.

use crate::metrics::{complexity_estimate, memory_delta, ExecutionMetrics, MemoryProbe};
use crate::syntax::{SyntaxValidator, SyntaxVerdict};
use recast_rule::{
    CodeChange, RuleValidation, TransformError, Transformation, TransformationContext,
    TransformationId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Outcome of applying one transformation to one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationResult {
    pub transformation_id: TransformationId,
    pub path: PathBuf,
    /// Whether the application is considered successful
    ///
    /// A syntactically invalid proposal is a failure even though the
    /// apply hook itself returned `Ok`.
    pub success: bool,
    /// Located edits the transformation produced
    pub changes: Vec<CodeChange>,
    /// Whether the proposed content differs from the original
    pub changed: bool,
    /// Proposed content, present when the apply hook ran to completion
    pub transformed_content: Option<String>,
    /// Whether the proposed content passed syntax validation
    pub syntax_valid: bool,
    /// Opaque undo data recorded by the apply hook
    pub rollback_payload: Option<serde_json::Value>,
    /// Human-readable notes: validation verdicts, errors, skip reasons
    pub diagnostics: Vec<String>,
    pub metrics: ExecutionMetrics,
}

impl TransformationResult {
    fn failure(
        transformation_id: TransformationId,
        path: PathBuf,
        diagnostic: String,
    ) -> Self {
        Self {
            transformation_id,
            path,
            success: false,
            changes: Vec::new(),
            changed: false,
            transformed_content: None,
            syntax_valid: false,
            rollback_payload: None,
            diagnostics: vec![diagnostic],
            metrics: ExecutionMetrics::default(),
        }
    }

    /// True when the file on disk was (or would be) modified
    #[inline]
    #[must_use]
    pub fn mutated(&self) -> bool {
        self.success && self.syntax_valid && self.changed
    }
}

/// Applies transformations to files with syntax gating
///
/// The executor owns the project's declared dependency map so every
/// context it builds carries the same resolved view.
#[derive(Debug)]
pub struct Executor {
    dependencies: BTreeMap<String, String>,
    syntax: SyntaxValidator,
}

impl Executor {
    /// Create an executor with the project's declared dependencies
    #[must_use]
    pub fn new(dependencies: BTreeMap<String, String>) -> Self {
        Self {
            dependencies,
            syntax: SyntaxValidator::new(),
        }
    }

    /// Apply `transformation` to the file at `path`
    ///
    /// With `dry_run` set, the full pipeline runs (validate, apply,
    /// syntax check, metrics) but the file is never written.
    ///
    /// This method does not return errors: every failure mode is folded
    /// into a `TransformationResult` with `success == false` and a
    /// diagnostic.
    pub fn apply_to_file(
        &self,
        transformation: &dyn Transformation,
        path: &Path,
        dry_run: bool,
    ) -> TransformationResult {
        let id = transformation.spec().id.clone();

        let ctx = match TransformationContext::from_file(path, self.dependencies.clone()) {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::warn!(id = %id, path = %path.display(), error = %err, "context build failed");
                return TransformationResult::failure(id, path.to_path_buf(), err.to_string());
            }
        };

        let mut diagnostics = Vec::new();

        if let Some(RuleValidation::AlreadySatisfied) = transformation.validate(&ctx) {
            diagnostics.push("already satisfied, nothing to apply".to_string());
            return TransformationResult {
                transformation_id: id,
                path: path.to_path_buf(),
                success: true,
                changes: Vec::new(),
                changed: false,
                transformed_content: None,
                syntax_valid: true,
                rollback_payload: None,
                diagnostics,
                metrics: ExecutionMetrics {
                    complexity_before: complexity_estimate(&ctx.original_content),
                    complexity_after: complexity_estimate(&ctx.original_content),
                    ..ExecutionMetrics::default()
                },
            };
        }

        let mut probe = MemoryProbe::new();
        let mem_before = probe.current_bytes();
        let started = Instant::now();
        let outcome = transformation.apply(&ctx);
        let execution_time_ms = started.elapsed().as_millis() as u64;
        let mem_after = probe.current_bytes();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(id = %id, path = %path.display(), error = %err, "apply failed");
                return TransformationResult::failure(id, path.to_path_buf(), err.to_string());
            }
        };

        let changed = outcome.content != ctx.original_content;
        let metrics = ExecutionMetrics {
            lines_changed: outcome
                .changes
                .iter()
                .map(|c| c.span.line_count())
                .sum(),
            complexity_before: complexity_estimate(&ctx.original_content),
            complexity_after: complexity_estimate(&outcome.content),
            execution_time_ms,
            memory_delta_bytes: memory_delta(mem_before, mem_after),
        };

        let (syntax_valid, success) = if changed {
            match self.syntax.validate(ctx.extension().as_deref(), &outcome.content) {
                SyntaxVerdict::Valid => (true, true),
                SyntaxVerdict::Unsupported => {
                    diagnostics.push("no grammar registered, syntax check skipped".to_string());
                    (true, true)
                }
                SyntaxVerdict::Invalid { message } => {
                    tracing::warn!(id = %id, path = %path.display(), %message, "proposal rejected");
                    diagnostics.push(message);
                    (false, false)
                }
            }
        } else {
            diagnostics.push("content unchanged".to_string());
            (true, true)
        };

        if changed && success && syntax_valid && !dry_run {
            if let Err(err) = write_proposal(path, &outcome.content) {
                tracing::error!(id = %id, path = %path.display(), error = %err, "write failed");
                let mut result =
                    TransformationResult::failure(id, path.to_path_buf(), err.to_string());
                result.metrics = metrics;
                return result;
            }
        }

        TransformationResult {
            transformation_id: id,
            path: path.to_path_buf(),
            success,
            changes: outcome.changes,
            changed,
            transformed_content: Some(outcome.content),
            syntax_valid,
            rollback_payload: outcome.rollback_payload,
            diagnostics,
            metrics,
        }
    }
}

fn write_proposal(path: &Path, content: &str) -> Result<(), TransformError> {
    std::fs::write(path, content).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_rule::{
        ApplyOutcome, Category, ChangeKind, RiskLevel, Span, TransformationSpec,
    };

    struct AppendRule {
        spec: TransformationSpec,
        suffix: String,
    }

    impl AppendRule {
        fn new(suffix: &str) -> Self {
            Self {
                spec: TransformationSpec::new(
                    "append",
                    "Append",
                    RiskLevel::Low,
                    Category::Cleanup,
                ),
                suffix: suffix.to_string(),
            }
        }
    }

    impl Transformation for AppendRule {
        fn spec(&self) -> &TransformationSpec {
            &self.spec
        }

        fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
            let content = format!("{}{}", ctx.original_content, self.suffix);
            let last_line = ctx.original_content.lines().count().max(1) as u32;
            Ok(ApplyOutcome {
                changes: vec![CodeChange::new(
                    ChangeKind::Insert,
                    Span::line(last_line),
                    String::new(),
                    self.suffix.clone(),
                    90,
                    RiskLevel::Low,
                )],
                content,
                rollback_payload: Some(serde_json::json!({ "appended": self.suffix })),
            })
        }
    }

    struct BreakSyntaxRule {
        spec: TransformationSpec,
    }

    impl Transformation for BreakSyntaxRule {
        fn spec(&self) -> &TransformationSpec {
            &self.spec
        }

        fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
            Ok(ApplyOutcome {
                changes: vec![CodeChange::new(
                    ChangeKind::Replace,
                    Span::line(1),
                    ctx.original_content.clone(),
                    "fn broken( {".to_string(),
                    50,
                    RiskLevel::High,
                )],
                content: "fn broken( {".to_string(),
                rollback_payload: None,
            })
        }
    }

    struct FailingRule {
        spec: TransformationSpec,
    }

    impl Transformation for FailingRule {
        fn spec(&self) -> &TransformationSpec {
            &self.spec
        }

        fn apply(&self, _ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
            Err(TransformError::ApplyFailed("deliberate".to_string()))
        }
    }

    struct SatisfiedRule {
        spec: TransformationSpec,
    }

    impl Transformation for SatisfiedRule {
        fn spec(&self) -> &TransformationSpec {
            &self.spec
        }

        fn apply(&self, _ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
            panic!("apply must not run when validation says already satisfied");
        }

        fn validate(&self, _ctx: &TransformationContext) -> Option<RuleValidation> {
            Some(RuleValidation::AlreadySatisfied)
        }
    }

    fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn successful_apply_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "lib.rs", "fn f() {}\n");

        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(&AppendRule::new("fn g() {}\n"), &path, false);

        assert!(result.success);
        assert!(result.syntax_valid);
        assert!(result.mutated());
        assert!(result.rollback_payload.is_some());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "fn f() {}\nfn g() {}\n"
        );
    }

    #[test]
    fn dry_run_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "lib.rs", "fn f() {}\n");

        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(&AppendRule::new("fn g() {}\n"), &path, true);

        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fn f() {}\n");
    }

    #[test]
    fn syntax_invalid_proposal_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let original = "fn f() {}\n";
        let path = write_fixture(&dir, "lib.rs", original);

        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(
            &BreakSyntaxRule {
                spec: TransformationSpec::new(
                    "break",
                    "Break",
                    RiskLevel::High,
                    Category::Refactor,
                ),
            },
            &path,
            false,
        );

        assert!(!result.success);
        assert!(!result.syntax_valid);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.contains("parse error")));
    }

    #[test]
    fn apply_error_becomes_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "lib.rs", "fn f() {}\n");

        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(
            &FailingRule {
                spec: TransformationSpec::new(
                    "fail",
                    "Fail",
                    RiskLevel::Medium,
                    Category::Optimize,
                ),
            },
            &path,
            false,
        );

        assert!(!result.success);
        assert!(result.diagnostics.iter().any(|d| d.contains("deliberate")));
    }

    #[test]
    fn missing_file_becomes_failed_result() {
        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(
            &AppendRule::new("x"),
            Path::new("/nonexistent/file.rs"),
            false,
        );
        assert!(!result.success);
    }

    #[test]
    fn already_satisfied_skips_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "lib.rs", "fn f() {}\n");

        let executor = Executor::new(BTreeMap::new());
        let result = executor.apply_to_file(
            &SatisfiedRule {
                spec: TransformationSpec::new(
                    "satisfied",
                    "Satisfied",
                    RiskLevel::Low,
                    Category::Cleanup,
                ),
            },
            &path,
            false,
        );

        assert!(result.success);
        assert!(!result.mutated());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.contains("already satisfied")));
    }
}
