//! Pipeline orchestration
//!
//! One run wires the components end to end: environment snapshot,
//! checkpoint, plan, ordered execution with per-file fan-out, gate
//! pipeline, and the final keep/rollback/restore decision. Plan errors
//! abort before any file is touched; everything after execution starts
//! is reported, not raised.

use crate::error::PipelineError;
use crate::report::{RollbackDecision, RunReport};
use chrono::Utc;
use recast_checkpoint::{CheckpointManager, CheckpointOptions, SnapshotStore};
use recast_env::{diff, EnvironmentSnapshot};
use recast_exec::{Executor, RollbackManager, RollbackPlan, TransformationResult};
use recast_gate::{CancelFlag, CheckArtifact, GatePipeline, PipelineOptions};
use recast_plan::{PlanBuilder, PlanOptions};
use recast_rule::{TransformationId, TransformationRegistry};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Run-level configuration
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub plan: PlanOptions,
    pub gates: PipelineOptions,
    pub checkpoint: CheckpointOptions,
    /// Run the full pipeline without writing any file
    pub dry_run: bool,
    /// Proceed even when the plan carries unresolved (manual) conflicts
    pub allow_manual_conflicts: bool,
}

/// One batch of work: which transformations to apply to which files
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub transformations: Vec<TransformationId>,
    /// Target files, relative to the pipeline root
    pub targets: Vec<String>,
}

/// End-to-end transformation pipeline for one working tree
///
/// The pipeline is the sole writer of the tree during a run; callers
/// serialize runs against the same tree.
pub struct TransformationPipeline {
    root: PathBuf,
    registry: TransformationRegistry,
    checkpoints: CheckpointManager,
    gates: GatePipeline,
    config: PipelineConfig,
    cancel: CancelFlag,
}

impl TransformationPipeline {
    /// Assemble a pipeline over the tree at `root`
    pub fn new(
        root: impl Into<PathBuf>,
        registry: TransformationRegistry,
        store: Arc<dyn SnapshotStore>,
        gates: GatePipeline,
        config: PipelineConfig,
    ) -> Self {
        let root = root.into();
        let checkpoints = CheckpointManager::new(&root, store);
        Self {
            root,
            registry,
            checkpoints,
            gates,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for cooperatively cancelling an in-flight run
    #[inline]
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Execute one run end to end
    ///
    /// # Errors
    /// Only configuration-level failures abort: plan errors, manual
    /// approval, snapshot or checkpoint failures. These all occur before
    /// any target file is written. Execution and gate failures are
    /// reported in the returned [`RunReport`].
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();

        let before = EnvironmentSnapshot::capture(&self.root)?;

        let plan = PlanBuilder::new().build(
            &self.registry,
            &request.transformations,
            self.config.plan,
        )?;
        if plan.requires_manual_approval() && !self.config.allow_manual_conflicts {
            let manual = plan
                .conflicts
                .iter()
                .filter(|c| c.is_manual())
                .count();
            return Err(PipelineError::ManualApprovalRequired(manual));
        }

        // An unchanged tree reuses the prior checkpoint's id, so a restore
        // target exists for every non-dry run.
        let checkpoint = if self.config.dry_run {
            None
        } else {
            Some(self.checkpoints.create(&self.config.checkpoint)?.id())
        };

        let (results, rollback_plan, mutated_files) =
            self.execute(&plan.execution_order, &request.targets, &before).await?;

        let after = EnvironmentSnapshot::capture(&self.root)?;
        let env_diff = diff(&before, &after);
        let expected: BTreeSet<&str> = mutated_files.iter().map(String::as_str).collect();
        let unexpected_changes: Vec<String> = env_diff
            .touched_files()
            .into_iter()
            .filter(|path| !expected.contains(path))
            .map(str::to_string)
            .collect();
        if !unexpected_changes.is_empty() {
            tracing::warn!(
                files = unexpected_changes.len(),
                "changes outside declared targets"
            );
        }

        let artifact = self.build_artifact(&results, &mutated_files);
        let gates = self.gates.run(&artifact, self.config.gates, &self.cancel).await;

        let execution_ok = results.iter().all(|r| r.success);
        let success = execution_ok && gates.overall_passed && gates.critical_failures == 0;

        let (rollback, decision) = if success {
            if mutated_files.is_empty() {
                (None, RollbackDecision::NothingToUndo)
            } else {
                (None, RollbackDecision::Kept)
            }
        } else if self.config.dry_run || mutated_files.is_empty() {
            (None, RollbackDecision::NothingToUndo)
        } else {
            // Hooks only cover mutations that recorded a payload; any
            // uncovered mutated file forces the checkpoint backstop.
            let covered: BTreeSet<&std::path::Path> = rollback_plan
                .entries()
                .iter()
                .map(|e| e.path.as_path())
                .collect();
            let fully_covered = mutated_files
                .iter()
                .all(|t| covered.contains(self.root.join(t).as_path()));

            if !fully_covered {
                if let Some(id) = &checkpoint {
                    self.checkpoints.restore(id)?;
                    (None, RollbackDecision::CheckpointRestored)
                } else {
                    let report = RollbackManager::new(before.dependencies.clone())
                        .execute(&rollback_plan, &self.registry);
                    (Some(report), RollbackDecision::RolledBack)
                }
            } else {
                let report = RollbackManager::new(before.dependencies.clone())
                    .execute(&rollback_plan, &self.registry);
                if report.success && report.skipped.is_empty() {
                    (Some(report), RollbackDecision::RolledBack)
                } else if let Some(id) = &checkpoint {
                    self.checkpoints.restore(id)?;
                    (Some(report), RollbackDecision::CheckpointRestored)
                } else {
                    (Some(report), RollbackDecision::RolledBack)
                }
            }
        };

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            success,
            dry_run: self.config.dry_run,
            plan,
            checkpoint,
            results,
            mutated_files,
            unexpected_changes,
            gates,
            rollback,
            decision,
        };

        tracing::info!(
            success = report.success,
            mutated = report.mutated_files.len(),
            decision = ?report.decision,
            "run finished"
        );
        Ok(report)
    }

    /// Apply transformations in plan order, fanning out across target
    /// files within each step
    ///
    /// Transformations execute strictly sequentially for dependency
    /// correctness; files within one step are independent and run
    /// concurrently. A transformation that failed on any file poisons
    /// its transitive dependents, which are skipped.
    async fn execute(
        &self,
        order: &[TransformationId],
        targets: &[String],
        before: &EnvironmentSnapshot,
    ) -> Result<(Vec<TransformationResult>, RollbackPlan, Vec<String>), PipelineError> {
        let executor = Arc::new(Executor::new(before.dependencies.clone()));
        let mut results = Vec::new();
        let mut rollback_plan = RollbackPlan::new();
        let mut mutated = BTreeSet::new();
        let mut failed: BTreeSet<TransformationId> = BTreeSet::new();

        for id in order {
            let transformation = self
                .registry
                .get(id)
                .ok_or_else(|| PipelineError::MissingTransformation(id.clone()))?;

            if self.cancel.is_cancelled() {
                tracing::info!(id = %id, "cancelled before step");
                break;
            }

            let poisoned: Vec<&TransformationId> = transformation
                .spec()
                .dependencies
                .iter()
                .filter(|dep| failed.contains(dep))
                .collect();
            if !poisoned.is_empty() {
                let reason = format!(
                    "skipped: dependency {} failed",
                    poisoned
                        .iter()
                        .map(|d| d.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                tracing::warn!(id = %id, %reason);
                failed.insert(id.clone());
                results.extend(targets.iter().map(|target| TransformationResult {
                    transformation_id: id.clone(),
                    path: self.root.join(target),
                    success: false,
                    changes: Vec::new(),
                    changed: false,
                    transformed_content: None,
                    syntax_valid: false,
                    rollback_payload: None,
                    diagnostics: vec![reason.clone()],
                    metrics: recast_exec::ExecutionMetrics::default(),
                }));
                continue;
            }

            let handles: Vec<_> = targets
                .iter()
                .map(|target| {
                    let executor = Arc::clone(&executor);
                    let transformation = Arc::clone(&transformation);
                    let path = self.root.join(target);
                    let dry_run = self.config.dry_run;
                    tokio::task::spawn_blocking(move || {
                        executor.apply_to_file(transformation.as_ref(), &path, dry_run)
                    })
                })
                .collect();

            let step_results = futures::future::join_all(handles).await;
            for (target, joined) in targets.iter().zip(step_results) {
                let result = joined.map_err(|e| PipelineError::TaskJoin(e.to_string()))?;

                if !result.success {
                    failed.insert(id.clone());
                }
                if result.mutated() && !self.config.dry_run {
                    mutated.insert(target.clone());
                    if let Some(payload) = &result.rollback_payload {
                        rollback_plan.record(id.clone(), &result.path, payload.clone());
                    }
                }
                results.push(result);
            }
        }

        Ok((results, rollback_plan, mutated.into_iter().collect()))
    }

    /// Assemble the artifact the gates check: every mutated file's final
    /// content
    fn build_artifact(
        &self,
        results: &[TransformationResult],
        mutated_files: &[String],
    ) -> CheckArtifact {
        // Last write wins: later results overwrite earlier content for
        // the same path.
        let mut latest: BTreeMap<String, String> = BTreeMap::new();
        for result in results {
            if !result.mutated() {
                continue;
            }
            if let Some(content) = &result.transformed_content {
                let relative = result
                    .path
                    .strip_prefix(&self.root)
                    .unwrap_or(&result.path)
                    .to_string_lossy()
                    .replace('\\', "/");
                latest.insert(relative, content.clone());
            }
        }

        let mut artifact = CheckArtifact::new(&self.root);
        for path in mutated_files {
            if let Some(content) = latest.get(path) {
                artifact = artifact.with_file(path.clone(), content.clone());
            }
        }
        artifact
    }
}

impl std::fmt::Debug for TransformationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformationPipeline")
            .field("root", &self.root)
            .field("registry", &self.registry)
            .field("gates", &self.gates)
            .finish()
    }
}
