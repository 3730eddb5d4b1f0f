//! Run reports
//!
//! Every run, successful or not, produces a [`RunReport`]: which files
//! were actually mutated, what each transformation did, how each gate
//! voted, and the final rollback decision. The report serializes to
//! JSON and renders to a human-readable summary.

use chrono::{DateTime, Utc};
use recast_checkpoint::CheckpointId;
use recast_exec::{RollbackReport, TransformationResult};
use recast_gate::PipelineResult;
use recast_plan::TransformationPlan;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// What the pipeline decided to do about the working tree at the end of
/// the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackDecision {
    /// All gates passed; changes kept
    Kept,
    /// Changes undone via transformation rollback hooks
    RolledBack,
    /// Rollback was incomplete; the pre-run checkpoint was restored
    CheckpointRestored,
    /// Nothing was written (dry run or no changes), so nothing to undo
    NothingToUndo,
}

/// Complete record of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Overall verdict: executed cleanly and every gate passed
    pub success: bool,
    pub dry_run: bool,
    pub plan: TransformationPlan,
    /// Checkpoint taken before execution, if the tree had content
    pub checkpoint: Option<CheckpointId>,
    /// Per-(transformation, file) outcomes, in application order
    pub results: Vec<TransformationResult>,
    /// Relative paths actually written during the run
    pub mutated_files: Vec<String>,
    /// Files the environment diff shows changed outside the declared
    /// targets
    pub unexpected_changes: Vec<String>,
    pub gates: PipelineResult,
    pub rollback: Option<RollbackReport>,
    pub decision: RollbackDecision,
}

impl RunReport {
    /// Human-readable summary of the run
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "run {}: {}{}",
            if self.success { "PASSED" } else { "FAILED" },
            self.plan.execution_order.len(),
            if self.dry_run {
                " transformation(s), dry run"
            } else {
                " transformation(s)"
            }
        );

        if let Some(checkpoint) = &self.checkpoint {
            let _ = writeln!(out, "checkpoint: {checkpoint}");
        }

        let _ = writeln!(out, "\ntransformations:");
        for result in &self.results {
            let _ = writeln!(
                out,
                "  [{}] {} on {}",
                if result.success { "ok" } else { "FAIL" },
                result.transformation_id,
                result.path.display()
            );
            for diagnostic in &result.diagnostics {
                let _ = writeln!(out, "      {diagnostic}");
            }
        }

        let _ = writeln!(out, "\ngates:");
        for outcome in &self.gates.outcomes {
            let _ = writeln!(
                out,
                "  [{}] {} ({:?})",
                if outcome.result.passed { "ok" } else { "FAIL" },
                outcome.name,
                outcome.severity
            );
            for violation in &outcome.result.violations {
                let _ = writeln!(out, "      {:?}: {}", violation.severity, violation.message);
            }
        }
        for name in &self.gates.skipped {
            let _ = writeln!(out, "  [skip] {name}");
        }
        let _ = writeln!(
            out,
            "quality {:.0}%, safety {:.0}%, critical failures {}",
            self.gates.quality_score, self.gates.safety_score, self.gates.critical_failures
        );

        if self.mutated_files.is_empty() {
            let _ = writeln!(out, "\nno files mutated");
        } else {
            let _ = writeln!(out, "\nmutated files:");
            for path in &self.mutated_files {
                let _ = writeln!(out, "  {path}");
            }
        }

        if !self.unexpected_changes.is_empty() {
            let _ = writeln!(out, "\nunexpected changes outside declared targets:");
            for path in &self.unexpected_changes {
                let _ = writeln!(out, "  {path}");
            }
        }

        let decision = match self.decision {
            RollbackDecision::Kept => "changes kept",
            RollbackDecision::RolledBack => "changes rolled back",
            RollbackDecision::CheckpointRestored => "checkpoint restored",
            RollbackDecision::NothingToUndo => "nothing to undo",
        };
        let _ = writeln!(out, "\ndecision: {decision}");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_gate::{GateOutcome, GateResult, Severity};
    use recast_plan::ImpactEstimate;

    fn minimal_report(success: bool, decision: RollbackDecision) -> RunReport {
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            success,
            dry_run: false,
            plan: TransformationPlan {
                requested: vec!["t1".into()],
                execution_order: vec!["t1".into()],
                layers: vec![vec!["t1".into()]],
                conflicts: Vec::new(),
                impact: ImpactEstimate::default(),
            },
            checkpoint: None,
            results: Vec::new(),
            mutated_files: vec!["src/lib.rs".to_string()],
            unexpected_changes: Vec::new(),
            gates: PipelineResult {
                overall_passed: success,
                critical_failures: 0,
                total_violations: 0,
                quality_score: 100.0,
                safety_score: 100.0,
                recommendations: Vec::new(),
                outcomes: vec![GateOutcome {
                    name: "tests".to_string(),
                    severity: Severity::Critical,
                    result: GateResult::passing(),
                }],
                skipped: Vec::new(),
                cancelled: false,
            },
            rollback: None,
            decision,
        }
    }

    #[test]
    fn render_names_mutated_files_and_decision() {
        let report = minimal_report(true, RollbackDecision::Kept);
        let text = report.render();

        assert!(text.contains("PASSED"));
        assert!(text.contains("src/lib.rs"));
        assert!(text.contains("changes kept"));
        assert!(text.contains("[ok] tests"));
    }

    #[test]
    fn failed_report_states_rollback_decision() {
        let report = minimal_report(false, RollbackDecision::CheckpointRestored);
        let text = report.render();

        assert!(text.contains("FAILED"));
        assert!(text.contains("checkpoint restored"));
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = minimal_report(true, RollbackDecision::Kept);
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();

        assert_eq!(back.success, report.success);
        assert_eq!(back.mutated_files, report.mutated_files);
        assert_eq!(back.decision, report.decision);
    }
}
