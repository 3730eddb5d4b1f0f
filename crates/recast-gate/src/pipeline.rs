//! Gate pipeline
//!
//! Runs registered gates in registration order (or concurrently),
//! aggregates their results into a single pass/fail verdict with
//! quality and safety scores.
//!
//! # Aggregation contract
//!
//! `critical_failures` counts two things additively:
//!
//! 1. every failed gate whose severity is `Critical`, and
//! 2. every `Error`-severity violation inside any gate's result,
//!    regardless of that gate's severity.
//!
//! A single failing critical gate that reports one error violation
//! therefore contributes 2. Downstream callers key abort decisions off
//! `critical_failures > 0`, so both counters must stay additive.

use crate::cancel::CancelFlag;
use crate::gate::{CheckArtifact, GateResult, SafetyGate, Severity, Violation, ViolationSeverity};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How gates are scheduled within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateExecution {
    /// One gate at a time, in registration order
    #[default]
    Sequential,
    /// All gates launched together, results joined before aggregation
    ///
    /// Only safe when no two gates share side effects (e.g. a build
    /// cache); callers choose.
    Concurrent,
}

/// Per-run pipeline options
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Escalate failed high-severity gates into `critical_failures`
    pub strict_mode: bool,
    /// Skip (never invoke) gates registered with `Severity::Low`
    pub skip_non_critical: bool,
    pub execution: GateExecution,
}

/// One gate's recorded outcome within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateOutcome {
    pub name: String,
    pub severity: Severity,
    pub result: GateResult,
}

/// Aggregated outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// True iff every executed gate passed
    pub overall_passed: bool,
    /// See the module-level aggregation contract
    pub critical_failures: u32,
    pub total_violations: u32,
    /// Fraction of executed gates that passed, in [0, 100]
    pub quality_score: f64,
    /// Fraction of executed critical gates that passed, in [0, 100];
    /// 100 when no critical gate was executed
    pub safety_score: f64,
    /// All gates' suggestions concatenated, duplicates preserved
    pub recommendations: Vec<String>,
    /// Per-gate outcomes, in registration order
    pub outcomes: Vec<GateOutcome>,
    /// Names of gates skipped (disabled, `skip_non_critical`, or
    /// cancellation)
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

/// Ordered set of gates executed per run
///
/// Keyed by name with insertion order preserved; re-registering a name
/// replaces the gate but keeps its original position.
#[derive(Default)]
pub struct GatePipeline {
    gates: IndexMap<String, Arc<dyn SafetyGate>>,
}

impl GatePipeline {
    /// Create an empty pipeline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate; execution follows registration order
    pub fn register(&mut self, gate: Arc<dyn SafetyGate>) {
        let name = gate.name().to_string();
        if self.gates.insert(name.clone(), gate).is_some() {
            tracing::warn!(gate = %name, "gate re-registered, replacing previous");
        }
    }

    /// Number of registered gates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if no gates are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Run all applicable gates against `artifact`
    pub async fn run(
        &self,
        artifact: &CheckArtifact,
        options: PipelineOptions,
        cancel: &CancelFlag,
    ) -> PipelineResult {
        let mut outcomes = Vec::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;

        let mut runnable: Vec<&Arc<dyn SafetyGate>> = Vec::new();
        for gate in self.gates.values() {
            if !gate.enabled() {
                skipped.push(gate.name().to_string());
                continue;
            }
            if options.skip_non_critical && gate.severity() == Severity::Low {
                tracing::debug!(gate = gate.name(), "low-severity gate skipped");
                skipped.push(gate.name().to_string());
                continue;
            }
            runnable.push(gate);
        }

        match options.execution {
            GateExecution::Sequential => {
                for gate in runnable {
                    if cancel.is_cancelled() {
                        cancelled = true;
                        skipped.push(gate.name().to_string());
                        continue;
                    }
                    outcomes.push(execute_gate(gate.as_ref(), artifact).await);
                }
            }
            GateExecution::Concurrent => {
                if cancel.is_cancelled() {
                    cancelled = true;
                    skipped.extend(runnable.iter().map(|g| g.name().to_string()));
                } else {
                    let futures = runnable
                        .iter()
                        .map(|gate| execute_gate(gate.as_ref(), artifact));
                    outcomes = futures::future::join_all(futures).await;
                }
            }
        }

        aggregate(outcomes, skipped, cancelled, options)
    }
}

impl std::fmt::Debug for GatePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatePipeline")
            .field("gates", &self.gates.len())
            .finish()
    }
}

/// Run one gate, folding any error into a failed result
async fn execute_gate(gate: &dyn SafetyGate, artifact: &CheckArtifact) -> GateOutcome {
    let result = match gate.check(artifact).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(gate = gate.name(), error = %err, "gate errored, recorded as failed");
            GateResult::failing(vec![Violation::new(
                ViolationSeverity::Warning,
                format!("gate execution error: {err}"),
            )])
        }
    };

    GateOutcome {
        name: gate.name().to_string(),
        severity: gate.severity(),
        result,
    }
}

fn aggregate(
    outcomes: Vec<GateOutcome>,
    skipped: Vec<String>,
    cancelled: bool,
    options: PipelineOptions,
) -> PipelineResult {
    let executed = outcomes.len() as u32;
    let passing = outcomes.iter().filter(|o| o.result.passed).count() as u32;

    let critical_total = outcomes
        .iter()
        .filter(|o| o.severity == Severity::Critical)
        .count() as u32;
    let critical_passing = outcomes
        .iter()
        .filter(|o| o.severity == Severity::Critical && o.result.passed)
        .count() as u32;

    let mut critical_failures = 0u32;
    for outcome in &outcomes {
        if !outcome.result.passed && outcome.severity == Severity::Critical {
            critical_failures += 1;
        }
        if options.strict_mode && !outcome.result.passed && outcome.severity == Severity::High {
            critical_failures += 1;
        }
        critical_failures += outcome.result.error_violations();
    }

    let total_violations = outcomes
        .iter()
        .map(|o| o.result.violations.len() as u32)
        .sum();

    let quality_score = if executed == 0 {
        100.0
    } else {
        f64::from(passing) / f64::from(executed) * 100.0
    };
    let safety_score = if critical_total == 0 {
        100.0
    } else {
        f64::from(critical_passing) / f64::from(critical_total) * 100.0
    };

    let recommendations = outcomes
        .iter()
        .flat_map(|o| o.result.suggestions.iter().cloned())
        .collect();

    PipelineResult {
        overall_passed: outcomes.iter().all(|o| o.result.passed),
        critical_failures,
        total_violations,
        quality_score,
        safety_score,
        recommendations,
        outcomes,
        skipped,
        cancelled,
    }
}
