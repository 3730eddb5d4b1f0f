//! Transformation plan builder
//!
//! Resolves a requested set of transformation ids against the registry,
//! detects and resolves conflicts, computes a dependency-respecting
//! execution order with concurrency layers, and estimates aggregate
//! impact. The resulting [`TransformationPlan`] is immutable.

use crate::conflict::{detect_and_resolve, ConflictResolution};
use crate::error::PlanError;
use crate::impact::{estimate, ImpactEstimate};
use crate::order::{dependency_layers, optimize_layers, topological_order};
use recast_rule::{TransformationId, TransformationRegistry, TransformationSpec};
use serde::{Deserialize, Serialize};

/// Options controlling plan construction
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    /// Attempt automatic conflict resolution
    pub resolve_conflicts: bool,
    /// Reorder within dependency layers by ascending risk and category
    pub optimize_order: bool,
}

/// An ordered, conflict-resolved batch of transformations
///
/// Built once per run; immutable thereafter. A plan containing any
/// `Manual` conflict resolution must not be auto-executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationPlan {
    /// The ids as requested by the caller
    pub requested: Vec<TransformationId>,
    /// Dependency-respecting execution order
    pub execution_order: Vec<TransformationId>,
    /// Dependency layers: transformations within one layer are mutually
    /// independent and may execute concurrently
    pub layers: Vec<Vec<TransformationId>>,
    /// Detected conflicts and how each was resolved
    pub conflicts: Vec<ConflictResolution>,
    /// Estimated aggregate impact
    pub impact: ImpactEstimate,
}

impl TransformationPlan {
    /// True when the plan contains an unresolved (manual) conflict and
    /// therefore requires human approval before execution
    #[must_use]
    pub fn requires_manual_approval(&self) -> bool {
        self.conflicts.iter().any(ConflictResolution::is_manual)
    }
}

/// Builds [`TransformationPlan`]s from a registry
#[derive(Debug, Default)]
pub struct PlanBuilder;

impl PlanBuilder {
    /// Create a plan builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build a plan for the requested ids
    ///
    /// # Errors
    /// - `PlanError::UnknownTransformation` if any id is unregistered
    /// - `PlanError::CircularDependency` if the requested set's declared
    ///   dependencies contain a cycle
    pub fn build(
        &self,
        registry: &TransformationRegistry,
        requested: &[TransformationId],
        options: PlanOptions,
    ) -> Result<TransformationPlan, PlanError> {
        let transformations: Vec<_> = requested
            .iter()
            .map(|id| {
                registry
                    .get(id)
                    .ok_or_else(|| PlanError::UnknownTransformation(id.clone()))
            })
            .collect::<Result<_, _>>()?;
        let specs: Vec<&TransformationSpec> =
            transformations.iter().map(|t| t.spec()).collect();

        let conflicts = detect_and_resolve(&specs, options.resolve_conflicts);

        let base_order = topological_order(&specs)?;
        let mut layers = dependency_layers(&base_order, &specs);
        let execution_order = if options.optimize_order {
            optimize_layers(&mut layers, &specs);
            layers.iter().flatten().cloned().collect()
        } else {
            base_order
        };

        let impact = estimate(&specs);

        tracing::info!(
            transformations = requested.len(),
            layers = layers.len(),
            conflicts = conflicts.len(),
            risk_score = impact.risk_score,
            "plan built"
        );

        Ok(TransformationPlan {
            requested: requested.to_vec(),
            execution_order,
            layers,
            conflicts,
            impact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ResolutionStrategy;
    use recast_rule::{
        ApplyOutcome, Category, RiskLevel, TransformError, Transformation,
        TransformationContext,
    };
    use std::sync::Arc;

    struct PlannedRule {
        spec: TransformationSpec,
    }

    impl Transformation for PlannedRule {
        fn spec(&self) -> &TransformationSpec {
            &self.spec
        }

        fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
            Ok(ApplyOutcome::unchanged(ctx))
        }
    }

    fn register(registry: &mut TransformationRegistry, spec: TransformationSpec) {
        registry
            .register(Arc::new(PlannedRule { spec }))
            .unwrap();
    }

    fn ids(names: &[&str]) -> Vec<TransformationId> {
        names.iter().map(|n| (*n).into()).collect()
    }

    #[test]
    fn unknown_id_fails_before_anything_else() {
        let registry = TransformationRegistry::new();
        let result = PlanBuilder::new().build(&registry, &ids(&["ghost"]), PlanOptions::default());
        assert!(matches!(result, Err(PlanError::UnknownTransformation(_))));
    }

    #[test]
    fn order_respects_dependencies() {
        let mut registry = TransformationRegistry::new();
        register(
            &mut registry,
            TransformationSpec::new("base", "base", RiskLevel::Low, Category::Cleanup),
        );
        register(
            &mut registry,
            TransformationSpec::new("derived", "derived", RiskLevel::High, Category::Refactor)
                .with_dependencies(vec!["base".into()]),
        );

        let plan = PlanBuilder::new()
            .build(&registry, &ids(&["derived", "base"]), PlanOptions::default())
            .unwrap();

        let base_pos = plan
            .execution_order
            .iter()
            .position(|id| id.as_str() == "base")
            .unwrap();
        let derived_pos = plan
            .execution_order
            .iter()
            .position(|id| id.as_str() == "derived")
            .unwrap();
        assert!(base_pos < derived_pos);
    }

    #[test]
    fn circular_dependency_aborts_plan() {
        let mut registry = TransformationRegistry::new();
        register(
            &mut registry,
            TransformationSpec::new("a", "a", RiskLevel::Low, Category::Cleanup)
                .with_dependencies(vec!["b".into()]),
        );
        register(
            &mut registry,
            TransformationSpec::new("b", "b", RiskLevel::Low, Category::Cleanup)
                .with_dependencies(vec!["a".into()]),
        );

        let result =
            PlanBuilder::new().build(&registry, &ids(&["a", "b"]), PlanOptions::default());
        assert!(matches!(result, Err(PlanError::CircularDependency(_))));
    }

    #[test]
    fn manual_conflict_blocks_auto_execution() {
        let mut registry = TransformationRegistry::new();
        register(
            &mut registry,
            TransformationSpec::new("a", "a", RiskLevel::Medium, Category::Optimize)
                .with_conflicts(vec!["b".into()]),
        );
        register(
            &mut registry,
            TransformationSpec::new("b", "b", RiskLevel::Medium, Category::Modernize),
        );

        let plan = PlanBuilder::new()
            .build(
                &registry,
                &ids(&["a", "b"]),
                PlanOptions {
                    resolve_conflicts: true,
                    optimize_order: false,
                },
            )
            .unwrap();

        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.conflicts[0].resolution, ResolutionStrategy::Manual);
        assert!(plan.requires_manual_approval());
    }

    #[test]
    fn optimized_order_puts_lower_risk_first_among_independents() {
        let mut registry = TransformationRegistry::new();
        register(
            &mut registry,
            TransformationSpec::new("risky", "risky", RiskLevel::High, Category::Cleanup),
        );
        register(
            &mut registry,
            TransformationSpec::new("safe", "safe", RiskLevel::Low, Category::Refactor),
        );

        let plan = PlanBuilder::new()
            .build(
                &registry,
                &ids(&["risky", "safe"]),
                PlanOptions {
                    resolve_conflicts: false,
                    optimize_order: true,
                },
            )
            .unwrap();

        assert_eq!(plan.execution_order[0].as_str(), "safe");
    }

    #[test]
    fn plan_serializes_to_json() {
        let mut registry = TransformationRegistry::new();
        register(
            &mut registry,
            TransformationSpec::new("a", "a", RiskLevel::Low, Category::Cleanup),
        );

        let plan = PlanBuilder::new()
            .build(&registry, &ids(&["a"]), PlanOptions::default())
            .unwrap();

        let json = serde_json::to_string(&plan).unwrap();
        let back: TransformationPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.execution_order, plan.execution_order);
    }
}
