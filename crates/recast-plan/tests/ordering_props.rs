//! Property tests for plan ordering
//!
//! Over randomly generated acyclic dependency sets, the execution order
//! must respect every declared dependency, with and without the
//! risk/category optimize pass.

use proptest::prelude::*;
use recast_plan::{PlanBuilder, PlanOptions};
use recast_rule::{
    ApplyOutcome, Category, RiskLevel, TransformError, Transformation,
    TransformationContext, TransformationId, TransformationRegistry, TransformationSpec,
};
use std::sync::Arc;

struct PropRule {
    spec: TransformationSpec,
}

impl Transformation for PropRule {
    fn spec(&self) -> &TransformationSpec {
        &self.spec
    }

    fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
        Ok(ApplyOutcome::unchanged(ctx))
    }
}

#[derive(Debug, Clone)]
struct DagSpec {
    /// deps[i] ⊆ {0..i}, so the graph is acyclic by construction
    deps: Vec<Vec<usize>>,
    risks: Vec<RiskLevel>,
    categories: Vec<Category>,
}

fn risk_strategy() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Low),
        Just(RiskLevel::Medium),
        Just(RiskLevel::High),
    ]
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Cleanup),
        Just(Category::Optimize),
        Just(Category::Modernize),
        Just(Category::Refactor),
    ]
}

fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = DagSpec> {
    (2..=max_nodes).prop_flat_map(|n| {
        let deps = (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    proptest::collection::vec(0..i, 0..=i.min(3)).boxed()
                }
            })
            .collect::<Vec<_>>();
        (
            deps,
            proptest::collection::vec(risk_strategy(), n),
            proptest::collection::vec(category_strategy(), n),
        )
            .prop_map(|(deps, risks, categories)| DagSpec {
                deps,
                risks,
                categories,
            })
    })
}

fn build_registry(dag: &DagSpec) -> (TransformationRegistry, Vec<TransformationId>) {
    let mut registry = TransformationRegistry::new();
    let ids: Vec<TransformationId> = (0..dag.deps.len())
        .map(|i| TransformationId::new(format!("t{i}")))
        .collect();

    for (i, deps) in dag.deps.iter().enumerate() {
        let mut unique: Vec<usize> = deps.clone();
        unique.sort_unstable();
        unique.dedup();

        let spec = TransformationSpec::new(
            ids[i].as_str(),
            ids[i].as_str(),
            dag.risks[i],
            dag.categories[i],
        )
        .with_dependencies(unique.iter().map(|&d| ids[d].clone()).collect());
        registry.register(Arc::new(PropRule { spec })).unwrap();
    }

    (registry, ids)
}

fn assert_order_respects_deps(order: &[TransformationId], dag: &DagSpec, ids: &[TransformationId]) {
    let position = |id: &TransformationId| order.iter().position(|x| x == id).unwrap();
    for (i, deps) in dag.deps.iter().enumerate() {
        for &dep in deps {
            assert!(
                position(&ids[dep]) < position(&ids[i]),
                "{} scheduled after its dependent {}",
                ids[dep],
                ids[i]
            );
        }
    }
}

proptest! {
    #[test]
    fn execution_order_never_precedes_dependencies(dag in dag_strategy(12)) {
        let (registry, ids) = build_registry(&dag);
        let plan = PlanBuilder::new()
            .build(&registry, &ids, PlanOptions::default())
            .unwrap();
        assert_order_respects_deps(&plan.execution_order, &dag, &ids);
    }

    #[test]
    fn optimized_order_preserves_dependency_partial_order(dag in dag_strategy(12)) {
        let (registry, ids) = build_registry(&dag);
        let plan = PlanBuilder::new()
            .build(
                &registry,
                &ids,
                PlanOptions { resolve_conflicts: false, optimize_order: true },
            )
            .unwrap();
        assert_order_respects_deps(&plan.execution_order, &dag, &ids);
    }

    #[test]
    fn layers_are_mutually_independent(dag in dag_strategy(12)) {
        let (registry, ids) = build_registry(&dag);
        let plan = PlanBuilder::new()
            .build(&registry, &ids, PlanOptions::default())
            .unwrap();

        for layer in &plan.layers {
            for id in layer {
                let idx: usize = id.as_str()[1..].parse().unwrap();
                for &dep in &dag.deps[idx] {
                    assert!(
                        !layer.contains(&ids[dep]),
                        "dependency {} shares a layer with {}",
                        ids[dep],
                        id
                    );
                }
            }
        }
    }
}
