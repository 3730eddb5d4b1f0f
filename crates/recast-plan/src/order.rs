//! Dependency ordering and layering
//!
//! A depth-first topological sort over declared dependency edges,
//! restricted to the requested set, plus a layering pass that groups
//! mutually independent transformations for concurrent execution.
//!
//! The optimize pass sorts *within* each layer only. Edges always point
//! from an earlier layer to a later one, so reordering inside a layer can
//! never violate the dependency partial order; the property tests in this
//! crate exercise that claim over random DAGs.

use crate::error::PlanError;
use recast_rule::{TransformationId, TransformationSpec};
use std::collections::{HashMap, HashSet};

/// Depth-first topological order of the requested specs
///
/// Dependencies outside the requested set are ignored (they are assumed
/// already satisfied). A dependency cycle within the set raises
/// [`PlanError::CircularDependency`] naming the transformation at which
/// the cycle was entered.
pub(crate) fn topological_order(
    specs: &[&TransformationSpec],
) -> Result<Vec<TransformationId>, PlanError> {
    let by_id: HashMap<&TransformationId, &TransformationSpec> =
        specs.iter().map(|s| (&s.id, *s)).collect();

    let mut order = Vec::with_capacity(specs.len());
    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();

    fn visit(
        id: &TransformationId,
        by_id: &HashMap<&TransformationId, &TransformationSpec>,
        visiting: &mut HashSet<TransformationId>,
        visited: &mut HashSet<TransformationId>,
        order: &mut Vec<TransformationId>,
    ) -> Result<(), PlanError> {
        if visited.contains(id) {
            return Ok(());
        }
        if !visiting.insert(id.clone()) {
            return Err(PlanError::CircularDependency(id.clone()));
        }

        let spec = by_id[id];
        for dep in &spec.dependencies {
            if by_id.contains_key(dep) {
                visit(dep, by_id, visiting, visited, order)?;
            }
        }

        visiting.remove(id);
        visited.insert(id.clone());
        order.push(id.clone());
        Ok(())
    }

    for spec in specs {
        visit(&spec.id, &by_id, &mut visiting, &mut visited, &mut order)?;
    }

    Ok(order)
}

/// Group a topologically ordered set into dependency layers
///
/// A transformation's layer is one past the deepest layer of any of its
/// in-set dependencies; transformations in the same layer are mutually
/// independent and may execute concurrently.
pub(crate) fn dependency_layers(
    order: &[TransformationId],
    specs: &[&TransformationSpec],
) -> Vec<Vec<TransformationId>> {
    let by_id: HashMap<&TransformationId, &TransformationSpec> =
        specs.iter().map(|s| (&s.id, *s)).collect();

    let mut depth: HashMap<&TransformationId, usize> = HashMap::new();
    let mut layers: Vec<Vec<TransformationId>> = Vec::new();

    // `order` is topological, so every in-set dependency already has a depth.
    for id in order {
        let spec = by_id[id];
        let layer = spec
            .dependencies
            .iter()
            .filter_map(|dep| depth.get(dep))
            .max()
            .map_or(0, |d| d + 1);

        if layers.len() <= layer {
            layers.resize_with(layer + 1, Vec::new);
        }
        layers[layer].push(id.clone());
        depth.insert(&spec.id, layer);
    }

    layers
}

/// Stable risk/category sort within each layer
///
/// Ties within a layer are broken by ascending risk, then category
/// priority (cleanup → optimize → modernize → refactor); the original
/// order is preserved among equal keys.
pub(crate) fn optimize_layers(
    layers: &mut [Vec<TransformationId>],
    specs: &[&TransformationSpec],
) {
    let by_id: HashMap<&TransformationId, &TransformationSpec> =
        specs.iter().map(|s| (&s.id, *s)).collect();

    for layer in layers {
        layer.sort_by_key(|id| {
            let spec = by_id[id];
            (spec.risk.score(), spec.category.priority())
        });
    }
}
