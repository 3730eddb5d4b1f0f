//! Pairwise conflict detection and resolution
//!
//! A conflict exists between two requested transformations when either
//! declares the other in its conflict list. Auto-resolution handles two
//! safe patterns; everything else stays `Manual` and blocks automatic
//! execution of the plan.

use recast_rule::{Category, RiskLevel, TransformationId, TransformationSpec};
use serde::{Deserialize, Serialize};

/// How a detected conflict was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// One side is dropped from execution
    Skip,
    /// The two changes are combined
    Merge,
    /// Both run, one explicitly before the other
    Prioritize,
    /// No automatic resolution; a human must approve the plan
    Manual,
}

/// Record of one resolved (or unresolved) conflict pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub first: TransformationId,
    pub second: TransformationId,
    pub resolution: ResolutionStrategy,
    pub reason: String,
}

impl ConflictResolution {
    /// True when this pair still needs human approval
    #[inline]
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.resolution == ResolutionStrategy::Manual
    }
}

/// Detect conflicts between every unordered pair of requested specs and
/// resolve what can be resolved automatically
///
/// With `resolve` false, every detected conflict is recorded as `Manual`.
pub(crate) fn detect_and_resolve(
    specs: &[&TransformationSpec],
    resolve: bool,
) -> Vec<ConflictResolution> {
    let mut resolutions = Vec::new();

    for (i, a) in specs.iter().enumerate() {
        for b in specs.iter().skip(i + 1) {
            if !declares_conflict(a, b) {
                continue;
            }
            let resolution = if resolve {
                resolve_pair(a, b)
            } else {
                manual(a, b)
            };
            tracing::debug!(
                first = %resolution.first,
                second = %resolution.second,
                strategy = ?resolution.resolution,
                "conflict detected"
            );
            resolutions.push(resolution);
        }
    }

    resolutions
}

fn declares_conflict(a: &TransformationSpec, b: &TransformationSpec) -> bool {
    a.conflicts.contains(&b.id) || b.conflicts.contains(&a.id)
}

fn resolve_pair(a: &TransformationSpec, b: &TransformationSpec) -> ConflictResolution {
    // Low-risk vs high-risk: keep the low-risk side first.
    if let Some((low, high)) = risk_split(a, b) {
        return ConflictResolution {
            first: a.id.clone(),
            second: b.id.clone(),
            resolution: ResolutionStrategy::Prioritize,
            reason: format!(
                "low-risk '{}' prioritized ahead of high-risk '{}'",
                low.id, high.id
            ),
        };
    }

    // Cleanup vs structural refactor: the structural change wins.
    if let Some((cleanup, refactor)) = category_split(a, b) {
        return ConflictResolution {
            first: a.id.clone(),
            second: b.id.clone(),
            resolution: ResolutionStrategy::Prioritize,
            reason: format!(
                "structural refactor '{}' takes precedence over cleanup '{}'",
                refactor.id, cleanup.id
            ),
        };
    }

    manual(a, b)
}

fn manual(a: &TransformationSpec, b: &TransformationSpec) -> ConflictResolution {
    ConflictResolution {
        first: a.id.clone(),
        second: b.id.clone(),
        resolution: ResolutionStrategy::Manual,
        reason: format!(
            "'{}' and '{}' declare a conflict with no automatic resolution; human approval required",
            a.id, b.id
        ),
    }
}

fn risk_split<'a>(
    a: &'a TransformationSpec,
    b: &'a TransformationSpec,
) -> Option<(&'a TransformationSpec, &'a TransformationSpec)> {
    match (a.risk, b.risk) {
        (RiskLevel::Low, RiskLevel::High) => Some((a, b)),
        (RiskLevel::High, RiskLevel::Low) => Some((b, a)),
        _ => None,
    }
}

fn category_split<'a>(
    a: &'a TransformationSpec,
    b: &'a TransformationSpec,
) -> Option<(&'a TransformationSpec, &'a TransformationSpec)> {
    match (a.category, b.category) {
        (Category::Cleanup, Category::Refactor) => Some((a, b)),
        (Category::Refactor, Category::Cleanup) => Some((b, a)),
        _ => None,
    }
}
