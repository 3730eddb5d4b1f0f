//! Aggregate impact estimation for a plan

use recast_rule::TransformationSpec;
use serde::{Deserialize, Serialize};

/// Fixed estimate of how many files one transformation touches
const FILE_FAN_OUT: u32 = 3;

/// Fixed estimate of lines changed per affected file
const LINES_PER_FILE: u32 = 25;

/// Estimated aggregate impact of executing a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    /// Estimated number of files touched
    pub files_affected: u32,
    /// Estimated total lines changed
    pub estimated_lines_changed: u32,
    /// Aggregate risk score, 0–100
    pub risk_score: f64,
}

/// Estimate impact from the requested specs
///
/// Pure function of its inputs: per-transformation risk scores are
/// summed, averaged across the plan, then scaled by transformation count
/// and the fixed file fan-out, clamped to [0, 100].
#[must_use]
pub(crate) fn estimate(specs: &[&TransformationSpec]) -> ImpactEstimate {
    if specs.is_empty() {
        return ImpactEstimate {
            files_affected: 0,
            estimated_lines_changed: 0,
            risk_score: 0.0,
        };
    }

    let count = specs.len() as u32;
    let total: u32 = specs.iter().map(|s| s.risk.score()).sum();
    let average = f64::from(total) / f64::from(count);

    let count_scale = 1.0 + f64::from(count - 1) * 0.15;
    let fan_out_scale = 1.0 + f64::from(FILE_FAN_OUT - 1) * 0.05;
    let risk_score = (average * count_scale * fan_out_scale).clamp(0.0, 100.0);

    ImpactEstimate {
        files_affected: count * FILE_FAN_OUT,
        estimated_lines_changed: count * FILE_FAN_OUT * LINES_PER_FILE,
        risk_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recast_rule::{Category, RiskLevel};

    fn spec(id: &str, risk: RiskLevel) -> TransformationSpec {
        TransformationSpec::new(id, id, risk, Category::Modernize)
    }

    #[test]
    fn empty_plan_has_zero_impact() {
        let estimate = estimate(&[]);
        assert_eq!(estimate.files_affected, 0);
        assert_eq!(estimate.risk_score, 0.0);
    }

    #[test]
    fn single_low_risk_transformation() {
        let a = spec("a", RiskLevel::Low);
        let result = estimate(&[&a]);
        assert_eq!(result.files_affected, FILE_FAN_OUT);
        assert!(result.risk_score > 10.0 && result.risk_score < 12.0);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let specs: Vec<TransformationSpec> = (0..50)
            .map(|i| spec(&format!("t{i}"), RiskLevel::High))
            .collect();
        let refs: Vec<&TransformationSpec> = specs.iter().collect();

        let result = estimate(&refs);
        assert_eq!(result.risk_score, 100.0);
    }

    #[test]
    fn higher_risk_raises_score() {
        let low = spec("low", RiskLevel::Low);
        let high = spec("high", RiskLevel::High);
        assert!(estimate(&[&high]).risk_score > estimate(&[&low]).risk_score);
    }

    #[test]
    fn estimate_is_deterministic() {
        let a = spec("a", RiskLevel::Medium);
        let b = spec("b", RiskLevel::High);
        assert_eq!(estimate(&[&a, &b]), estimate(&[&a, &b]));
    }
}
