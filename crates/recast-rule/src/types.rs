//! Core identifier and classification types

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identifier of a registered transformation
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransformationId(String);

impl TransformationId {
    /// Create an id from any string-like value
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransformationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransformationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Risk classification of a transformation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Risk score used in plan impact estimation
    #[inline]
    #[must_use]
    pub const fn score(self) -> u32 {
        match self {
            Self::Low => 10,
            Self::Medium => 30,
            Self::High => 60,
        }
    }
}

/// Category of a transformation
///
/// Ordering doubles as scheduling priority: cleanup changes run before
/// optimizations, which run before modernizations, which run before
/// structural refactors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cleanup,
    Optimize,
    Modernize,
    Refactor,
}

impl Category {
    /// Scheduling priority (lower runs first)
    #[inline]
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Cleanup => 0,
            Self::Optimize => 1,
            Self::Modernize => 2,
            Self::Refactor => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_scores() {
        assert_eq!(RiskLevel::Low.score(), 10);
        assert_eq!(RiskLevel::Medium.score(), 30);
        assert_eq!(RiskLevel::High.score(), 60);
    }

    #[test]
    fn category_priority_order() {
        assert!(Category::Cleanup.priority() < Category::Optimize.priority());
        assert!(Category::Optimize.priority() < Category::Modernize.priority());
        assert!(Category::Modernize.priority() < Category::Refactor.priority());
    }

    #[test]
    fn id_round_trips_through_serde() {
        let id = TransformationId::new("remove-dead-code");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"remove-dead-code\"");
        let back: TransformationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
