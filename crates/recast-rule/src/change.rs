//! Located edit records produced by applying a transformation

use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};

/// Kind of a single located edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Delete,
    Replace,
    Move,
}

/// Line span of an edit (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    /// Span covering a single line
    #[inline]
    #[must_use]
    pub const fn line(line: u32) -> Self {
        Self {
            start_line: line,
            end_line: line,
        }
    }

    /// Number of lines covered
    #[inline]
    #[must_use]
    pub const fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// One located edit
///
/// Always produced by applying a [`Transformation`](crate::Transformation);
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    pub kind: ChangeKind,
    pub span: Span,
    pub before: String,
    pub after: String,
    /// Confidence in the edit, 0–100
    pub confidence: u8,
    pub risk: RiskLevel,
}

impl CodeChange {
    /// Create a change record; confidence is clamped to 100
    #[must_use]
    pub fn new(
        kind: ChangeKind,
        span: Span,
        before: impl Into<String>,
        after: impl Into<String>,
        confidence: u8,
        risk: RiskLevel,
    ) -> Self {
        Self {
            kind,
            span,
            before: before.into(),
            after: after.into(),
            confidence: confidence.min(100),
            risk,
        }
    }
}
