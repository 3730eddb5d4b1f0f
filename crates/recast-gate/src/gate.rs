//! Gate interface and result types

use crate::error::GateError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity of a gate, fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// Severity of a single violation inside a gate result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

/// One finding reported by a gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: ViolationSeverity,
    pub message: String,
    /// File the finding refers to, when it is file-scoped
    pub path: Option<PathBuf>,
}

impl Violation {
    /// Create a violation without a file location
    #[must_use]
    pub fn new(severity: ViolationSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the file the finding refers to
    #[inline]
    #[must_use]
    pub fn at(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Outcome of one gate's check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub passed: bool,
    /// Gate-local score in [0, 100]
    pub score: f64,
    pub violations: Vec<Violation>,
    pub suggestions: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl GateResult {
    /// A clean pass with full score
    #[must_use]
    pub fn passing() -> Self {
        Self {
            passed: true,
            score: 100.0,
            violations: Vec::new(),
            suggestions: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// A failure carrying the given violations
    #[must_use]
    pub fn failing(violations: Vec<Violation>) -> Self {
        Self {
            passed: false,
            score: 0.0,
            violations,
            suggestions: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a suggestion
    #[inline]
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Attach a metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Count of error-severity violations in this result
    #[must_use]
    pub fn error_violations(&self) -> u32 {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
            .count() as u32
    }
}

/// The artifact a pipeline run checks: the working tree root plus the
/// content of every file the run changed
#[derive(Debug, Clone, Default)]
pub struct CheckArtifact {
    pub root: PathBuf,
    /// Relative path → post-transformation content
    pub changed_files: BTreeMap<String, String>,
    /// Free-form context (plan id, transformation ids, ...)
    pub metadata: BTreeMap<String, String>,
}

impl CheckArtifact {
    /// Artifact rooted at `root` with no changed files
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Record a changed file
    #[inline]
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.changed_files.insert(path.into(), content.into());
        self
    }
}

/// A named, severity-tagged validation check
///
/// Registered once at pipeline construction; invoked per run. A gate
/// returning `Err` is converted by the pipeline into a failed
/// [`GateResult`], never a pipeline abort.
#[async_trait]
pub trait SafetyGate: Send + Sync {
    /// Unique display name
    fn name(&self) -> &str;

    /// Severity class, fixed at registration
    fn severity(&self) -> Severity;

    /// Disabled gates are never invoked
    fn enabled(&self) -> bool {
        true
    }

    /// Run the check against the artifact
    ///
    /// # Errors
    /// Any error here is folded into a failed result by the pipeline.
    async fn check(&self, artifact: &CheckArtifact) -> Result<GateResult, GateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_violations_counts_only_errors() {
        let result = GateResult::failing(vec![
            Violation::new(ViolationSeverity::Error, "a"),
            Violation::new(ViolationSeverity::Warning, "b"),
            Violation::new(ViolationSeverity::Error, "c"),
            Violation::new(ViolationSeverity::Info, "d"),
        ]);
        assert_eq!(result.error_violations(), 2);
    }

    #[test]
    fn passing_result_is_clean() {
        let result = GateResult::passing();
        assert!(result.passed);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.error_violations(), 0);
    }

    #[test]
    fn violation_location_is_optional() {
        let v = Violation::new(ViolationSeverity::Warning, "style").at("src/lib.rs");
        assert_eq!(v.path.as_deref(), Some(std::path::Path::new("src/lib.rs")));
    }
}
