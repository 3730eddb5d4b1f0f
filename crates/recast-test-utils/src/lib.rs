//! Testing utilities for the Recast workspace
//!
//! Shared fixture transformations, gates, and temp-tree builders.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use recast_gate::{CheckArtifact, GateError, GateResult, SafetyGate, Severity};
use recast_rule::{
    ApplyOutcome, Category, ChangeKind, CodeChange, RiskLevel, RollbackHook, RuleValidation, Span,
    TransformError, Transformation, TransformationContext, TransformationId, TransformationSpec,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Transformation that appends a suffix and can undo itself
pub struct AppendTransformation {
    spec: TransformationSpec,
    pub suffix: String,
}

impl AppendTransformation {
    pub fn new(id: &str, suffix: &str) -> Self {
        Self {
            spec: TransformationSpec::new(id, id, RiskLevel::Low, Category::Cleanup),
            suffix: suffix.to_string(),
        }
    }

    pub fn with_spec(spec: TransformationSpec, suffix: &str) -> Self {
        Self {
            spec,
            suffix: suffix.to_string(),
        }
    }

    pub fn arc(id: &str, suffix: &str) -> Arc<dyn Transformation> {
        Arc::new(Self::new(id, suffix))
    }
}

impl Transformation for AppendTransformation {
    fn spec(&self) -> &TransformationSpec {
        &self.spec
    }

    fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
        let last_line = ctx.original_content.lines().count().max(1) as u32;
        Ok(ApplyOutcome {
            changes: vec![CodeChange::new(
                ChangeKind::Insert,
                Span::line(last_line),
                String::new(),
                self.suffix.clone(),
                95,
                RiskLevel::Low,
            )],
            content: format!("{}{}", ctx.original_content, self.suffix),
            rollback_payload: Some(serde_json::json!({ "suffix": self.suffix })),
        })
    }

    fn validate(&self, ctx: &TransformationContext) -> Option<RuleValidation> {
        if ctx.original_content.ends_with(&self.suffix) {
            Some(RuleValidation::AlreadySatisfied)
        } else {
            Some(RuleValidation::Applicable)
        }
    }

    fn rollback(&self) -> Option<&dyn RollbackHook> {
        Some(self)
    }
}

impl RollbackHook for AppendTransformation {
    fn undo(
        &self,
        ctx: &TransformationContext,
        payload: &serde_json::Value,
    ) -> Result<String, TransformError> {
        let suffix = payload["suffix"]
            .as_str()
            .ok_or_else(|| TransformError::InvalidPayload("missing suffix".to_string()))?;
        ctx.original_content
            .strip_suffix(suffix)
            .map(str::to_string)
            .ok_or_else(|| TransformError::RollbackFailed("suffix not present".to_string()))
    }
}

/// Transformation whose apply always fails
pub struct FailingTransformation {
    spec: TransformationSpec,
}

impl FailingTransformation {
    pub fn arc(id: &str) -> Arc<dyn Transformation> {
        Arc::new(Self {
            spec: TransformationSpec::new(id, id, RiskLevel::Medium, Category::Optimize),
        })
    }
}

impl Transformation for FailingTransformation {
    fn spec(&self) -> &TransformationSpec {
        &self.spec
    }

    fn apply(&self, _ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
        Err(TransformError::ApplyFailed("fixture failure".to_string()))
    }
}

/// Transformation that replaces the file with unparseable Rust
pub struct SyntaxBreakingTransformation {
    spec: TransformationSpec,
}

impl SyntaxBreakingTransformation {
    pub fn arc(id: &str) -> Arc<dyn Transformation> {
        Arc::new(Self {
            spec: TransformationSpec::new(id, id, RiskLevel::High, Category::Refactor),
        })
    }
}

impl Transformation for SyntaxBreakingTransformation {
    fn spec(&self) -> &TransformationSpec {
        &self.spec
    }

    fn apply(&self, ctx: &TransformationContext) -> Result<ApplyOutcome, TransformError> {
        let broken = "fn broken( {".to_string();
        Ok(ApplyOutcome {
            changes: vec![CodeChange::new(
                ChangeKind::Replace,
                Span::line(1),
                ctx.original_content.clone(),
                broken.clone(),
                40,
                RiskLevel::High,
            )],
            content: broken,
            rollback_payload: None,
        })
    }
}

/// Gate returning a fixed result and counting invocations
pub struct StaticGate {
    name: String,
    severity: Severity,
    result: GateResult,
    invocations: AtomicUsize,
}

impl StaticGate {
    pub fn new(name: &str, severity: Severity, result: GateResult) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            severity,
            result,
            invocations: AtomicUsize::new(0),
        })
    }

    pub fn passing(name: &str, severity: Severity) -> Arc<Self> {
        Self::new(name, severity, GateResult::passing())
    }

    pub fn failing(name: &str, severity: Severity, violations: Vec<recast_gate::Violation>) -> Arc<Self> {
        Self::new(name, severity, GateResult::failing(violations))
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SafetyGate for StaticGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn check(&self, _artifact: &CheckArtifact) -> Result<GateResult, GateError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Temporary project tree populated with the given (path, content) pairs
pub struct TempTree {
    dir: tempfile::TempDir,
}

impl TempTree {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }
        Self { dir }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, content: &str) {
        std::fs::write(self.path(relative), content).unwrap();
    }
}

/// Convenience: id list from string slices
pub fn ids(names: &[&str]) -> Vec<TransformationId> {
    names.iter().map(|n| TransformationId::new(*n)).collect()
}
