//! Built-in gates
//!
//! The stock checks every run can register: command-backed gates (test
//! runner, linter, type checker, arbitrary shell validators) and a
//! guardrail gate scanning changed content for forbidden patterns.

use crate::error::GateError;
use crate::gate::{CheckArtifact, GateResult, SafetyGate, Severity, Violation, ViolationSeverity};
use crate::runner::{CommandRunner, CommandSpec, ProcessRunner};
use async_trait::async_trait;
use std::sync::Arc;

/// A gate that passes iff an external command exits zero
pub struct CommandGate {
    name: String,
    severity: Severity,
    spec: CommandSpec,
    /// Severity assigned to the violation emitted on command failure
    violation_severity: ViolationSeverity,
    runner: Arc<dyn CommandRunner>,
    enabled: bool,
}

impl CommandGate {
    /// Command-backed gate with an explicit runner
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        spec: CommandSpec,
        violation_severity: ViolationSeverity,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            spec,
            violation_severity,
            runner,
            enabled: true,
        }
    }

    /// Critical test-runner gate; failures are error violations
    #[must_use]
    pub fn test_runner(spec: CommandSpec) -> Self {
        Self::new(
            "test-runner",
            Severity::Critical,
            spec,
            ViolationSeverity::Error,
            Arc::new(ProcessRunner::new()),
        )
    }

    /// Medium-severity lint gate; failures are warnings
    #[must_use]
    pub fn lint(spec: CommandSpec) -> Self {
        Self::new(
            "lint",
            Severity::Medium,
            spec,
            ViolationSeverity::Warning,
            Arc::new(ProcessRunner::new()),
        )
    }

    /// High-severity type-check gate; failures are error violations
    #[must_use]
    pub fn type_check(spec: CommandSpec) -> Self {
        Self::new(
            "type-check",
            Severity::High,
            spec,
            ViolationSeverity::Error,
            Arc::new(ProcessRunner::new()),
        )
    }

    /// Custom shell-invoked validator at the given severity
    #[must_use]
    pub fn custom(name: impl Into<String>, severity: Severity, spec: CommandSpec) -> Self {
        Self::new(
            name,
            severity,
            spec,
            ViolationSeverity::Warning,
            Arc::new(ProcessRunner::new()),
        )
    }

    /// Enable or disable the gate
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[async_trait]
impl SafetyGate for CommandGate {
    fn name(&self) -> &str {
        &self.name
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn check(&self, artifact: &CheckArtifact) -> Result<GateResult, GateError> {
        let cwd = self.spec.cwd.clone().unwrap_or_else(|| artifact.root.clone());
        let output = self
            .runner
            .run(&self.spec.command, &self.spec.args, &cwd, self.spec.timeout)
            .await;

        if output.succeeded() {
            return Ok(GateResult::passing()
                .with_metadata("exit_code", output.exit_code.to_string())
                .with_metadata("duration_ms", output.duration.as_millis().to_string()));
        }

        let message = if output.timed_out {
            format!("`{}` timed out after {:?}", self.spec.command, self.spec.timeout)
        } else {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            format!(
                "`{}` exited with code {}: {}",
                self.spec.command, output.exit_code, detail
            )
        };

        Ok(
            GateResult::failing(vec![Violation::new(self.violation_severity, message)])
                .with_suggestion(format!("run `{}` locally to reproduce", self.spec.command))
                .with_metadata("exit_code", output.exit_code.to_string())
                .with_metadata("timed_out", output.timed_out.to_string()),
        )
    }
}

impl std::fmt::Debug for CommandGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGate")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("command", &self.spec.command)
            .finish()
    }
}

/// Scans changed content for forbidden patterns
///
/// A hit means the transformation introduced something the project bans
/// outright (left-over debug output, known-dangerous calls).
#[derive(Debug)]
pub struct GuardrailGate {
    patterns: Vec<String>,
    severity: Severity,
}

impl GuardrailGate {
    /// Critical guardrail over the given forbidden substrings
    #[must_use]
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns,
            severity: Severity::Critical,
        }
    }

    /// Override the gate severity
    #[inline]
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[async_trait]
impl SafetyGate for GuardrailGate {
    fn name(&self) -> &str {
        "guardrail"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn check(&self, artifact: &CheckArtifact) -> Result<GateResult, GateError> {
        let mut violations = Vec::new();
        for (path, content) in &artifact.changed_files {
            for pattern in &self.patterns {
                if content.contains(pattern.as_str()) {
                    violations.push(
                        Violation::new(
                            ViolationSeverity::Error,
                            format!("forbidden pattern `{pattern}` in changed content"),
                        )
                        .at(path),
                    );
                }
            }
        }

        if violations.is_empty() {
            Ok(GateResult::passing())
        } else {
            Ok(GateResult::failing(violations)
                .with_suggestion("remove the flagged patterns before re-running".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn command_gate_passes_on_exit_zero() {
        let gate = CommandGate::custom(
            "true-check",
            Severity::Medium,
            CommandSpec::new("true", Vec::new()),
        );
        let result = gate.check(&CheckArtifact::new(".")).await.unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn command_gate_fails_on_nonzero_exit() {
        let gate = CommandGate::test_runner(CommandSpec::new("false", Vec::new()));
        let result = gate.check(&CheckArtifact::new(".")).await.unwrap();

        assert!(!result.passed);
        assert_eq!(result.error_violations(), 1);
        assert!(!result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn command_gate_reports_timeout() {
        let gate = CommandGate::lint(
            CommandSpec::new("sleep", vec!["30".to_string()])
                .with_timeout(Duration::from_millis(100)),
        );
        let result = gate.check(&CheckArtifact::new(".")).await.unwrap();

        assert!(!result.passed);
        assert_eq!(result.metadata.get("timed_out").map(String::as_str), Some("true"));
        assert_eq!(result.metadata.get("exit_code").map(String::as_str), Some("-1"));
    }

    #[tokio::test]
    async fn guardrail_flags_forbidden_patterns_per_file() {
        let gate = GuardrailGate::new(vec!["dbg!".to_string(), "todo!".to_string()]);
        let artifact = CheckArtifact::new(".")
            .with_file("src/a.rs", "fn f() { dbg!(1); }")
            .with_file("src/b.rs", "fn g() {}");

        let result = gate.check(&artifact).await.unwrap();

        assert!(!result.passed);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].path.as_deref(),
            Some(std::path::Path::new("src/a.rs"))
        );
    }

    #[tokio::test]
    async fn guardrail_passes_clean_content() {
        let gate = GuardrailGate::new(vec!["dbg!".to_string()]);
        let artifact = CheckArtifact::new(".").with_file("src/a.rs", "fn f() {}");
        let result = gate.check(&artifact).await.unwrap();
        assert!(result.passed);
    }
}
