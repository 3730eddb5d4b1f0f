//! External command execution
//!
//! Check runners (test runner, linter, type checker, custom validators)
//! all reduce to one contract: run a command, capture stdout/stderr/exit
//! code, enforce a timeout. A timed-out process is killed and reported
//! with exit code -1; spawn failures are reported the same way. The
//! runner never hangs and never propagates an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

/// Captured output of one command invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Process exit code; -1 for timeout, kill, or spawn failure
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl CommandOutput {
    /// True when the command exited zero within its timeout
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    fn failed(stderr: String, duration: Duration, timed_out: bool) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr,
            duration,
            timed_out,
        }
    }
}

/// Runs external commands with a timeout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command args...` in `cwd`, killing the process at `timeout`
    async fn run(
        &self,
        command: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> CommandOutput;
}

/// [`CommandRunner`] backed by local OS processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a runner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        command: &str,
        args: &[String],
        cwd: &Path,
        timeout: Duration,
    ) -> CommandOutput {
        let started = Instant::now();

        let child = tokio::process::Command::new(command)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!(%command, error = %err, "spawn failed");
                return CommandOutput::failed(
                    format!("failed to spawn `{command}`: {err}"),
                    started.elapsed(),
                    false,
                );
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                duration: started.elapsed(),
                timed_out: false,
            },
            Ok(Err(err)) => CommandOutput::failed(
                format!("failed to collect output of `{command}`: {err}"),
                started.elapsed(),
                false,
            ),
            Err(_) => {
                // kill_on_drop reaps the process when the future is dropped.
                tracing::warn!(%command, ?timeout, "command timed out, killed");
                CommandOutput::failed(
                    format!("`{command}` timed out after {timeout:?}"),
                    started.elapsed(),
                    true,
                )
            }
        }
    }
}

/// A fully specified invocation, reusable across runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    /// Invocation with a 60 second timeout and the artifact root as cwd
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            cwd: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the working directory
    #[inline]
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}
