//! Isolated execution environments
//!
//! Gates and check runners that need a prepared workspace go through the
//! [`ExecutionEnvironment`] contract: initialize, execute commands,
//! clean up. Consumers depend only on this contract, never on the
//! isolation mechanism behind it.

use crate::error::GateError;
use crate::runner::{CommandOutput, CommandRunner, ProcessRunner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How strongly an environment is isolated from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Full container boundary
    Containerized,
    /// OS-level sandbox (restricted filesystem/network)
    Sandboxed,
    /// Plain local process, no isolation
    LocalProcess,
}

/// A prepared place to run validation commands
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    /// The isolation this environment provides
    fn mode(&self) -> IsolationMode;

    /// Prepare the environment for command execution
    ///
    /// # Errors
    /// `GateError::EnvironmentSetup` if preparation fails.
    async fn initialize(&self) -> Result<(), GateError>;

    /// Run one command inside the environment
    ///
    /// # Errors
    /// `GateError::EnvironmentSetup` if the environment is unusable;
    /// command-level failures (nonzero exit, timeout) are reported in
    /// the returned [`CommandOutput`], not as errors.
    async fn execute_command(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, GateError>;

    /// Release any resources the environment holds
    ///
    /// # Errors
    /// `GateError::EnvironmentSetup` if teardown fails.
    async fn cleanup(&self) -> Result<(), GateError>;
}

/// [`ExecutionEnvironment`] running commands directly on the host
///
/// No isolation; suitable for trusted local runs and tests.
pub struct LocalProcessEnvironment {
    root: PathBuf,
    timeout: Duration,
    runner: ProcessRunner,
}

impl LocalProcessEnvironment {
    /// Environment rooted at `root` with a 60 second command timeout
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: Duration::from_secs(60),
            runner: ProcessRunner::new(),
        }
    }

    /// Override the per-command timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ExecutionEnvironment for LocalProcessEnvironment {
    fn mode(&self) -> IsolationMode {
        IsolationMode::LocalProcess
    }

    async fn initialize(&self) -> Result<(), GateError> {
        if !self.root.is_dir() {
            return Err(GateError::EnvironmentSetup(format!(
                "root {} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn execute_command(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, GateError> {
        Ok(self.runner.run(command, args, &self.root, self.timeout).await)
    }

    async fn cleanup(&self) -> Result<(), GateError> {
        Ok(())
    }
}

impl std::fmt::Debug for LocalProcessEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProcessEnvironment")
            .field("root", &self.root)
            .field("timeout", &self.timeout)
            .finish()
    }
}
