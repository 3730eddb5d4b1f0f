//! Gate and runner errors

/// Errors raised by gates and execution environments
///
/// Command timeouts and spawn failures are not errors at this level: the
/// runner folds them into a [`crate::CommandOutput`] with exit code `-1`.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A gate's check could not run to completion
    #[error("gate execution failed: {0}")]
    ExecutionError(String),

    /// The execution environment could not be prepared
    #[error("environment setup failed: {0}")]
    EnvironmentSetup(String),
}
