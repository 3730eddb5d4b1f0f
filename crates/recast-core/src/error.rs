//! Pipeline-level errors
//!
//! Only configuration-level problems abort a run before any file is
//! touched; everything downstream of execution is reported in the
//! [`RunReport`](crate::RunReport) instead of raised.

use recast_checkpoint::CheckpointError;
use recast_env::EnvError;
use recast_plan::PlanError;

/// Errors that abort a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Plan construction failed (unknown id, circular dependency);
    /// raised before any file is touched
    #[error("plan failed: {0}")]
    Plan(#[from] PlanError),

    /// The plan contains an unresolved conflict and the run was not
    /// authorized to proceed past manual approval
    #[error("plan requires manual approval: {0} unresolved conflict(s)")]
    ManualApprovalRequired(usize),

    /// Environment snapshot capture failed
    #[error("environment snapshot failed: {0}")]
    Env(#[from] EnvError),

    /// Checkpoint creation or restore failed
    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// A requested id disappeared from the registry between planning and
    /// execution
    #[error("transformation vanished from registry: {0}")]
    MissingTransformation(recast_rule::TransformationId),

    /// A worker task was cancelled or panicked
    #[error("execution task failed: {0}")]
    TaskJoin(String),
}
