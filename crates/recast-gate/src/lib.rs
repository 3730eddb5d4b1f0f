//! Recast Validation Gate Pipeline
//!
//! Severity-tagged checks ([`SafetyGate`]) executed in registration
//! order or concurrently, aggregated into one pass/fail verdict with
//! quality and safety scores ([`PipelineResult`]). Gates that shell out
//! do so through the timeout-enforcing [`CommandRunner`] contract;
//! prepared workspaces sit behind [`ExecutionEnvironment`].

mod builtin;
mod cancel;
mod environment;
mod error;
mod gate;
mod pipeline;
mod runner;

pub use builtin::{CommandGate, GuardrailGate};
pub use cancel::CancelFlag;
pub use environment::{ExecutionEnvironment, IsolationMode, LocalProcessEnvironment};
pub use error::GateError;
pub use gate::{CheckArtifact, GateResult, SafetyGate, Severity, Violation, ViolationSeverity};
pub use pipeline::{GateExecution, GateOutcome, GatePipeline, PipelineOptions, PipelineResult};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
