//! Recast Core - Transformation Pipeline Orchestration
//!
//! The end-to-end run: capture an environment snapshot, checkpoint the
//! tree, build a dependency- and conflict-aware plan, execute it with
//! syntax gating and per-file fan-out, run the validation gate
//! pipeline, and keep, roll back, or checkpoint-restore the tree based
//! on the verdict. Every run produces a [`RunReport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use recast_core::{PipelineConfig, RunRequest, TransformationPipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = TransformationPipeline::new(root, registry, store, gates, PipelineConfig::default());
//! let report = pipeline
//!     .run(&RunRequest {
//!         transformations: vec!["remove-dead-code".into()],
//!         targets: vec!["src/lib.rs".to_string()],
//!     })
//!     .await?;
//!
//! println!("{}", report.render());
//! # Ok(())
//! # }
//! ```

mod error;
mod pipeline;
mod report;

pub use error::PipelineError;
pub use pipeline::{PipelineConfig, RunRequest, TransformationPipeline};
pub use report::{RollbackDecision, RunReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
