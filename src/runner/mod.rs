//! The transformation runner: coercion, compiled pipelines, row evaluation,
//! and the job controller.

pub mod coerce;
pub mod job;
pub mod pipeline;
#[allow(clippy::module_inception)]
pub mod runner;

pub use coerce::{coerce_row, ConversionFailure};
pub use job::{run_jobs, RunSummary, TransformationJob};
pub use pipeline::{CompiledEntry, CompiledStep, TransformationPipeline};
pub use runner::TransformationRunner;
