//! Data connectors: where rows come from and where they go.
//!
//! Connectors are intentionally thin. An extractor produces one finite batch
//! of rows; a loader persists one. Neither raises for an empty batch, and
//! file-based loaders must not create or truncate their destination when
//! given zero rows.

pub mod csv;
pub mod jsonl;
pub mod memory;
pub mod registry;

use crate::error::RecastResult;
use crate::row::Row;

pub use self::csv::{CsvExtractor, CsvLoader};
pub use jsonl::{JsonlExtractor, JsonlLoader};
pub use memory::{MemoryExtractor, MemoryLoader};
pub use registry::ConnectorRegistry;

/// Produces the input rows for one transformation job.
pub trait Extract {
    fn extract(&mut self) -> RecastResult<Vec<Row>>;
}

/// Persists the output rows of one transformation job.
pub trait Load {
    fn load(&mut self, rows: Vec<Row>) -> RecastResult<()>;
}
