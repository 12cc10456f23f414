//! # Recast
//!
//! Rule-driven conversion of tabular records between named data formats.
//!
//! ## Core Components
//!
//! * `expression` - the transformation expression language: grammar, AST,
//!   and an operator-table evaluator
//! * `mapping` - mapping declarations, YAML loading with inheritance, and
//!   the format conversion graph
//! * `runner` - type coercion, compiled pipelines, first-match-wins column
//!   evaluation, and the job controller
//! * `connector` - extract/load traits with CSV, JSON-lines and in-memory
//!   implementations
//! * `config` - layered, dotted-path configuration
//! * `error` - crate error taxonomy
//!
//! ## Architecture
//!
//! Mapping files declare how the columns of one format derive from the
//! columns of another, guarded by expressions in a small declarative
//! language. Declarations form a directed graph over formats; a conversion
//! request resolves the shortest path through that graph, compiles every
//! guard and value expression once, and then streams rows from an extractor
//! through the compiled steps into a loader. Rows recover from bad cells at
//! coercion granularity, jobs recover from each other at the controller.

pub mod config;
pub mod connector;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod row;
pub mod runner;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigValue, Configuration};
pub use connector::{ConnectorRegistry, Extract, Load};
pub use error::{EvaluationError, ParserError, RecastError, RecastResult};
pub use expression::{Evaluator, Expression, ExpressionParser, OperatorTable, Value};
pub use mapping::format::Format;
pub use mapping::types::{
    ColumnConversion, ColumnType, DirectionalMapping, MappingSpec, TransformationEntry,
    TransformationSet,
};
pub use mapping::{Mapping, MappingLoader};
pub use row::Row;
pub use runner::{run_jobs, RunSummary, TransformationJob, TransformationPipeline, TransformationRunner};
