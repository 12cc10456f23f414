//! Unified error handling for the conversion engine.
//!
//! This module consolidates the crate-wide error taxonomy: expression parser
//! and evaluation errors, mapping resolution errors, and the top-level
//! [`RecastError`] umbrella that the CLI and the job controller report on.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::mapping::format::Format;

/// Result type for crate-level operations.
pub type RecastResult<T> = Result<T, RecastError>;

/// Errors raised while parsing a transformation expression.
///
/// Parser errors are not recoverable at this layer; they abort the mapping
/// entry (and therefore the job) that referenced the malformed expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The expression text could not be parsed.
    #[error("unexpected characters at position {position} in {expression:?}: found {found}")]
    UnexpectedCharacters {
        /// The full source expression being parsed.
        expression: String,
        /// Byte offset of the first offending character.
        position: usize,
        /// The offending character, or an end-of-input marker.
        found: String,
    },
}

impl ParserError {
    /// Builds an `UnexpectedCharacters` error from a pest parse failure.
    pub(crate) fn from_pest(expression: &str, err: pest::error::Error<crate::expression::parser::Rule>) -> Self {
        let position = match err.location {
            pest::error::InputLocation::Pos(p) => p,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        let found = expression[position.min(expression.len())..]
            .chars()
            .next()
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "end of input".to_string());
        ParserError::UnexpectedCharacters {
            expression: expression.to_string(),
            position,
            found,
        }
    }
}

/// Errors raised while evaluating a parsed expression against a row.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// A lookup referenced a column absent from the row.
    #[error("column not found: {0}")]
    UnknownColumn(String),

    /// An expression referenced an operator missing from the operator table.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// Division by zero, integer or floating point.
    #[error("division by zero")]
    DivisionByZero,

    /// Operand types did not fit the operator.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// Top-level error for the conversion engine.
#[derive(Debug, Error)]
pub enum RecastError {
    /// Malformed or missing configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A transformation expression failed to parse.
    #[error(transparent)]
    Parser(#[from] ParserError),

    /// A guard or value expression failed during evaluation.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// No route exists between the requested formats in the mapping graph.
    #[error("no conversion path from {input} to {output}")]
    NoConversionPath { input: Format, output: Format },

    /// A mapping declaration is broken beyond use (missing formats after
    /// inheritance, unresolvable base). Non-fatal during bulk loading, where
    /// the offending file is excluded with a warning.
    #[error("invalid mapping file {path}: {reason}")]
    InvalidMappingFile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
