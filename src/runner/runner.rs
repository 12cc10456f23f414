//! The row transformation runner.
//!
//! Applies a compiled pipeline to rows: type coercion first, then every
//! declared output column independently, then assembly. Within one column the
//! entries are evaluated in order and the first produced value wins; a column
//! no entry produced stays unset and is omitted from the output row. Rows
//! where nothing was produced are excluded from the stream entirely.

use log::{debug, warn};

use super::coerce::coerce_row;
use super::pipeline::{CompiledEntry, CompiledStep, TransformationPipeline};
use crate::error::EvaluationError;
use crate::expression::ast::Value;
use crate::expression::evaluator::{Evaluator, OperatorTable};
use crate::row::Row;

/// Applies compiled transformation steps to rows.
pub struct TransformationRunner<'t> {
    table: &'t OperatorTable,
}

impl<'t> TransformationRunner<'t> {
    pub fn new(table: &'t OperatorTable) -> Self {
        Self { table }
    }

    /// Evaluates one column's candidate entries against a coerced row.
    ///
    /// Returns `None` when no entry produced a value — the unset sentinel,
    /// distinct from `Value::Null`.
    pub fn apply_column_transformation(
        &self,
        row: &Row,
        entries: &[CompiledEntry],
    ) -> Result<Option<Value>, EvaluationError> {
        let evaluator = Evaluator::new(self.table);
        for entry in entries {
            if !evaluator.truthy(&entry.when, row)? {
                continue;
            }
            // First produced value wins; later entries never overwrite it.
            return evaluator.evaluate(&entry.transformation, row).map(Some);
        }
        Ok(None)
    }

    /// Applies one mapping step to a row.
    ///
    /// Returns `None` when the row is dropped: either coercion failed, or
    /// every declared column stayed unset.
    pub fn apply_transformation_set(
        &self,
        row: &Row,
        step: &CompiledStep,
    ) -> Result<Option<Row>, EvaluationError> {
        let coerced = match coerce_row(row, &step.conversions, &step.null_values) {
            Ok(coerced) => coerced,
            Err(failure) => {
                warn!(
                    "dropping row while converting to {}: {}",
                    step.output_format, failure
                );
                return Ok(None);
            }
        };

        let mut output = Row::new();
        for column in &step.columns {
            if let Some(value) = self.apply_column_transformation(&coerced, &column.entries)? {
                output.insert(column.column.clone(), value);
            }
        }

        if output.is_empty() {
            debug!(
                "row produced no values while converting to {}; excluded",
                step.output_format
            );
            return Ok(None);
        }
        Ok(Some(output))
    }

    /// Runs rows through every step of the pipeline, feeding each step's
    /// output to the next without materializing anything in between.
    pub fn run(
        &self,
        pipeline: &TransformationPipeline,
        rows: Vec<Row>,
    ) -> Result<Vec<Row>, EvaluationError> {
        let mut current = rows;
        for step in &pipeline.steps {
            let before = current.len();
            let mut next = Vec::with_capacity(current.len());
            for row in &current {
                if let Some(output) = self.apply_transformation_set(row, step)? {
                    next.push(output);
                }
            }
            debug!(
                "{} -> {}: {} of {} rows survived",
                step.input_format,
                step.output_format,
                next.len(),
                before
            );
            current = next;
        }
        Ok(current)
    }
}
