//! Compiled conversion paths.
//!
//! A resolved path is compiled exactly once per job: every entry's guard and
//! value expression is parsed to an AST here, memoized by expression text,
//! and then shared read-only across all rows of the run.

use std::collections::HashMap;

use crate::error::ParserError;
use crate::expression::ast::{Expression, Value};
use crate::expression::parser::ExpressionParser;
use crate::mapping::format::Format;
use crate::mapping::types::{ColumnConversion, DirectionalMapping};

/// A compiled (guard, value) entry.
#[derive(Debug, Clone)]
pub struct CompiledEntry {
    pub when: Expression,
    pub transformation: Expression,
}

/// A compiled entry list for one output column.
#[derive(Debug, Clone)]
pub struct CompiledColumn {
    pub column: String,
    pub entries: Vec<CompiledEntry>,
}

/// One edge of the conversion path, ready to apply.
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub input_format: Format,
    pub output_format: Format,
    pub columns: Vec<CompiledColumn>,
    pub conversions: HashMap<String, ColumnConversion>,
    pub null_values: Vec<Value>,
}

/// An ordered sequence of compiled mapping steps.
#[derive(Debug, Clone)]
pub struct TransformationPipeline {
    pub steps: Vec<CompiledStep>,
}

impl TransformationPipeline {
    /// Compiles a resolved path. Each distinct expression text is parsed
    /// once, however often it recurs across entries and steps.
    pub fn compile(path: Vec<&DirectionalMapping>) -> Result<Self, ParserError> {
        let mut cache: HashMap<String, Expression> = HashMap::new();
        let mut steps = Vec::with_capacity(path.len());

        for mapping in path {
            let mut columns = Vec::with_capacity(mapping.transformations.columns.len());
            for column in &mapping.transformations.columns {
                let mut entries = Vec::with_capacity(column.entries.len());
                for entry in &column.entries {
                    entries.push(CompiledEntry {
                        when: parse_cached(&mut cache, &entry.when)?,
                        transformation: parse_cached(&mut cache, &entry.transformation)?,
                    });
                }
                columns.push(CompiledColumn {
                    column: column.column.clone(),
                    entries,
                });
            }
            steps.push(CompiledStep {
                input_format: mapping.input_format.clone(),
                output_format: mapping.output_format.clone(),
                columns,
                conversions: mapping.conversions.clone(),
                null_values: mapping.null_values.clone(),
            });
        }
        Ok(Self { steps })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn parse_cached(
    cache: &mut HashMap<String, Expression>,
    text: &str,
) -> Result<Expression, ParserError> {
    if let Some(ast) = cache.get(text) {
        return Ok(ast.clone());
    }
    let ast = ExpressionParser::parse_expression(text)?;
    cache.insert(text.to_string(), ast.clone());
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::types::{TransformationEntry, TransformationSet};

    fn mapping() -> DirectionalMapping {
        DirectionalMapping::new(
            Format::named("a"),
            Format::named("b"),
            TransformationSet::from_pairs([
                ("c", vec![TransformationEntry::new("a * 2")]),
                ("d", vec![TransformationEntry::when("a * 4", "a is 1")]),
            ]),
        )
    }

    #[test]
    fn test_compile_parses_every_entry() {
        let mapping = mapping();
        let pipeline = TransformationPipeline::compile(vec![&mapping]).unwrap();
        assert_eq!(pipeline.steps.len(), 1);
        assert_eq!(pipeline.steps[0].columns.len(), 2);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mapping = mapping();
        let first = TransformationPipeline::compile(vec![&mapping]).unwrap();
        let second = TransformationPipeline::compile(vec![&mapping]).unwrap();
        assert_eq!(
            first.steps[0].columns[0].entries[0].transformation,
            second.steps[0].columns[0].entries[0].transformation
        );
    }

    #[test]
    fn test_compile_surfaces_parser_errors() {
        let broken = DirectionalMapping::new(
            Format::named("a"),
            Format::named("b"),
            TransformationSet::from_pairs([("c", vec![TransformationEntry::new("a +")])]),
        );
        assert!(TransformationPipeline::compile(vec![&broken]).is_err());
    }
}
