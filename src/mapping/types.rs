//! Mapping declaration data model.
//!
//! A [`MappingSpec`] associates an input and output [`Format`] with up to two
//! [`DirectionalMapping`]s (forward and reverse). All types here are immutable
//! after construction; the loader (or embedding code) builds them once and the
//! graph borrows them for the rest of the run.

use std::collections::HashMap;

use super::format::Format;
use crate::expression::ast::Value;

/// One candidate (guard, value expression) pair for an output column.
///
/// Expressions are kept as text here; they are parsed to ASTs exactly once
/// when a conversion path is compiled, never per row. Equality is value-based
/// on the two expression texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationEntry {
    /// Guard expression; the entry applies only where this is truthy.
    pub when: String,
    /// Value expression computing the column.
    pub transformation: String,
}

impl TransformationEntry {
    /// An unconditional entry.
    pub fn new(transformation: impl Into<String>) -> Self {
        Self {
            when: "True".to_string(),
            transformation: transformation.into(),
        }
    }

    /// A guarded entry.
    pub fn when(transformation: impl Into<String>, when: impl Into<String>) -> Self {
        Self {
            when: when.into(),
            transformation: transformation.into(),
        }
    }
}

/// The ordered entry list for one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTransformations {
    pub column: String,
    pub entries: Vec<TransformationEntry>,
}

/// Ordered mapping of output column name to its candidate entries.
///
/// Column order defines output column order; it does not affect evaluation,
/// which treats each column independently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformationSet {
    pub columns: Vec<ColumnTransformations>,
}

impl TransformationSet {
    pub fn new(columns: Vec<ColumnTransformations>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convenience constructor from (column, entries) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<TransformationEntry>)>,
        S: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(column, entries)| ColumnTransformations {
                    column: column.into(),
                    entries,
                })
                .collect(),
        }
    }
}

/// Target scalar type of a column conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    String,
}

impl ColumnType {
    /// Parses the type tag used in mapping files.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(ColumnType::Int),
            "float" => Some(ColumnType::Float),
            "string" => Some(ColumnType::String),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::String => "string",
        }
    }
}

/// How one source column must be coerced before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConversion {
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Sentinel values treated as null for this column.
    pub null_values: Vec<Value>,
}

impl ColumnConversion {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: false,
            null_values: Vec::new(),
        }
    }

    pub fn nullable(mut self, null_values: Vec<Value>) -> Self {
        self.nullable = true;
        self.null_values = null_values;
        self
    }
}

/// One direction of a mapping: the transformation set plus the coercions its
/// expressions rely on.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalMapping {
    pub input_format: Format,
    pub output_format: Format,
    pub transformations: TransformationSet,
    pub conversions: HashMap<String, ColumnConversion>,
    /// Direction-wide null sentinels applied on top of per-column ones.
    pub null_values: Vec<Value>,
}

impl DirectionalMapping {
    pub fn new(input_format: Format, output_format: Format, transformations: TransformationSet) -> Self {
        Self {
            input_format,
            output_format,
            transformations,
            conversions: HashMap::new(),
            null_values: Vec::new(),
        }
    }

    pub fn with_conversions(mut self, conversions: HashMap<String, ColumnConversion>) -> Self {
        self.conversions = conversions;
        self
    }
}

/// A declared mapping between two formats, optionally bidirectional.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSpec {
    pub input_format: Format,
    pub output_format: Format,
    /// input → output direction, if declared non-empty.
    pub forward: Option<DirectionalMapping>,
    /// output → input direction, if declared non-empty. Carried with its own
    /// formats already swapped, so the graph treats it as a forward edge.
    pub reverse: Option<DirectionalMapping>,
}

impl MappingSpec {
    pub fn new(input_format: Format, output_format: Format) -> Self {
        Self {
            input_format,
            output_format,
            forward: None,
            reverse: None,
        }
    }

    pub fn with_forward(mut self, transformations: TransformationSet) -> Self {
        self.forward = Some(DirectionalMapping::new(
            self.input_format.clone(),
            self.output_format.clone(),
            transformations,
        ));
        self
    }

    pub fn with_reverse(mut self, transformations: TransformationSet) -> Self {
        self.reverse = Some(DirectionalMapping::new(
            self.output_format.clone(),
            self.input_format.clone(),
            transformations,
        ));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults_to_unconditional() {
        let entry = TransformationEntry::new("a * 2");
        assert_eq!(entry.when, "True");
        assert_eq!(entry, TransformationEntry::when("a * 2", "True"));
    }

    #[test]
    fn test_reverse_swaps_formats() {
        let spec = MappingSpec::new(Format::named("a"), Format::named("b"))
            .with_reverse(TransformationSet::from_pairs([(
                "x",
                vec![TransformationEntry::new("y")],
            )]));
        let reverse = spec.reverse.unwrap();
        assert_eq!(reverse.input_format, Format::named("b"));
        assert_eq!(reverse.output_format, Format::named("a"));
    }
}
