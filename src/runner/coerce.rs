//! Type coercion of raw input rows.
//!
//! Before a row's transformations are evaluated, every column with a declared
//! [`ColumnConversion`] is cast to its target type, with declared null
//! sentinels mapping to `Null` on nullable columns. A failed cast does not
//! raise: it yields a [`ConversionFailure`] value describing the offending
//! cell, and the caller drops the row from this mapping step with a warning.

use std::collections::HashMap;
use std::fmt;

use crate::expression::ast::Value;
use crate::expression::evaluator::loose_eq;
use crate::mapping::types::{ColumnConversion, ColumnType};
use crate::row::Row;

/// A single cell that failed its declared cast. A value, not an exception.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub column: String,
    pub value: Value,
    pub target: ColumnType,
    pub reason: String,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column '{}': cannot cast {:?} to {}: {}",
            self.column,
            self.value,
            self.target.name(),
            self.reason
        )
    }
}

/// Applies the declared conversions to one row.
///
/// Columns without a declared conversion pass through unchanged. The first
/// failing cast aborts the row.
pub fn coerce_row(
    row: &Row,
    conversions: &HashMap<String, ColumnConversion>,
    shared_null_values: &[Value],
) -> Result<Row, ConversionFailure> {
    let mut coerced = Row::new();
    for (column, value) in row.iter() {
        let Some(conversion) = conversions.get(column) else {
            coerced.insert(column, value.clone());
            continue;
        };

        if conversion.nullable && is_null_sentinel(value, conversion, shared_null_values) {
            coerced.insert(column, Value::Null);
            continue;
        }

        match cast(value, conversion.column_type) {
            Ok(cast_value) => coerced.insert(column, cast_value),
            Err(reason) => {
                return Err(ConversionFailure {
                    column: column.to_string(),
                    value: value.clone(),
                    target: conversion.column_type,
                    reason,
                })
            }
        }
    }
    Ok(coerced)
}

fn is_null_sentinel(value: &Value, conversion: &ColumnConversion, shared: &[Value]) -> bool {
    conversion
        .null_values
        .iter()
        .chain(shared.iter())
        .any(|sentinel| loose_eq(value, sentinel))
}

/// Casts a scalar to the target type. Int casts truncate floats and parse
/// integer-shaped strings; nulls only survive through sentinel handling.
fn cast(value: &Value, target: ColumnType) -> Result<Value, String> {
    match target {
        ColumnType::Int => cast_int(value),
        ColumnType::Float => cast_float(value),
        ColumnType::String => cast_string(value),
    }
}

fn cast_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Float(f) => Err(format!("{} is not finite", f)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| e.to_string()),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Null => Err("null in a non-nullable column".to_string()),
    }
}

fn cast_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| e.to_string()),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Null => Err("null in a non-nullable column".to_string()),
    }
}

fn cast_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::Str(s) => Ok(Value::Str(s.clone())),
        Value::Null => Err("null in a non-nullable column".to_string()),
        other => Ok(Value::Str(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_conversion(nullable: bool, null_values: Vec<Value>) -> HashMap<String, ColumnConversion> {
        let mut conversions = HashMap::new();
        let mut conversion = ColumnConversion::new(ColumnType::Int);
        if nullable {
            conversion = conversion.nullable(null_values);
        }
        conversions.insert("a".to_string(), conversion);
        conversions
    }

    #[test]
    fn test_casts() {
        let conversions = int_conversion(false, vec![]);
        let coerce = |v: Value| coerce_row(&Row::from([("a", v)]), &conversions, &[]);

        assert_eq!(coerce(Value::Str("1".into())).unwrap().get("a"), Some(&Value::Int(1)));
        assert_eq!(coerce(Value::Float(3.1)).unwrap().get("a"), Some(&Value::Int(3)));
        assert_eq!(coerce(Value::Int(7)).unwrap().get("a"), Some(&Value::Int(7)));

        let failure = coerce(Value::Str("foo".into())).unwrap_err();
        assert_eq!(failure.column, "a");
        assert_eq!(failure.target, ColumnType::Int);
    }

    #[test]
    fn test_null_sentinels() {
        let conversions = int_conversion(true, vec![Value::Null, Value::Str("NULL".into())]);
        let coerce = |v: Value| coerce_row(&Row::from([("a", v)]), &conversions, &[]);

        assert_eq!(coerce(Value::Null).unwrap().get("a"), Some(&Value::Null));
        assert_eq!(coerce(Value::Str("NULL".into())).unwrap().get("a"), Some(&Value::Null));
        // Not a sentinel, so it must cast.
        assert_eq!(coerce(Value::Str("5".into())).unwrap().get("a"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_non_nullable_sentinel_still_casts() {
        // Sentinels only apply to nullable columns.
        let conversions = int_conversion(false, vec![]);
        let row = Row::from([("a", Value::Null)]);
        assert!(coerce_row(&row, &conversions, &[]).is_err());
    }

    #[test]
    fn test_shared_null_values() {
        let conversions = int_conversion(true, vec![]);
        let shared = vec![Value::Str("NA".into())];
        let row = Row::from([("a", Value::Str("NA".into()))]);
        assert_eq!(
            coerce_row(&row, &conversions, &shared).unwrap().get("a"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_undeclared_columns_pass_through() {
        let conversions = int_conversion(false, vec![]);
        let row = Row::from([("a", Value::Str("1".into())), ("b", Value::Str("raw".into()))]);
        let coerced = coerce_row(&row, &conversions, &[]).unwrap();
        assert_eq!(coerced.get("b"), Some(&Value::Str("raw".into())));
    }

    #[test]
    fn test_float_and_string_targets() {
        let mut conversions = HashMap::new();
        conversions.insert("f".to_string(), ColumnConversion::new(ColumnType::Float));
        conversions.insert("s".to_string(), ColumnConversion::new(ColumnType::String));

        let row = Row::from([("f", Value::Str("2.5".into())), ("s", Value::Int(3))]);
        let coerced = coerce_row(&row, &conversions, &[]).unwrap();
        assert_eq!(coerced.get("f"), Some(&Value::Float(2.5)));
        assert_eq!(coerced.get("s"), Some(&Value::Str("3".into())));
    }
}
