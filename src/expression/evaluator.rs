//! Evaluation of expression ASTs against rows.
//!
//! Every operation dispatches through an [`OperatorTable`], a mapping from
//! operator name to a callable of the row context plus operand values. The
//! table is the injection seam for alternative engines: a columnar engine
//! supplies operators that return column objects instead of scalars, while
//! the tree walk stays the same. [`OperatorTable::standard`] provides the
//! scalar semantics used by the row runner.

use std::collections::HashMap;

use regex::Regex;

use super::ast::{Expression, Value};
use crate::error::EvaluationError;
use crate::row::Row;

/// An operator implementation: receives the row being evaluated and the
/// already-evaluated operand values.
pub type OperatorFn = Box<dyn Fn(&Row, &[Value]) -> Result<Value, EvaluationError> + Send + Sync>;

/// A pluggable table of named operators.
pub struct OperatorTable {
    operators: HashMap<String, OperatorFn>,
}

impl OperatorTable {
    /// Creates an empty table. Useful for engines that supply every operator
    /// themselves.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// Creates the standard scalar operator table.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register("lookup", Box::new(op_lookup));
        table.register("boolean", Box::new(op_boolean));
        table.register("add", Box::new(op_add));
        table.register("subtract", Box::new(op_subtract));
        table.register("multiply", Box::new(op_multiply));
        table.register("divide", Box::new(op_divide));
        table.register("is", Box::new(op_is));
        table.register("is_not", Box::new(op_is_not));
        table.register("lt", Box::new(op_lt));
        table.register("lte", Box::new(op_lte));
        table.register("gt", Box::new(op_gt));
        table.register("gte", Box::new(op_gte));
        table.register("in", Box::new(op_in));
        table.register("not_in", Box::new(op_not_in));
        table.register("and", Box::new(op_and));
        table.register("or", Box::new(op_or));
        table.register("not", Box::new(op_not));
        table.register("any", Box::new(op_any));
        table.register("all", Box::new(op_all));
        table.register("match", Box::new(op_match));
        table.register("search", Box::new(op_search));
        table.register("replace", Box::new(op_replace));
        table.register("join", Box::new(op_join));
        table
    }

    /// Registers or replaces an operator.
    pub fn register(&mut self, name: impl Into<String>, operator: OperatorFn) {
        self.operators.insert(name.into(), operator);
    }

    fn get(&self, name: &str) -> Result<&OperatorFn, EvaluationError> {
        self.operators
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownOperator(name.to_string()))
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Evaluates expressions against rows through an operator table.
///
/// Evaluation is a pure function of (row, AST, table); the evaluator holds
/// no mutable state and may be shared freely.
pub struct Evaluator<'t> {
    table: &'t OperatorTable,
}

impl<'t> Evaluator<'t> {
    pub fn new(table: &'t OperatorTable) -> Self {
        Self { table }
    }

    /// Evaluates an expression against a row.
    pub fn evaluate(&self, expr: &Expression, row: &Row) -> Result<Value, EvaluationError> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Lookup(column) => {
                self.apply("lookup", row, vec![Value::Str(column.clone())])
            }

            Expression::BinaryOp { left, operator, right } => {
                let args = vec![self.evaluate(left, row)?, self.evaluate(right, row)?];
                self.apply(operator.key(), row, args)
            }

            Expression::Comparison { left, operator, right } => {
                let args = vec![self.evaluate(left, row)?, self.evaluate(right, row)?];
                self.apply(operator.key(), row, args)
            }

            Expression::Membership { value, negated, list } => {
                let mut args = Vec::with_capacity(list.len() + 1);
                args.push(self.evaluate(value, row)?);
                for item in list {
                    args.push(self.evaluate(item, row)?);
                }
                self.apply(if *negated { "not_in" } else { "in" }, row, args)
            }

            Expression::Logical { left, operator, right } => {
                let args = vec![self.evaluate(left, row)?, self.evaluate(right, row)?];
                self.apply(operator.key(), row, args)
            }

            Expression::Not(inner) => {
                let args = vec![self.evaluate(inner, row)?];
                self.apply("not", row, args)
            }

            Expression::Quantifier { kind, exprs } => {
                let args = exprs
                    .iter()
                    .map(|e| self.evaluate(e, row))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(kind.key(), row, args)
            }

            Expression::FunctionCall { name, args } => {
                let evaluated = args
                    .iter()
                    .map(|a| self.evaluate(a, row))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(name, row, evaluated)
            }
        }
    }

    /// Evaluates an expression and reduces it to a guard decision through the
    /// `boolean` operator.
    pub fn truthy(&self, expr: &Expression, row: &Row) -> Result<bool, EvaluationError> {
        let value = self.evaluate(expr, row)?;
        let decision = self.apply("boolean", row, vec![value])?;
        Ok(decision.is_truthy())
    }

    fn apply(&self, name: &str, row: &Row, args: Vec<Value>) -> Result<Value, EvaluationError> {
        (self.table.get(name)?)(row, &args)
    }
}

// Standard scalar operators

fn expect_arity(name: &str, args: &[Value], arity: usize) -> Result<(), EvaluationError> {
    if args.len() != arity {
        return Err(EvaluationError::TypeMismatch(format!(
            "{} expects {} argument(s), got {}",
            name,
            arity,
            args.len()
        )));
    }
    Ok(())
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Value equality with Int/Float cross-type numeric comparison.
pub(crate) fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (a, b) => a == b,
    }
}

fn op_lookup(row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("lookup", args, 1)?;
    let column = match &args[0] {
        Value::Str(s) => s,
        other => {
            return Err(EvaluationError::TypeMismatch(format!(
                "lookup expects a column name, got {}",
                other.type_name()
            )))
        }
    };
    row.get(column)
        .cloned()
        .ok_or_else(|| EvaluationError::UnknownColumn(column.clone()))
}

fn op_boolean(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("boolean", args, 1)?;
    Ok(Value::Bool(args[0].is_truthy()))
}

fn op_add(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("add", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (a, b) => numeric_pair("add", a, b).map(|(x, y)| Value::Float(x + y)),
    }
}

fn op_subtract(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("subtract", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
        (a, b) => numeric_pair("subtract", a, b).map(|(x, y)| Value::Float(x - y)),
    }
}

fn op_multiply(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("multiply", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
        (a, b) => numeric_pair("multiply", a, b).map(|(x, y)| Value::Float(x * y)),
    }
}

/// Division of two Ints stays Int when exact; everything else is Float.
/// Division by zero is an error, never a silent coercion.
fn op_divide(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("divide", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(_), Value::Int(0)) => Err(EvaluationError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            if a % b == 0 {
                Ok(Value::Int(a / b))
            } else {
                Ok(Value::Float(*a as f64 / *b as f64))
            }
        }
        (a, b) => {
            let (x, y) = numeric_pair("divide", a, b)?;
            if y == 0.0 {
                Err(EvaluationError::DivisionByZero)
            } else {
                Ok(Value::Float(x / y))
            }
        }
    }
}

fn numeric_pair(name: &str, a: &Value, b: &Value) -> Result<(f64, f64), EvaluationError> {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(EvaluationError::TypeMismatch(format!(
            "{} expects numeric operands, got {} and {}",
            name,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn op_is(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("is", args, 2)?;
    Ok(Value::Bool(loose_eq(&args[0], &args[1])))
}

fn op_is_not(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("is not", args, 2)?;
    Ok(Value::Bool(!loose_eq(&args[0], &args[1])))
}

fn ordering(name: &str, a: &Value, b: &Value) -> Result<std::cmp::Ordering, EvaluationError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => {
            let (x, y) = numeric_pair(name, a, b)?;
            x.partial_cmp(&y).ok_or_else(|| {
                EvaluationError::TypeMismatch(format!("{} cannot order {} and {}", name, x, y))
            })
        }
    }
}

fn op_lt(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("lt", args, 2)?;
    Ok(Value::Bool(ordering("lt", &args[0], &args[1])?.is_lt()))
}

fn op_lte(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("lte", args, 2)?;
    Ok(Value::Bool(ordering("lte", &args[0], &args[1])?.is_le()))
}

fn op_gt(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("gt", args, 2)?;
    Ok(Value::Bool(ordering("gt", &args[0], &args[1])?.is_gt()))
}

fn op_gte(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("gte", args, 2)?;
    Ok(Value::Bool(ordering("gte", &args[0], &args[1])?.is_ge()))
}

fn op_in(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    if args.is_empty() {
        return Err(EvaluationError::TypeMismatch(
            "in expects a value and a list".to_string(),
        ));
    }
    let found = args[1..].iter().any(|item| loose_eq(&args[0], item));
    Ok(Value::Bool(found))
}

fn op_not_in(row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    match op_in(row, args)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!("in always yields a boolean"),
    }
}

fn op_and(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("and", args, 2)?;
    Ok(Value::Bool(args[0].is_truthy() && args[1].is_truthy()))
}

fn op_or(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("or", args, 2)?;
    Ok(Value::Bool(args[0].is_truthy() || args[1].is_truthy()))
}

fn op_not(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("not", args, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn op_any(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Bool(args.iter().any(Value::is_truthy)))
}

fn op_all(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    Ok(Value::Bool(args.iter().all(Value::is_truthy)))
}

fn compile_pattern(name: &str, pattern: &Value) -> Result<Regex, EvaluationError> {
    let text = match pattern {
        Value::Str(s) => s,
        other => {
            return Err(EvaluationError::TypeMismatch(format!(
                "{} expects a string pattern, got {}",
                name,
                other.type_name()
            )))
        }
    };
    Regex::new(text).map_err(|e| {
        EvaluationError::TypeMismatch(format!("{} pattern {:?} is invalid: {}", name, text, e))
    })
}

/// `match(value, pattern)` — pattern anchored at the start of the value.
fn op_match(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("match", args, 2)?;
    let anchored = match &args[1] {
        Value::Str(s) => Value::Str(format!("^(?:{})", s)),
        other => other.clone(),
    };
    let regex = compile_pattern("match", &anchored)?;
    Ok(Value::Bool(regex.is_match(&args[0].to_string())))
}

/// `search(value, pattern)` — pattern matched anywhere in the value.
fn op_search(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("search", args, 2)?;
    let regex = compile_pattern("search", &args[1])?;
    Ok(Value::Bool(regex.is_match(&args[0].to_string())))
}

/// `replace(value, pattern, replacement)` — regex substitution.
fn op_replace(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    expect_arity("replace", args, 3)?;
    let regex = compile_pattern("replace", &args[1])?;
    let replacement = match &args[2] {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    };
    let replaced = regex
        .replace_all(&args[0].to_string(), replacement.as_str())
        .into_owned();
    Ok(Value::Str(replaced))
}

/// `join(sep, v...)` — joins the string renderings of the remaining values.
fn op_join(_row: &Row, args: &[Value]) -> Result<Value, EvaluationError> {
    if args.is_empty() {
        return Err(EvaluationError::TypeMismatch(
            "join expects a separator and values".to_string(),
        ));
    }
    let separator = args[0].to_string();
    let parts: Vec<String> = args[1..].iter().map(|v| v.to_string()).collect();
    Ok(Value::Str(parts.join(&separator)))
}
