//! Parser for the transformation expression language.
//!
//! Converts expression text into an [`Expression`] AST using a PEST grammar.
//! Parsing happens once per mapping entry; the resulting AST is reused for
//! every row of a run.

use super::ast::{Comparator, Expression, LogicalOperator, Operator, QuantifierKind, Value};
use crate::error::ParserError;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

/// Parser for transformation expressions.
#[derive(Parser)]
#[grammar = "expression/expression.pest"]
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parses the input into an expression AST.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError::UnexpectedCharacters`] with the offending
    /// position when the text does not conform to the grammar.
    pub fn parse_expression(input: &str) -> Result<Expression, ParserError> {
        let pairs = Self::parse(Rule::complete_expr, input)
            .map_err(|e| ParserError::from_pest(input, e))?;

        let complete = pairs.into_iter().next().ok_or_else(|| {
            ParserError::UnexpectedCharacters {
                expression: input.to_string(),
                position: 0,
                found: "end of input".to_string(),
            }
        })?;
        let expr_pair = complete
            .into_inner()
            .find(|p| p.as_rule() == Rule::expr)
            .ok_or_else(|| ParserError::UnexpectedCharacters {
                expression: input.to_string(),
                position: 0,
                found: "end of input".to_string(),
            })?;
        Ok(build_ast(expr_pair))
    }
}

/// Builds an AST node from a parse tree node.
///
/// The grammar guarantees the shape of every rule, so traversal here cannot
/// fail once parsing has succeeded.
fn build_ast(pair: Pair<Rule>) -> Expression {
    match pair.as_rule() {
        Rule::expr => build_ast(first_inner(pair)),
        Rule::or_expr => build_logical_chain(pair, LogicalOperator::Or),
        Rule::and_expr => build_logical_chain(pair, LogicalOperator::And),
        Rule::not_expr => build_not(pair),
        Rule::comparison => build_comparison(pair),
        Rule::sum => build_arithmetic_chain(pair),
        Rule::product => build_arithmetic_chain(pair),
        Rule::atom => build_atom(pair),
        _ => unreachable!("unexpected rule in expression tree: {:?}", pair.as_rule()),
    }
}

fn first_inner(pair: Pair<Rule>) -> Pair<Rule> {
    pair.into_inner()
        .next()
        .expect("grammar rule always has one inner node")
}

/// Folds `a op b op c` into left-associated logical nodes.
fn build_logical_chain(pair: Pair<Rule>, operator: LogicalOperator) -> Expression {
    let mut pairs = pair.into_inner();
    let mut expr = build_ast(pairs.next().expect("chain has a head"));
    while let Some(next) = pairs.next() {
        // The operator token carries no information beyond its presence.
        debug_assert!(matches!(next.as_rule(), Rule::or_op | Rule::and_op));
        let right = build_ast(pairs.next().expect("operator is followed by an operand"));
        expr = Expression::Logical {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }
    expr
}

fn build_not(pair: Pair<Rule>) -> Expression {
    let mut pairs = pair.into_inner();
    let first = pairs.next().expect("not_expr has an inner node");
    match first.as_rule() {
        Rule::not_op => {
            let operand = pairs.next().expect("not is followed by an operand");
            Expression::Not(Box::new(build_ast(operand)))
        }
        _ => build_ast(first),
    }
}

fn build_comparison(pair: Pair<Rule>) -> Expression {
    let mut pairs = pair.into_inner();
    let left = build_ast(pairs.next().expect("comparison has a left side"));

    match pairs.next() {
        None => left,
        Some(op_pair) => match op_pair.as_rule() {
            Rule::comp_op => {
                let operator = comparator_of(&op_pair);
                let right = build_ast(pairs.next().expect("comparator is followed by an operand"));
                Expression::Comparison {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                }
            }
            Rule::mem_op => {
                let negated = op_pair.clone().into_inner().count() == 3;
                let list_pair = pairs.next().expect("membership has a value list");
                let list = list_pair.into_inner().map(build_ast).collect();
                Expression::Membership {
                    value: Box::new(left),
                    negated,
                    list,
                }
            }
            other => unreachable!("unexpected rule after comparison head: {:?}", other),
        },
    }
}

fn comparator_of(op_pair: &Pair<Rule>) -> Comparator {
    let keywords: Vec<Rule> = op_pair.clone().into_inner().map(|p| p.as_rule()).collect();
    match keywords.as_slice() {
        [Rule::kw_is, Rule::kw_not] => Comparator::IsNot,
        [Rule::kw_is] => Comparator::Is,
        [Rule::kw_lt] => Comparator::Lt,
        [Rule::kw_lte] => Comparator::Lte,
        [Rule::kw_gt] => Comparator::Gt,
        [Rule::kw_gte] => Comparator::Gte,
        other => unreachable!("unexpected comparator keywords: {:?}", other),
    }
}

/// Folds `a + b - c` (or `a * b / c`) into left-associated binary nodes.
fn build_arithmetic_chain(pair: Pair<Rule>) -> Expression {
    let mut pairs = pair.into_inner();
    let mut expr = build_ast(pairs.next().expect("chain has a head"));
    while let Some(op_pair) = pairs.next() {
        let operator = match op_pair.as_str() {
            "+" => Operator::Add,
            "-" => Operator::Subtract,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            other => unreachable!("unexpected arithmetic operator: {}", other),
        };
        let right = build_ast(pairs.next().expect("operator is followed by an operand"));
        expr = Expression::BinaryOp {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        };
    }
    expr
}

fn build_atom(pair: Pair<Rule>) -> Expression {
    let inner = first_inner(pair);
    match inner.as_rule() {
        Rule::function_call => build_function_call(inner),
        Rule::quantifier => build_quantifier(inner),
        Rule::boolean => {
            let truthy = matches!(inner.as_str(), "True" | "true");
            Expression::Literal(Value::Bool(truthy))
        }
        Rule::float => Expression::Literal(parse_float(inner.as_str())),
        Rule::integer => Expression::Literal(parse_number(inner.as_str())),
        Rule::neg_number => {
            let text = inner.as_str();
            if text.contains('.') || text.contains('e') || text.contains('E') {
                Expression::Literal(parse_float(text))
            } else {
                Expression::Literal(parse_number(text))
            }
        }
        Rule::string => Expression::Literal(Value::Str(unescape_string(inner))),
        Rule::expr => build_ast(inner),
        Rule::identifier => Expression::Lookup(inner.as_str().to_string()),
        other => unreachable!("unexpected rule in atom: {:?}", other),
    }
}

/// Integer literal; digit runs too long for i64 fall back to a float.
fn parse_number(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(i) => Value::Int(i),
        Err(_) => parse_float(text),
    }
}

fn parse_float(text: &str) -> Value {
    // The grammar only admits digit/exponent shapes f64 accepts.
    Value::Float(text.parse::<f64>().unwrap_or(f64::NAN))
}

fn build_function_call(pair: Pair<Rule>) -> Expression {
    let mut pairs = pair.into_inner();
    let name = pairs.next().expect("function call has a name").as_str().to_string();
    let args: Vec<Expression> = pairs.map(build_ast).collect();

    // lookup('name') is the canonical column reference form; normalize it to
    // the same node a bare identifier produces.
    if name == "lookup" && args.len() == 1 {
        if let Expression::Literal(Value::Str(column)) = &args[0] {
            return Expression::Lookup(column.clone());
        }
    }

    Expression::FunctionCall { name, args }
}

fn build_quantifier(pair: Pair<Rule>) -> Expression {
    let mut pairs = pair.into_inner();
    let kind_pair = pairs.next().expect("quantifier has a kind");
    let kind = match kind_pair.as_str() {
        "any" => QuantifierKind::Any,
        "all" => QuantifierKind::All,
        other => unreachable!("unexpected quantifier kind: {}", other),
    };
    let exprs = pairs.map(build_ast).collect();
    Expression::Quantifier { kind, exprs }
}

/// Strips the surrounding quotes and resolves backtick escapes.
fn unescape_string(pair: Pair<Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '`' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
