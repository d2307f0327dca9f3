//! Filter set to boolean expression text
//!
//! Compiles a [`FilterSet`] into one boolean expression for the embedded
//! expression engine shared by the record-routing pipeline. Field references
//! follow the attribute namespace rule; existence operators become
//! containment tests against the key's parent container, never value
//! comparisons.

use common::{AttributeKey, AttributeType, FilterItem, FilterOperator, FilterSet};

use crate::error::{CompilerError, Result};
use crate::format::{Dialect, format_value};

/// Clause separators, pinned to the expression engine's boolean keywords.
///
/// The engine accepts lowercase `and`/`or`; the raw combinator values on the
/// wire are uppercase. Joining happens at exactly this one point.
const AND_SEPARATOR: &str = " and ";
const OR_SEPARATOR: &str = " or ";

/// Compile a filter set into boolean expression text.
///
/// The output is deterministic for a given input; the same set always
/// compiles to the same text.
pub fn compile_filter(set: &FilterSet) -> Result<String> {
    let mut clauses = Vec::with_capacity(set.items.len());
    for item in &set.items {
        clauses.push(compile_item(item)?);
    }

    let separator = match set.operator {
        common::FilterCombinator::And => AND_SEPARATOR,
        common::FilterCombinator::Or => OR_SEPARATOR,
    };
    let expression = clauses.join(separator);
    tracing::debug!(%expression, "compiled filter expression");
    Ok(expression)
}

fn compile_item(item: &FilterItem) -> Result<String> {
    if item.operator.is_existence() {
        return Ok(existence_clause(item));
    }

    let value = item.value.as_ref().ok_or(CompilerError::MissingValue {
        operator: item.operator.as_str(),
    })?;
    let literal = format_value(value, Dialect::Expression)?;
    if literal.is_empty() {
        // An empty literal (empty array) would corrupt the expression.
        return Err(CompilerError::unsupported_value(format!(
            "empty literal for '{}' on key '{}'",
            engine_operator(item.operator),
            item.key.key
        )));
    }

    Ok(format!(
        "{} {} {}",
        field_reference(&item.key),
        engine_operator(item.operator),
        literal
    ))
}

/// Existence tests check key membership in the parent container. Keys without
/// a container (bare columns, body paths) are tested against the record body.
fn existence_clause(item: &FilterItem) -> String {
    let membership = match item.operator {
        FilterOperator::Exists => "in",
        _ => "not in",
    };
    let container = item.key.key_type.container().unwrap_or("body");
    format!("\"{}\" {} {}", item.key.key, membership, container)
}

/// Render a field reference per the attribute namespace rule.
fn field_reference(key: &AttributeKey) -> String {
    match key.key_type {
        AttributeType::Tag => format!("attributes.{}", key.key),
        AttributeType::Resource => format!("resources.{}", key.key),
        AttributeType::Unspecified => key.key.clone(),
    }
}

/// Expression-engine token for each comparison operator.
fn engine_operator(operator: FilterOperator) -> &'static str {
    match operator {
        FilterOperator::Equal => "==",
        FilterOperator::NotEqual => "!=",
        FilterOperator::LessThan => "<",
        FilterOperator::LessThanOrEq => "<=",
        FilterOperator::GreaterThan => ">",
        FilterOperator::GreaterThanOrEq => ">=",
        FilterOperator::Contains => "contains",
        FilterOperator::NotContains => "not contains",
        FilterOperator::Regex => "matches",
        FilterOperator::NotRegex => "not matches",
        FilterOperator::In => "in",
        FilterOperator::NotIn => "not in",
        FilterOperator::Exists => "in",
        FilterOperator::NotExists => "not in",
    }
}
