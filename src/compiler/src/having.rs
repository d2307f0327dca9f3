//! Having-clause post-filter
//!
//! Runs strictly after query execution. For every metrics result with a
//! non-empty having list, a point survives iff it satisfies at least one
//! clause: the clauses combine with OR, not AND. Clause evaluation never
//! errors; a wrong-shaped list operand counts as "no match" for `in` and
//! "match" for `nin`.

use common::{CompositeQuery, DataSource, HavingClause, HavingOperator, QueryResult, Value};

/// Remove disqualified points from executed result series, in place.
///
/// Results whose builder query is missing, is not metrics-sourced, or has no
/// having clauses pass through untouched. The caller owns serializing this
/// call against other readers of the same results.
pub fn apply_having(results: &mut [QueryResult], composite: &CompositeQuery) {
    for result in results.iter_mut() {
        let Some(query) = composite.builder_queries.get(&result.query_name) else {
            continue;
        };
        if query.data_source != DataSource::Metrics || query.having.is_empty() {
            continue;
        }

        for series in &mut result.series {
            let before = series.points.len();
            series
                .points
                .retain(|point| query.having.iter().any(|clause| satisfies(point.value, clause)));
            let removed = before - series.points.len();
            if removed > 0 {
                tracing::debug!(
                    query_name = %result.query_name,
                    removed,
                    "having filter dropped points"
                );
            }
        }
    }
}

fn satisfies(value: f64, clause: &HavingClause) -> bool {
    match clause.operator {
        HavingOperator::Equal => operand(clause).is_some_and(|t| value == t),
        HavingOperator::NotEqual => operand(clause).is_some_and(|t| value != t),
        HavingOperator::GreaterThan => operand(clause).is_some_and(|t| value > t),
        HavingOperator::GreaterThanOrEq => operand(clause).is_some_and(|t| value >= t),
        HavingOperator::LessThan => operand(clause).is_some_and(|t| value < t),
        HavingOperator::LessThanOrEq => operand(clause).is_some_and(|t| value <= t),
        HavingOperator::In => list_contains(&clause.value, value),
        HavingOperator::NotIn => !list_contains(&clause.value, value),
    }
}

fn operand(clause: &HavingClause) -> Option<f64> {
    clause.value.as_f64()
}

/// Membership against a numeric list. Non-list operands and non-numeric
/// elements cannot match, which makes `in` lenient toward "no match" and
/// `nin` lenient toward "match".
fn list_contains(operand: &Value, value: f64) -> bool {
    match operand {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_f64)
            .any(|member| member == value),
        other => {
            tracing::warn!(?other, "having membership operand is not a list");
            false
        }
    }
}
