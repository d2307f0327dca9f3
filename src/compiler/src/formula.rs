//! Arithmetic formula parsing and join synthesis
//!
//! A formula is an arithmetic expression over the names of leaf queries,
//! e.g. `A/B` or `((A - B) / B) * 100`. It is parsed with a general SQL
//! expression grammar, validated (known variables, known function names,
//! identical group-by lists), then rendered as one query that equi-joins the
//! referenced sub-queries as derived tables and computes the formula over
//! their `value` columns.
//!
//! Function names are registered for syntactic acceptance only: nothing here
//! evaluates them. The backend that executes the emitted text owns their
//! numeric semantics, so this vocabulary must track that engine's function
//! set.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use sqlparser::ast::{Expr, FunctionArg, FunctionArgExpr, FunctionArguments};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use common::{BuilderQuery, CompositeQuery, PanelType};

use crate::error::{CompilerError, Result};

/// Timestamp column every derived sub-query exposes alongside its grouping
/// columns and `value`.
const TS_COLUMN: &str = "ts";

/// Function names accepted in formulas, matching the execution engine's
/// unary math set.
const DEFAULT_FUNCTIONS: &[&str] = &[
    "exp",
    "log",
    "ln",
    "exp2",
    "log2",
    "exp10",
    "log10",
    "sqrt",
    "cbrt",
    "erf",
    "erfc",
    "lgamma",
    "tgamma",
    "sin",
    "cos",
    "tan",
    "asin",
    "acos",
    "atan",
    "degrees",
    "radians",
    "now",
    "toUnixTimestamp",
];

/// Immutable function vocabulary injected at compiler construction.
///
/// Lookups are case-insensitive. Per-tenant or per-dialect variants can be
/// built with [`MathFunctions::new`] without touching shared state.
#[derive(Debug, Clone)]
pub struct MathFunctions {
    names: BTreeSet<String>,
}

impl MathFunctions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }
}

impl Default for MathFunctions {
    fn default() -> Self {
        Self::new(DEFAULT_FUNCTIONS)
    }
}

/// Compile one formula query into join-chain query text.
///
/// `compiled` holds the already-built text of every leaf query.
pub(crate) fn compile_formula(
    query: &BuilderQuery,
    composite: &CompositeQuery,
    compiled: &BTreeMap<String, String>,
    functions: &MathFunctions,
) -> Result<String> {
    let formula = &query.expression;
    let expr = parse_formula(formula)?;

    let variables = collect_variables(&expr, formula, functions)?;
    if variables.is_empty() {
        return Err(CompilerError::malformed_formula(
            formula,
            "formula references no queries",
        ));
    }

    // Every variable must name an existing leaf query: formulas are resolved
    // in one pass after all leaves, so formula-over-formula cannot work.
    let mut referenced = Vec::with_capacity(variables.len());
    for name in &variables {
        let target = composite
            .builder_queries
            .get(name)
            .ok_or_else(|| CompilerError::UnknownVariable { name: name.clone() })?;
        if !target.is_leaf() {
            return Err(CompilerError::FormulaOverFormula { name: name.clone() });
        }
        referenced.push(target);
    }

    // Identical group-by lists guarantee the join below is dimensionally
    // well-formed.
    let first = referenced[0];
    for other in &referenced[1..] {
        if other.group_keys() != first.group_keys() {
            return Err(CompilerError::GroupByMismatch {
                left: first.query_name.clone(),
                right: other.query_name.clone(),
            });
        }
    }

    // Table panels aggregate over the whole range, so the sub-queries carry
    // no timestamp column to select or join on.
    let mut join_keys: Vec<&str> = first.group_keys();
    if composite.panel_type != PanelType::Table {
        join_keys.push(TS_COLUMN);
    }

    let first_name = &variables[0];
    let select_list = join_keys
        .iter()
        .map(|key| format!("{first_name}.`{key}` as `{key}`, "))
        .collect::<String>();

    // Left-deep chain: each sub-query joins the previous one on every
    // join key.
    let mut from_chain = String::new();
    for (idx, name) in variables.iter().enumerate() {
        let text = compiled
            .get(name)
            .ok_or_else(|| CompilerError::UnknownVariable { name: name.clone() })?;
        if idx > 0 {
            from_chain.push_str(" INNER JOIN ");
        }
        from_chain.push_str(&format!("({text}) as {name}"));
        if idx > 0 && !join_keys.is_empty() {
            let prev = &variables[idx - 1];
            let on = join_keys
                .iter()
                .map(|key| format!("{prev}.`{key}` = {name}.`{key}`"))
                .collect::<Vec<_>>()
                .join(" AND ");
            from_chain.push_str(&format!(" ON {on}"));
        }
    }

    let rendered = render(&expr);
    let text = format!("SELECT {select_list}{rendered} as value FROM {from_chain}");
    tracing::debug!(query_name = %query.query_name, formula = %formula, "compiled formula query");
    Ok(text)
}

fn parse_formula(formula: &str) -> Result<Expr> {
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect)
        .try_with_sql(formula)
        .map_err(|e| CompilerError::malformed_formula(formula, e.to_string()))?;
    let expr = parser
        .parse_expr()
        .map_err(|e| CompilerError::malformed_formula(formula, e.to_string()))?;
    if parser.peek_token().token != Token::EOF {
        return Err(CompilerError::malformed_formula(
            formula,
            "trailing input after expression",
        ));
    }
    Ok(expr)
}

/// Unique variable names in order of first occurrence, validating function
/// names along the way.
fn collect_variables(
    expr: &Expr,
    formula: &str,
    functions: &MathFunctions,
) -> Result<Vec<String>> {
    let mut variables = Vec::new();
    walk(expr, formula, functions, &mut variables)?;
    Ok(variables)
}

fn walk(
    expr: &Expr,
    formula: &str,
    functions: &MathFunctions,
    variables: &mut Vec<String>,
) -> Result<()> {
    match expr {
        Expr::Identifier(ident) => {
            if !variables.iter().any(|v| v == &ident.value) {
                variables.push(ident.value.clone());
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            walk(left, formula, functions, variables)?;
            walk(right, formula, functions, variables)?;
        }
        Expr::UnaryOp { expr: inner, .. } => walk(inner, formula, functions, variables)?,
        Expr::Nested(inner) => walk(inner, formula, functions, variables)?,
        Expr::Function(func) => {
            let name = func.name.to_string();
            if !functions.contains(&name) {
                return Err(CompilerError::UnknownFunction { name });
            }
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(inner)) = arg {
                        walk(inner, formula, functions, variables)?;
                    }
                }
            }
        }
        Expr::Value(_) => {}
        other => {
            return Err(CompilerError::malformed_formula(
                formula,
                format!("unsupported construct '{other}'"),
            ));
        }
    }
    Ok(())
}

/// Re-render the formula with every variable rewritten to `<name>.value`,
/// reflecting the single numeric column each derived sub-query exposes.
fn render(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => format!("{}.value", ident.value),
        Expr::BinaryOp { left, op, right } => {
            format!("{} {} {}", render(left), op, render(right))
        }
        Expr::UnaryOp { op, expr: inner } => format!("{}{}", op, render(inner)),
        Expr::Nested(inner) => format!("({})", render(inner)),
        Expr::Function(func) => {
            let args = match &func.args {
                FunctionArguments::List(list) => list
                    .args
                    .iter()
                    .map(|arg| match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(inner)) => render(inner),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            format!("{}({args})", func.name)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use common::DataSource;

    use super::*;

    fn leaf(name: &str, group_by: &[&str]) -> BuilderQuery {
        BuilderQuery {
            query_name: name.to_string(),
            expression: name.to_string(),
            data_source: DataSource::Metrics,
            step_interval: 60,
            group_by: group_by
                .iter()
                .map(|k| common::AttributeKey::tag(*k))
                .collect(),
            filters: None,
            having: vec![],
            legend: String::new(),
            disabled: false,
        }
    }

    fn formula(name: &str, expression: &str) -> BuilderQuery {
        BuilderQuery {
            expression: expression.to_string(),
            ..leaf(name, &[])
        }
    }

    fn composite(queries: Vec<BuilderQuery>) -> CompositeQuery {
        CompositeQuery {
            builder_queries: queries
                .into_iter()
                .map(|q| (q.query_name.clone(), q))
                .collect(),
            ..Default::default()
        }
    }

    fn compiled(names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .map(|n| (n.to_string(), format!("SELECT value FROM {n}_sub")))
            .collect()
    }

    #[test]
    fn test_variable_order_is_first_occurrence() {
        let expr = parse_formula("B + A * B").unwrap();
        let vars = collect_variables(&expr, "B + A * B", &MathFunctions::default()).unwrap();
        assert_eq!(vars, ["B", "A"]);
    }

    #[test]
    fn test_two_query_join() {
        let composite = composite(vec![
            leaf("A", &["service_name"]),
            leaf("B", &["service_name"]),
            formula("F1", "A + B"),
        ]);
        let text = compile_formula(
            &composite.builder_queries["F1"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap();

        assert!(text.starts_with(
            "SELECT A.`service_name` as `service_name`, A.`ts` as `ts`, A.value + B.value as value FROM "
        ));
        assert!(text.contains("(SELECT value FROM A_sub) as A INNER JOIN (SELECT value FROM B_sub) as B"));
        assert!(text.contains("ON A.`service_name` = B.`service_name` AND A.`ts` = B.`ts`"));
    }

    #[test]
    fn test_table_panel_leaves_out_timestamp_column() {
        let mut composite = composite(vec![
            leaf("A", &["key1.1"]),
            leaf("B", &["key1.1"]),
            formula("F1", "A + B"),
        ]);
        composite.panel_type = PanelType::Table;
        let text = compile_formula(
            &composite.builder_queries["F1"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap();

        assert!(text
            .starts_with("SELECT A.`key1.1` as `key1.1`, A.value + B.value as value FROM "));
        assert!(text.contains("ON A.`key1.1` = B.`key1.1`"));
        assert!(!text.contains("`ts`"));
    }

    #[test]
    fn test_ungrouped_table_panel_joins_without_condition() {
        let mut composite = composite(vec![
            leaf("A", &[]),
            leaf("B", &[]),
            formula("F1", "A / B"),
        ]);
        composite.panel_type = PanelType::Table;
        let text = compile_formula(
            &composite.builder_queries["F1"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap();

        assert!(text.starts_with("SELECT A.value / B.value as value FROM "));
        assert!(!text.contains(" ON "));
    }

    #[test]
    fn test_three_query_chain_has_two_joins() {
        let composite = composite(vec![
            leaf("A", &[]),
            leaf("B", &[]),
            leaf("C", &[]),
            formula("F4", "A * B * C"),
        ]);
        let text = compile_formula(
            &composite.builder_queries["F4"],
            &composite,
            &compiled(&["A", "B", "C"]),
            &MathFunctions::default(),
        )
        .unwrap();

        assert!(text.contains("A.value * B.value * C.value as value"));
        assert_eq!(text.matches(" ON ").count(), 2);
        // Chain joins adjacent queries, left-deep.
        assert!(text.contains("ON B.`ts` = C.`ts`"));
    }

    #[test]
    fn test_self_reference_joins_nothing() {
        let composite = composite(vec![leaf("A", &[]), formula("F3", "A * A")]);
        let text = compile_formula(
            &composite.builder_queries["F3"],
            &composite,
            &compiled(&["A"]),
            &MathFunctions::default(),
        )
        .unwrap();
        assert!(!text.contains(" ON "));
        assert!(text.contains("A.value * A.value as value"));
    }

    #[test]
    fn test_parentheses_preserved() {
        let composite = composite(vec![
            leaf("A", &[]),
            leaf("B", &[]),
            formula("F5", "((A - B) / B) * 100"),
        ]);
        let text = compile_formula(
            &composite.builder_queries["F5"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap();
        assert!(text.contains("((A.value - B.value) / B.value) * 100 as value"));
    }

    #[test]
    fn test_function_call_accepted_syntactically() {
        let composite = composite(vec![leaf("A", &[]), formula("F", "log2(A) + 1")]);
        let text = compile_formula(
            &composite.builder_queries["F"],
            &composite,
            &compiled(&["A"]),
            &MathFunctions::default(),
        )
        .unwrap();
        assert!(text.contains("log2(A.value) + 1 as value"));
    }

    #[test]
    fn test_unknown_function_rejected() {
        let composite = composite(vec![leaf("A", &[]), formula("F", "median(A)")]);
        let err = compile_formula(
            &composite.builder_queries["F"],
            &composite,
            &compiled(&["A"]),
            &MathFunctions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::UnknownFunction { name } if name == "median"));
    }

    #[test]
    fn test_custom_vocabulary() {
        let functions = MathFunctions::new(["median"]);
        let composite = composite(vec![leaf("A", &[]), formula("F", "median(A)")]);
        assert!(
            compile_formula(
                &composite.builder_queries["F"],
                &composite,
                &compiled(&["A"]),
                &functions,
            )
            .is_ok()
        );
    }

    #[test]
    fn test_group_by_mismatch() {
        let composite = composite(vec![
            leaf("A", &["service_name"]),
            leaf("B", &["operation"]),
            formula("F", "A + B"),
        ]);
        let err = compile_formula(
            &composite.builder_queries["F"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::GroupByMismatch { .. }));
        assert!(err.to_string().contains("group by must be same"));
    }

    #[test]
    fn test_unknown_variable() {
        let composite = composite(vec![leaf("A", &[]), formula("F", "A + Z")]);
        let err = compile_formula(
            &composite.builder_queries["F"],
            &composite,
            &compiled(&["A"]),
            &MathFunctions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::UnknownVariable { name } if name == "Z"));
    }

    #[test]
    fn test_formula_over_formula_rejected() {
        let composite = composite(vec![
            leaf("A", &[]),
            leaf("B", &[]),
            formula("F1", "A + B"),
            formula("F2", "F1 * 2"),
        ]);
        let err = compile_formula(
            &composite.builder_queries["F2"],
            &composite,
            &compiled(&["A", "B"]),
            &MathFunctions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::FormulaOverFormula { name } if name == "F1"));
    }

    #[test]
    fn test_malformed_formula() {
        assert!(parse_formula("A +").is_err());
        assert!(parse_formula("A + B garbage here").is_err());
    }

    #[test]
    fn test_constant_only_formula_rejected() {
        let composite = composite(vec![leaf("A", &[]), formula("F", "2 + 2")]);
        let err = compile_formula(
            &composite.builder_queries["F"],
            &composite,
            &compiled(&["A"]),
            &MathFunctions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompilerError::MalformedFormula { .. }));
    }
}
