//! Composite query compilation
//!
//! Two passes over the builder queries: leaves first, dispatched to the
//! injected per-datasource strategy; formulas second, synthesized as join
//! chains over the leaf text. Any error aborts the whole compilation.

use std::collections::BTreeMap;

use common::{BuilderQuery, DataSource, PanelType, QueryRangeRequest, QueryType, TimeRange};

use crate::error::Result;
use crate::formula::{self, MathFunctions};

/// Converts one leaf builder query plus the global time range into complete
/// backend query text. One strategy per datasource is injected at
/// construction; strategies for traces, logs and metrics live with their
/// respective schemas, outside this crate.
pub trait QueryStrategy: Send + Sync {
    fn build(
        &self,
        range: TimeRange,
        query_type: QueryType,
        panel_type: PanelType,
        query: &BuilderQuery,
    ) -> Result<String>;
}

impl<F> QueryStrategy for F
where
    F: Fn(TimeRange, QueryType, PanelType, &BuilderQuery) -> Result<String> + Send + Sync,
{
    fn build(
        &self,
        range: TimeRange,
        query_type: QueryType,
        panel_type: PanelType,
        query: &BuilderQuery,
    ) -> Result<String> {
        self(range, query_type, panel_type, query)
    }
}

/// The three per-datasource strategies a [`QueryBuilder`] dispatches to.
pub struct QueryStrategies {
    pub traces: Box<dyn QueryStrategy>,
    pub logs: Box<dyn QueryStrategy>,
    pub metrics: Box<dyn QueryStrategy>,
}

/// Compiles composite queries into a name → query text mapping.
///
/// Stateless apart from its injected configuration; safe to share across
/// concurrent requests.
pub struct QueryBuilder {
    strategies: QueryStrategies,
    math_functions: MathFunctions,
}

impl QueryBuilder {
    pub fn new(strategies: QueryStrategies) -> Self {
        Self {
            strategies,
            math_functions: MathFunctions::default(),
        }
    }

    /// Replace the formula function vocabulary, e.g. for a backend dialect
    /// with a different math set.
    pub fn with_math_functions(mut self, math_functions: MathFunctions) -> Self {
        self.math_functions = math_functions;
        self
    }

    /// Compile every builder query in the request.
    ///
    /// Returns one entry per enabled query, formulas included. Disabled
    /// queries are compiled (formulas may reference them) but dropped from
    /// the mapping.
    pub fn prepare_queries(&self, request: &QueryRangeRequest) -> Result<BTreeMap<String, String>> {
        let composite = &request.composite_query;
        let range = request.range();
        let mut queries = BTreeMap::new();

        for (name, query) in &composite.builder_queries {
            if query.is_leaf() {
                let strategy = self.strategy_for(query.data_source);
                let text =
                    strategy.build(range, composite.query_type, composite.panel_type, query)?;
                tracing::debug!(query_name = %name, data_source = %query.data_source.as_str(), "compiled leaf query");
                queries.insert(name.clone(), text);
            }
        }

        for (name, query) in &composite.builder_queries {
            if !query.is_leaf() {
                let text =
                    formula::compile_formula(query, composite, &queries, &self.math_functions)?;
                queries.insert(name.clone(), text);
            }
        }

        queries.retain(|name, _| {
            composite
                .builder_queries
                .get(name)
                .is_none_or(|query| !query.disabled)
        });

        Ok(queries)
    }

    fn strategy_for(&self, data_source: DataSource) -> &dyn QueryStrategy {
        match data_source {
            DataSource::Traces => self.strategies.traces.as_ref(),
            DataSource::Logs => self.strategies.logs.as_ref(),
            DataSource::Metrics => self.strategies.metrics.as_ref(),
        }
    }
}
