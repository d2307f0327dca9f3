//! Builder query and composite query model
//!
//! A composite query is a set of named builder queries evaluated together. A
//! query whose expression equals its own name is a leaf and compiles through
//! a per-datasource strategy; any other expression is an arithmetic formula
//! over the names of leaf queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeKey;
use crate::filter::FilterSet;
use crate::having::HavingClause;

/// Telemetry signal a builder query reads from.
///
/// Closed enumeration: unknown datasources are rejected when the request is
/// deserialized, before any compilation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Traces,
    Logs,
    Metrics,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Traces => "traces",
            DataSource::Logs => "logs",
            DataSource::Metrics => "metrics",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    #[default]
    Builder,
    Sql,
    Promql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelType {
    #[default]
    Graph,
    Table,
    Value,
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderQuery {
    pub query_name: String,
    /// Equals `query_name` for a leaf query; otherwise an arithmetic formula
    /// referencing other query names.
    pub expression: String,
    pub data_source: DataSource,
    #[serde(default)]
    pub step_interval: i64,
    #[serde(default)]
    pub group_by: Vec<AttributeKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    #[serde(default)]
    pub having: Vec<HavingClause>,
    #[serde(default)]
    pub legend: String,
    /// Disabled queries are still compiled (formulas may reference them) but
    /// are removed from the returned mapping.
    #[serde(default)]
    pub disabled: bool,
}

impl BuilderQuery {
    pub fn is_leaf(&self) -> bool {
        self.expression == self.query_name
    }

    /// The ordered group-by key names, used for formula join compatibility.
    pub fn group_keys(&self) -> Vec<&str> {
        self.group_by.iter().map(|key| key.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeQuery {
    #[serde(default)]
    pub query_type: QueryType,
    #[serde(default)]
    pub panel_type: PanelType,
    /// Keyed by query name; BTreeMap keeps compilation order deterministic.
    pub builder_queries: BTreeMap<String, BuilderQuery>,
}

/// Global time range and step shared by every query in one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
    pub step_s: i64,
}

/// One compilation request: the composite query plus its time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRangeRequest {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub step: i64,
    pub composite_query: CompositeQuery,
}

impl QueryRangeRequest {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start_ms: self.start,
            end_ms: self.end,
            step_s: self.step,
        }
    }
}
