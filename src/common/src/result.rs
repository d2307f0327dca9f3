//! Executed-result model
//!
//! Shape of the series an execution layer hands back for post-processing.
//! The compiler core only touches these in the having post-filter, which
//! removes disqualified points in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub timestamp_ms: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl Series {
    /// Series with the given values and synthetic step timestamps, for tests
    /// and fixtures.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            labels: BTreeMap::new(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| Point {
                    timestamp_ms: i as i64 * 60_000,
                    value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query_name: String,
    #[serde(default)]
    pub series: Vec<Series>,
}
