//! Filter model
//!
//! A filter set is a flat list of items combined by a single AND/OR
//! combinator; this model does not support nested groups. Operators are a
//! closed enumeration validated when the request is deserialized, so the
//! compilers never re-check operator strings on the hot path.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeKey;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=", alias = "eq")]
    Equal,
    #[serde(rename = "!=", alias = "neq")]
    NotEqual,
    #[serde(rename = "<", alias = "lt")]
    LessThan,
    #[serde(rename = "<=", alias = "lte")]
    LessThanOrEq,
    #[serde(rename = ">", alias = "gt")]
    GreaterThan,
    #[serde(rename = ">=", alias = "gte")]
    GreaterThanOrEq,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "ncontains")]
    NotContains,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "nregex")]
    NotRegex,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "nin")]
    NotIn,
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "nexists")]
    NotExists,
}

impl FilterOperator {
    /// Wire spelling of the operator as it appears in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEq => "<=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEq => ">=",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "ncontains",
            FilterOperator::Regex => "regex",
            FilterOperator::NotRegex => "nregex",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "nin",
            FilterOperator::Exists => "exists",
            FilterOperator::NotExists => "nexists",
        }
    }

    /// Existence operators test key membership in a container, never a value.
    pub fn is_existence(&self) -> bool {
        matches!(self, FilterOperator::Exists | FilterOperator::NotExists)
    }

    /// Membership operators compare against an array literal.
    pub fn is_membership(&self) -> bool {
        matches!(self, FilterOperator::In | FilterOperator::NotIn)
    }
}

/// How the items of one filter set combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterCombinator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub key: AttributeKey,
    #[serde(rename = "op")]
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl FilterItem {
    pub fn new(key: AttributeKey, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            key,
            operator,
            value: Some(value.into()),
        }
    }

    /// Item without a value, for exists/nexists.
    pub fn existence(key: AttributeKey, operator: FilterOperator) -> Self {
        Self {
            key,
            operator,
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(rename = "op", default)]
    pub operator: FilterCombinator,
    #[serde(default)]
    pub items: Vec<FilterItem>,
}

impl FilterSet {
    pub fn and(items: Vec<FilterItem>) -> Self {
        Self {
            operator: FilterCombinator::And,
            items,
        }
    }

    pub fn or(items: Vec<FilterItem>) -> Self {
        Self {
            operator: FilterCombinator::Or,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_filter_set() {
        let set: FilterSet = serde_json::from_str(
            r#"{
                "op": "AND",
                "items": [
                    {"key": {"key": "service_name", "type": "tag"}, "op": "=", "value": "api"},
                    {"key": {"key": "env", "type": "resource"}, "op": "in", "value": ["prod", "staging"]},
                    {"key": {"key": "user_id", "type": "tag"}, "op": "exists"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(set.operator, FilterCombinator::And);
        assert_eq!(set.items.len(), 3);
        assert_eq!(set.items[0].operator, FilterOperator::Equal);
        assert_eq!(set.items[1].operator, FilterOperator::In);
        assert!(set.items[2].value.is_none());
    }

    #[test]
    fn test_unknown_operator_rejected_at_parse() {
        let result = serde_json::from_str::<FilterSet>(
            r#"{"op": "AND", "items": [{"key": {"key": "k"}, "op": "between", "value": 1}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_operator_families() {
        assert!(FilterOperator::Exists.is_existence());
        assert!(FilterOperator::NotExists.is_existence());
        assert!(FilterOperator::In.is_membership());
        assert!(!FilterOperator::Equal.is_existence());
        assert!(!FilterOperator::Contains.is_membership());
    }
}
