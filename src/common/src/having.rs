//! Having clause model
//!
//! A having clause is a post-execution numeric predicate applied to computed
//! series points. In/not-in spellings are accepted case-insensitively.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HavingOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    In,
    NotIn,
}

impl HavingOperator {
    /// Canonical wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEq => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEq => "<=",
            Self::In => "in",
            Self::NotIn => "nin",
        }
    }
}

impl FromStr for HavingOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "=" | "eq" => Self::Equal,
            "!=" | "neq" => Self::NotEqual,
            ">" | "gt" => Self::GreaterThan,
            ">=" | "gte" => Self::GreaterThanOrEq,
            "<" | "lt" => Self::LessThan,
            "<=" | "lte" => Self::LessThanOrEq,
            // Membership operators arrive in a variety of casings.
            _ => match s.to_ascii_lowercase().as_str() {
                "in" => Self::In,
                "nin" | "not_in" => Self::NotIn,
                _ => return Err(format!("unknown having operator '{s}'")),
            },
        };
        Ok(op)
    }
}

impl Serialize for HavingOperator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HavingOperator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let spelling = String::deserialize(deserializer)?;
        spelling.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HavingClause {
    #[serde(rename = "op")]
    pub operator: HavingOperator,
    pub value: Value,
}

impl HavingClause {
    pub fn new(operator: HavingOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}
