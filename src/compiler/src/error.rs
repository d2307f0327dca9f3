//! Compiler error types

use thiserror::Error;

/// Result type for compilation operations
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors that abort a compilation.
///
/// Every variant is a hard error: no partial mapping or partial expression is
/// ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// Value shape that has no literal rendering in the active dialect
    #[error("cannot format value: {reason}")]
    UnsupportedValue {
        /// What made the value unrenderable
        reason: String,
    },

    /// Value-requiring filter operator without a value
    #[error("operator '{operator}' requires a value")]
    MissingValue {
        /// Wire spelling of the operator
        operator: &'static str,
    },

    /// Formula text the parser rejects or a construct outside the
    /// arithmetic-over-query-names vocabulary
    #[error("malformed formula '{formula}': {reason}")]
    MalformedFormula { formula: String, reason: String },

    /// Function name outside the registered math vocabulary
    #[error("unknown function '{name}' in formula")]
    UnknownFunction { name: String },

    /// Formula variable that names no builder query
    #[error("formula references unknown query '{name}'")]
    UnknownVariable { name: String },

    /// Formula variable that names another formula; only leaf queries can be
    /// referenced
    #[error("formula references '{name}', which is itself a formula")]
    FormulaOverFormula { name: String },

    /// Formula operands with differing group-by dimension lists
    #[error("group by must be same: '{left}' and '{right}' differ")]
    GroupByMismatch { left: String, right: String },

    /// Error surfaced by an injected per-datasource strategy
    #[error("failed to build {data_source} query '{query_name}': {message}")]
    Strategy {
        data_source: &'static str,
        query_name: String,
        message: String,
    },
}

impl CompilerError {
    pub fn unsupported_value(reason: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            reason: reason.into(),
        }
    }

    pub fn malformed_formula(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFormula {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    pub fn strategy(
        data_source: &'static str,
        query_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Strategy {
            data_source,
            query_name: query_name.into(),
            message: message.into(),
        }
    }
}
