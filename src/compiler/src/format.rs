//! Literal formatting for the two output dialects
//!
//! One rule set, two quoting conventions: backend query text single-quotes
//! strings, the embedded expression engine double-quotes them. Arrays must be
//! homogeneous families of scalars; anything else is a hard error rather than
//! an empty literal silently embedded into generated text.

use common::{Value, value::ValueKind};

use crate::error::{CompilerError, Result};

/// Target syntax for a rendered literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Backend query text: single-quoted strings
    QueryText,
    /// Embedded expression engine: double-quoted strings
    Expression,
}

/// Render a value as a literal in the given dialect.
///
/// An empty array renders as empty text; callers that would embed the result
/// must treat that as unusable (see the filter compiler).
pub fn format_value(value: &Value, dialect: Dialect) -> Result<String> {
    match value {
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(format!("{f:.6}")),
        Value::Bool(b) => Ok(b.to_string()),
        Value::String(s) => Ok(quote(s, dialect)),
        Value::Array(items) => format_array(items, dialect),
    }
}

fn quote(s: &str, dialect: Dialect) -> String {
    // Backslashes are escaped before quotes so the quote escapes are not
    // themselves double-escaped.
    match dialect {
        Dialect::QueryText => {
            format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        Dialect::Expression => {
            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
        }
    }
}

fn format_array(items: &[Value], dialect: Dialect) -> Result<String> {
    let Some(first) = items.first() else {
        return Ok(String::new());
    };

    let kind = first.kind();
    if kind == ValueKind::Array {
        return Err(CompilerError::unsupported_value(
            "nested arrays have no literal form",
        ));
    }

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        if item.kind() != kind {
            return Err(CompilerError::unsupported_value(format!(
                "array mixes {:?} and {:?} elements",
                kind,
                item.kind()
            )));
        }
        parts.push(format_value(item, dialect)?);
    }

    Ok(format!("[{}]", parts.join(",")))
}
