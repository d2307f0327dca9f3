//! Composite query and filter-expression compilation
//!
//! Turns the declarative query model from `common` into two kinds of text:
//!
//! - backend query text, one entry per builder query, with formula queries
//!   synthesized as equi-joins over their referenced sub-queries, and
//! - boolean expression text for the embedded expression engine used by
//!   per-record routing and filtering.
//!
//! Everything here is pure and synchronous; callers own execution of the
//! generated text. The one exception to immutability is
//! [`apply_having`], which removes disqualified points from executed result
//! series in place.

mod error;
mod filter;
mod format;
mod formula;
mod having;
mod query;

pub use error::{CompilerError, Result};
pub use filter::compile_filter;
pub use format::{Dialect, format_value};
pub use formula::MathFunctions;
pub use having::apply_having;
pub use query::{QueryBuilder, QueryStrategies, QueryStrategy};
