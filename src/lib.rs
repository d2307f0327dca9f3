//! signalquery — composite query and filter-expression compilation
//!
//! Library core that turns declarative, datasource-agnostic query and filter
//! descriptions into backend query text and boolean expression text. The
//! surrounding service owns parsing, execution, caching and rendering; this
//! crate is a pure text compiler.

pub use common;
pub use compiler;

pub use common::{
    AttributeKey, AttributeType, BuilderQuery, CompositeQuery, DataSource, FilterCombinator,
    FilterItem, FilterOperator, FilterSet, HavingClause, HavingOperator, PanelType, Point,
    QueryRangeRequest, QueryResult, QueryType, Series, TimeRange, Value,
};
pub use compiler::{
    CompilerError, Dialect, MathFunctions, QueryBuilder, QueryStrategies, QueryStrategy,
    apply_having, compile_filter, format_value,
};
