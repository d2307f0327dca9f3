pub mod attribute;
pub mod filter;
pub mod having;
pub mod query;
pub mod result;
pub mod value;

pub use attribute::{AttributeDataType, AttributeKey, AttributeType};
pub use filter::{FilterCombinator, FilterItem, FilterOperator, FilterSet};
pub use having::{HavingClause, HavingOperator};
pub use query::{
    BuilderQuery, CompositeQuery, DataSource, PanelType, QueryRangeRequest, QueryType, TimeRange,
};
pub use result::{Point, QueryResult, Series};
pub use value::Value;
