//! Position-list filtering: criteria, search requests and the filter state store.

pub mod criteria;
pub mod search;
pub mod store;

pub use criteria::{CompareOp, Comparison, FilterError, PositionFilter};
pub use search::{Pagination, SearchRequest, SearchResponse, Sort, SortField, SortOrder};
pub use store::FilterStore;
