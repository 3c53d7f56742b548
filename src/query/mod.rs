//! The query engine: criteria, the two filter evaluators, sorting and pagination.

mod compile;
mod filter;
mod normalize;
mod paginate;
mod sort;
mod types;

pub use compile::{Fragment, Predicate, SqlParam, compile, order_by};
pub use filter::{Clause, filter_records, matches, matches_all};
pub use normalize::{PagingPolicy, RawQuery};
pub use paginate::{Page, paginate};
pub use sort::{SortKey, sort_records};
pub use types::{
    AgeBucket, Categorical, DateWindow, FilterCriteria, FilterCriteriaBuilder, Order, PageRequest,
    PageResult, Pagination, Query, SortField, SortMode, SortSpec,
};
