//! # Query Plan
//!
//! Validates a [`QuerySpec`](crate::spec::QuerySpec) against allow-lists and
//! compiles it onto an abstract [`QueryBuilder`].
//!
//! Stages, in the order the adapter runs them:
//! - allow-list validation (filters, then sorts)
//! - filters and free-text search
//! - sorts, with an optional default
//! - includes (eager loads)
//! - pagination

mod adapter;
mod allow;
mod errors;
mod filters;
mod includes;
mod pagination;
pub mod query;
mod sorts;

pub use adapter::QueryAdapter;
pub use allow::{validate_filters, validate_sorts, AllowEntry, AllowList};
pub use errors::{ErrorResponse, PlanError, PlanResult};
pub use filters::{
    apply_filters, apply_search, AllowedFilter, CustomFilter, ExactFilter, FilterOperation,
    SearchFilter,
};
pub use includes::{apply_includes, normalize_include_name};
pub use pagination::{apply_pagination, PageDefaults, DEFAULT_PAGE, DEFAULT_SIZE};
pub use query::{Condition, Operator, Order, Predicate, QueryBuilder, SelectQuery};
pub use sorts::{apply_sorts, AllowedSort, CustomSort, SortOperation};
