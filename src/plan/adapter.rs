//! # Query Adapter
//!
//! Configures allow-lists and defaults, then compiles a [`QuerySpec`] onto a
//! [`QueryBuilder`] in two phases:
//!
//! 1. **validate**: filter keys and sort names are checked against their
//!    allow-lists. Nothing touches the query until this passes.
//! 2. **build**: filters, free-text search, sorts, includes and pagination
//!    are applied in that order. An operation failure stops the build and
//!    leaves earlier stages applied.
//!
//! ```ignore
//! let mut adapter = QueryAdapter::new()
//!     .allowed_filters(vec![AllowedFilter::from("status"), AllowedFilter::exact("is_completed")])
//!     .allowed_sorts(vec![AllowedSort::from("created_at")])
//!     .default_sort(SortDirective::desc("created_at"));
//!
//! let mut query = SelectQuery::new("users");
//! adapter.execute_on_url(&mut query, "/users?filter[status]=open&page=2&size=10")?;
//! ```

use tracing::debug;

use crate::spec::{QuerySpec, SortDirective};

use super::allow::{validate_filters, validate_sorts, AllowList};
use super::errors::PlanResult;
use super::filters::{apply_filters, apply_search, AllowedFilter};
use super::includes::apply_includes;
use super::pagination::{apply_pagination, PageDefaults};
use super::query::QueryBuilder;
use super::sorts::{apply_sorts, AllowedSort};

/// Builder-style query compiler.
///
/// Cheap to clone: operations inside allow-lists are shared. Use one
/// adapter per request; the relationship registry is overwritten by every
/// call to [`execute`](Self::execute).
#[derive(Debug, Clone, Default)]
pub struct QueryAdapter {
    filters: AllowList<AllowedFilter>,
    sorts: AllowList<AllowedSort>,
    includes: AllowList<String>,
    default_sort: Option<SortDirective>,
    pagination: Option<PageDefaults>,
    relationships: Vec<String>,
}

impl QueryAdapter {
    /// An adapter with every allow-list empty (unrestricted)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict which filters may be applied
    pub fn allowed_filters(mut self, filters: impl Into<AllowList<AllowedFilter>>) -> Self {
        self.filters = filters.into();
        self
    }

    /// Restrict which sorts may be applied
    pub fn allowed_sorts(mut self, sorts: impl Into<AllowList<AllowedSort>>) -> Self {
        self.sorts = sorts.into();
        self
    }

    /// Restrict which relations may be included
    pub fn allowed_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = AllowList::new(includes.into_iter().map(Into::into).collect());
        self
    }

    /// Sort applied when the request supplies none
    pub fn default_sort(mut self, sort: SortDirective) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Paginate every request, filling in missing page/size
    pub fn default_pagination(mut self, page: i64, size: i64) -> Self {
        self.pagination = Some(PageDefaults { page, size });
        self
    }

    pub(crate) fn with_pagination(mut self, defaults: Option<PageDefaults>) -> Self {
        self.pagination = defaults;
        self
    }

    /// Normalized names of the relations loaded by the last execution
    pub fn relationships(&self) -> &[String] {
        &self.relationships
    }

    /// Parse `url` and compile it onto `query`
    pub fn execute_on_url<Q: QueryBuilder>(&mut self, query: &mut Q, url: &str) -> PlanResult<QuerySpec> {
        let mut spec = QuerySpec::parse_url(url)?;
        self.execute(query, &mut spec)?;
        Ok(spec)
    }

    /// Validate `spec`, then compile it onto `query`.
    ///
    /// Defaults (sort, page, size) that end up applied are written back into
    /// `spec`.
    pub fn execute<Q: QueryBuilder>(&mut self, query: &mut Q, spec: &mut QuerySpec) -> PlanResult<()> {
        self.relationships.clear();
        self.validate(spec)?;
        self.build(query, spec)
    }

    /// Like [`execute`](Self::execute), with pagination forced on using
    /// page 1 / size 30 unless other defaults were configured.
    pub fn paginate<Q: QueryBuilder>(&mut self, query: &mut Q, spec: &mut QuerySpec) -> PlanResult<()> {
        if self.pagination.is_none() {
            self.pagination = Some(PageDefaults::default());
        }
        self.execute(query, spec)
    }

    /// Check the specification against every allow-list
    pub fn validate(&self, spec: &QuerySpec) -> PlanResult<()> {
        validate_filters(spec, &self.filters)?;
        validate_sorts(spec, &self.sorts)?;
        Ok(())
    }

    fn build<Q: QueryBuilder>(&mut self, query: &mut Q, spec: &mut QuerySpec) -> PlanResult<()> {
        apply_filters(query, spec, &self.filters)?;
        apply_search(query, spec, &self.filters)?;
        apply_sorts(query, spec, &self.sorts, self.default_sort.as_ref())?;
        apply_includes(query, spec, &self.includes, &mut self.relationships)?;
        apply_pagination(query, spec, self.pagination)?;

        debug!(
            filters = spec.filters.len(),
            sorts = spec.sort.len(),
            relationships = self.relationships.len(),
            "query plan built"
        );
        Ok(())
    }
}
