//! # Filter Plan Builder
//!
//! Compiles `filter[<name>]` values and the free-text `q` parameter into
//! predicates.
//!
//! In unrestricted mode every filter becomes a substring search on the
//! column of the same name. In restricted mode each supplied key is matched
//! against the allow-list in declared order, and every matching entry is
//! applied. A key declared both as a plain name and by an operation is
//! therefore compiled twice; callers rely on this to stack an exact match
//! with custom handling.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::spec::{FilterValue, QuerySpec};

use super::allow::{AllowEntry, AllowList};
use super::errors::PlanResult;
use super::query::{Predicate, QueryBuilder};

/// A filter handler bound to one or more keys
pub trait FilterOperation: Send + Sync {
    /// Filter keys this operation handles
    fn keys(&self) -> &[String];

    /// Apply the operation. Called once for each supplied key it declares.
    fn apply(&self, query: &mut dyn QueryBuilder, spec: &QuerySpec) -> PlanResult<()>;
}

/// `column = value`
#[derive(Debug, Clone)]
pub struct ExactFilter {
    column: String,
}

impl ExactFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FilterOperation for ExactFilter {
    fn keys(&self) -> &[String] {
        std::slice::from_ref(&self.column)
    }

    fn apply(&self, query: &mut dyn QueryBuilder, spec: &QuerySpec) -> PlanResult<()> {
        match spec.filters.get(&self.column) {
            Some(value) => query.add_predicate(Predicate::eq(&self.column, value.clone())),
            None => Ok(()),
        }
    }
}

/// `column LIKE '%value%'`
#[derive(Debug, Clone)]
pub struct SearchFilter {
    column: String,
}

impl SearchFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl FilterOperation for SearchFilter {
    fn keys(&self) -> &[String] {
        std::slice::from_ref(&self.column)
    }

    fn apply(&self, query: &mut dyn QueryBuilder, spec: &QuerySpec) -> PlanResult<()> {
        match spec.filters.get(&self.column) {
            Some(value) => query.add_predicate(Predicate::contains(&self.column, value)),
            None => Ok(()),
        }
    }
}

type FilterFn = dyn Fn(&mut dyn QueryBuilder, &QuerySpec) -> PlanResult<()> + Send + Sync;

/// Caller-supplied filter handler
pub struct CustomFilter {
    keys: Vec<String>,
    handler: Box<FilterFn>,
}

impl CustomFilter {
    pub fn new<I, S, F>(keys: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut dyn QueryBuilder, &QuerySpec) -> PlanResult<()> + Send + Sync + 'static,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            handler: Box::new(handler),
        }
    }
}

impl FilterOperation for CustomFilter {
    fn keys(&self) -> &[String] {
        &self.keys
    }

    fn apply(&self, query: &mut dyn QueryBuilder, spec: &QuerySpec) -> PlanResult<()> {
        (self.handler)(query, spec)
    }
}

impl fmt::Debug for CustomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFilter").field("keys", &self.keys).finish()
    }
}

/// Entry of a filter allow-list
#[derive(Clone)]
pub enum AllowedFilter {
    /// Column compiled with substring search
    Name(String),

    /// Operation invoked for the keys it declares
    Operation(Arc<dyn FilterOperation>),
}

impl AllowedFilter {
    pub fn name(column: impl Into<String>) -> Self {
        AllowedFilter::Name(column.into())
    }

    pub fn exact(column: impl Into<String>) -> Self {
        Self::operation(ExactFilter::new(column))
    }

    pub fn search(column: impl Into<String>) -> Self {
        Self::operation(SearchFilter::new(column))
    }

    pub fn custom<I, S, F>(keys: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut dyn QueryBuilder, &QuerySpec) -> PlanResult<()> + Send + Sync + 'static,
    {
        Self::operation(CustomFilter::new(keys, handler))
    }

    pub fn operation(op: impl FilterOperation + 'static) -> Self {
        AllowedFilter::Operation(Arc::new(op))
    }
}

impl AllowEntry for AllowedFilter {
    fn declared_names(&self) -> Vec<&str> {
        match self {
            AllowedFilter::Name(name) => vec![name.as_str()],
            AllowedFilter::Operation(op) => op.keys().iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for AllowedFilter {
    fn from(column: &str) -> Self {
        AllowedFilter::Name(column.to_string())
    }
}

impl From<String> for AllowedFilter {
    fn from(column: String) -> Self {
        AllowedFilter::Name(column)
    }
}

impl fmt::Debug for AllowedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedFilter::Name(name) => f.debug_tuple("Name").field(name).finish(),
            AllowedFilter::Operation(op) => f.debug_tuple("Operation").field(&op.keys()).finish(),
        }
    }
}

/// Compile every supplied filter.
///
/// The first operation error aborts the stage; predicates already added
/// stay on the query.
pub fn apply_filters(
    query: &mut dyn QueryBuilder,
    spec: &QuerySpec,
    allow: &AllowList<AllowedFilter>,
) -> PlanResult<()> {
    if allow.is_empty() {
        for key in spec.filters.keys() {
            SearchFilter::new(key.as_str()).apply(query, spec)?;
        }
        return Ok(());
    }

    for key in spec.filters.keys() {
        for entry in allow.entries() {
            match entry {
                AllowedFilter::Name(name) if name == key => {
                    SearchFilter::new(name.as_str()).apply(query, spec)?;
                }
                AllowedFilter::Operation(op) if op.keys().iter().any(|k| k == key) => {
                    debug!(filter = %key, "applying filter operation");
                    op.apply(query, spec)?;
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Compile the free-text query as an OR of substring matches over every
/// plain-name column in the allow-list.
///
/// Inactive in unrestricted mode, since there are no known columns to
/// search.
pub fn apply_search(
    query: &mut dyn QueryBuilder,
    spec: &QuerySpec,
    allow: &AllowList<AllowedFilter>,
) -> PlanResult<()> {
    let Some(text) = &spec.query else {
        return Ok(());
    };
    if allow.is_empty() {
        return Ok(());
    }

    let value = FilterValue::from(text.as_str());
    let group: Vec<Predicate> = allow
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            AllowedFilter::Name(name) => Some(Predicate::contains(name.as_str(), &value)),
            AllowedFilter::Operation(_) => None,
        })
        .collect();

    if group.is_empty() {
        return Ok(());
    }
    query.add_or_predicates(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::query::{Condition, Operator, SelectQuery};
    use crate::plan::PlanError;

    fn spec(url: &str) -> QuerySpec {
        QuerySpec::parse_url(url).unwrap()
    }

    #[test]
    fn test_unrestricted_filters_use_search() {
        let mut query = SelectQuery::new("users");
        apply_filters(&mut query, &spec("/?filter[name]=bob"), &AllowList::unrestricted()).unwrap();

        assert_eq!(
            query.conditions,
            vec![Condition::All(Predicate::new(
                "name",
                Operator::Like,
                FilterValue::from("%bob%")
            ))]
        );
    }

    #[test]
    fn test_plain_name_and_exact_filter() {
        let allow: AllowList<AllowedFilter> =
            vec![AllowedFilter::from("status"), AllowedFilter::exact("is_completed")].into();
        let mut query = SelectQuery::new("users");

        apply_filters(
            &mut query,
            &spec("/?filter[is_completed]=1&filter[status]=completed"),
            &allow,
        )
        .unwrap();

        let sql = query.to_sql();
        assert!(sql.contains("`is_completed` = 1"));
        assert!(sql.contains("`status` LIKE '%completed%'"));
    }

    #[test]
    fn test_search_filter_operation() {
        let allow: AllowList<AllowedFilter> = vec![AllowedFilter::search("title")].into();
        let mut query = SelectQuery::new("posts");

        apply_filters(&mut query, &spec("/?filter[title]=rust"), &allow).unwrap();
        assert!(query.to_sql().ends_with("WHERE `title` LIKE '%rust%'"));
    }

    #[test]
    fn test_plain_and_operation_on_same_key_both_apply() {
        let allow: AllowList<AllowedFilter> =
            vec![AllowedFilter::from("status"), AllowedFilter::exact("status")].into();
        let mut query = SelectQuery::new("users");

        apply_filters(&mut query, &spec("/?filter[status]=open"), &allow).unwrap();

        assert_eq!(query.conditions.len(), 2);
        assert_eq!(
            query.to_sql(),
            "SELECT * FROM `users` WHERE `status` LIKE '%open%' AND `status` = 'open'"
        );
    }

    #[test]
    fn test_custom_filter_sees_full_spec() {
        let allow: AllowList<AllowedFilter> = vec![AllowedFilter::custom(["age_min"], |query, spec| {
            let min = spec
                .filters
                .get("age_min")
                .and_then(|v| v.as_int())
                .ok_or_else(|| PlanError::operation("age_min must be an integer"))?;
            query.add_predicate(Predicate::eq("age", FilterValue::Int(min)))
        })]
        .into();

        let mut query = SelectQuery::new("users");
        apply_filters(&mut query, &spec("/?filter[age_min]=18"), &allow).unwrap();
        assert!(query.to_sql().ends_with("`age` = 18"));

        let mut query = SelectQuery::new("users");
        let err = apply_filters(&mut query, &spec("/?filter[age_min]=old"), &allow).unwrap_err();
        assert_eq!(err, PlanError::operation("age_min must be an integer"));
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_operation_error_keeps_earlier_predicates() {
        let allow: AllowList<AllowedFilter> = vec![
            AllowedFilter::from("a"),
            AllowedFilter::custom(["b"], |_, _| Err(PlanError::operation("nope"))),
        ]
        .into();
        let mut query = SelectQuery::new("t");

        let err = apply_filters(&mut query, &spec("/?filter[a]=1&filter[b]=2"), &allow).unwrap_err();
        assert_eq!(err, PlanError::operation("nope"));
        // `a` sorts before `b`, so its predicate was already added
        assert_eq!(query.conditions.len(), 1);
    }

    #[test]
    fn test_free_text_search_over_plain_names() {
        let allow: AllowList<AllowedFilter> = vec![
            AllowedFilter::from("name"),
            AllowedFilter::exact("is_completed"),
            AllowedFilter::from("email"),
        ]
        .into();
        let mut query = SelectQuery::new("users");

        apply_search(&mut query, &spec("/?q=al"), &allow).unwrap();
        assert_eq!(
            query.to_sql(),
            "SELECT * FROM `users` WHERE (`name` LIKE '%al%' OR `email` LIKE '%al%')"
        );
    }

    #[test]
    fn test_free_text_inactive_without_allow_list() {
        let mut query = SelectQuery::new("users");
        apply_search(&mut query, &spec("/?q=al"), &AllowList::unrestricted()).unwrap();
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_free_text_inactive_without_query() {
        let allow: AllowList<AllowedFilter> = vec![AllowedFilter::from("name")].into();
        let mut query = SelectQuery::new("users");
        apply_search(&mut query, &spec("/?page=1"), &allow).unwrap();
        assert!(query.conditions.is_empty());
    }

    #[test]
    fn test_debug_lists_keys() {
        let entry = AllowedFilter::exact("is_completed");
        assert_eq!(format!("{:?}", entry), "Operation([\"is_completed\"])");
    }
}
