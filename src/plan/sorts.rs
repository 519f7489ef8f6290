//! # Sort Plan Builder
//!
//! Compiles sort directives into ordering instructions.
//!
//! Plain-name matches are collected into one shared column list, emitted
//! after every directive has been visited. Operations order the query
//! themselves as soon as their directive is reached, so their orderings come
//! before the shared list.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::spec::{QuerySpec, SortDirective};

use super::allow::{AllowEntry, AllowList};
use super::errors::PlanResult;
use super::query::{Order, QueryBuilder};

/// A sort handler bound to one or more names
pub trait SortOperation: Send + Sync {
    /// Sort names this operation handles
    fn names(&self) -> &[String];

    /// Order the query for one directive
    fn apply(&self, query: &mut dyn QueryBuilder, ascending: bool, name: &str) -> PlanResult<()>;
}

type SortFn = dyn Fn(&mut dyn QueryBuilder, bool, &str) -> PlanResult<()> + Send + Sync;

/// Caller-supplied sort handler
pub struct CustomSort {
    names: Vec<String>,
    handler: Box<SortFn>,
}

impl CustomSort {
    pub fn new<I, S, F>(names: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut dyn QueryBuilder, bool, &str) -> PlanResult<()> + Send + Sync + 'static,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            handler: Box::new(handler),
        }
    }
}

impl SortOperation for CustomSort {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn apply(&self, query: &mut dyn QueryBuilder, ascending: bool, name: &str) -> PlanResult<()> {
        (self.handler)(query, ascending, name)
    }
}

impl fmt::Debug for CustomSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSort").field("names", &self.names).finish()
    }
}

/// Entry of a sort allow-list
#[derive(Clone)]
pub enum AllowedSort {
    /// Column ordered directly
    Name(String),

    /// Operation invoked for the names it declares
    Operation(Arc<dyn SortOperation>),
}

impl AllowedSort {
    pub fn name(column: impl Into<String>) -> Self {
        AllowedSort::Name(column.into())
    }

    pub fn custom<I, S, F>(names: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut dyn QueryBuilder, bool, &str) -> PlanResult<()> + Send + Sync + 'static,
    {
        Self::operation(CustomSort::new(names, handler))
    }

    pub fn operation(op: impl SortOperation + 'static) -> Self {
        AllowedSort::Operation(Arc::new(op))
    }
}

impl AllowEntry for AllowedSort {
    fn declared_names(&self) -> Vec<&str> {
        match self {
            AllowedSort::Name(name) => vec![name.as_str()],
            AllowedSort::Operation(op) => op.names().iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for AllowedSort {
    fn from(column: &str) -> Self {
        AllowedSort::Name(column.to_string())
    }
}

impl From<String> for AllowedSort {
    fn from(column: String) -> Self {
        AllowedSort::Name(column)
    }
}

impl fmt::Debug for AllowedSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowedSort::Name(name) => f.debug_tuple("Name").field(name).finish(),
            AllowedSort::Operation(op) => f.debug_tuple("Operation").field(&op.names()).finish(),
        }
    }
}

/// Compile the sort directives, falling back to `default_sort` when the
/// request names none. The fallback is written back into `spec`.
///
/// Input is assumed validated: unknown names in restricted mode are
/// skipped, not rejected.
pub fn apply_sorts(
    query: &mut dyn QueryBuilder,
    spec: &mut QuerySpec,
    allow: &AllowList<AllowedSort>,
    default_sort: Option<&SortDirective>,
) -> PlanResult<()> {
    if spec.sort.is_empty() {
        if let Some(default) = default_sort {
            debug!(sort = %default.name, ascending = default.ascending, "applying default sort");
            spec.sort.push(default.clone());
        }
    }

    if allow.is_empty() {
        if !spec.sort.is_empty() {
            query.order_by(Order::Columns(spec.sort.clone()))?;
        }
        return Ok(());
    }

    let mut columns = Vec::new();
    for directive in &spec.sort {
        for entry in allow.entries() {
            match entry {
                AllowedSort::Name(name) if *name == directive.name => {
                    columns.push(directive.clone());
                }
                AllowedSort::Operation(op) if op.names().contains(&directive.name) => {
                    op.apply(query, directive.ascending, &directive.name)?;
                }
                _ => {}
            }
        }
    }

    if !columns.is_empty() {
        query.order_by(Order::Columns(columns))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::query::SelectQuery;
    use crate::plan::PlanError;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn spec(url: &str) -> QuerySpec {
        QuerySpec::parse_url(url).unwrap()
    }

    fn name_length() -> AllowedSort {
        AllowedSort::custom(["name_length"], |query, ascending, name| {
            let direction = if ascending { "ASC" } else { "DESC" };
            if name == "name_length" {
                query.order_by(Order::raw(format!("LENGTH(name) {}", direction)))?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_unrestricted_single_clause() {
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=name,-age");

        apply_sorts(&mut query, &mut spec, &AllowList::unrestricted(), None).unwrap();

        assert_eq!(query.orders.len(), 1);
        assert!(query.to_sql().ends_with("ORDER BY `name` ASC, `age` DESC"));
    }

    #[test]
    fn test_no_sort_no_order() {
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/");
        apply_sorts(&mut query, &mut spec, &AllowList::unrestricted(), None).unwrap();
        assert!(query.orders.is_empty());
    }

    #[test]
    fn test_allowed_ascending_sort() {
        let allow: AllowList<AllowedSort> =
            vec![AllowedSort::from("created_at"), AllowedSort::from("id")].into();
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=created_at");

        apply_sorts(&mut query, &mut spec, &allow, None).unwrap();
        assert!(query.to_sql().contains("ORDER BY `created_at` ASC"));
    }

    #[test]
    fn test_default_sort_is_written_back() {
        let allow: AllowList<AllowedSort> =
            vec![AllowedSort::from("created_at"), AllowedSort::from("id")].into();
        let default = SortDirective::asc("created_at");
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/");

        apply_sorts(&mut query, &mut spec, &allow, Some(&default)).unwrap();

        assert_eq!(spec.sort, vec![default]);
        assert!(query.to_sql().contains("ORDER BY `created_at` ASC"));
    }

    #[test]
    fn test_default_sort_ignored_when_request_sorts() {
        let default = SortDirective::asc("created_at");
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=-id");

        apply_sorts(&mut query, &mut spec, &AllowList::unrestricted(), Some(&default)).unwrap();
        assert_eq!(spec.sort, vec![SortDirective::desc("id")]);
    }

    #[test]
    fn test_custom_sort_receives_direction() {
        let seen_descending = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&seen_descending);
        let allow: AllowList<AllowedSort> = vec![AllowedSort::custom(
            ["name_length"],
            move |_, ascending, _| {
                flag.store(!ascending, Ordering::SeqCst);
                Ok(())
            },
        )]
        .into();

        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=-name_length");
        apply_sorts(&mut query, &mut spec, &allow, None).unwrap();

        assert!(seen_descending.load(Ordering::SeqCst));
    }

    #[test]
    fn test_custom_sort_orders_query() {
        let allow: AllowList<AllowedSort> = vec![AllowedSort::from("created_at"), name_length()].into();
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=-name_length");

        apply_sorts(&mut query, &mut spec, &allow, None).unwrap();
        assert!(query.to_sql().ends_with("ORDER BY LENGTH(name) DESC"));
    }

    #[test]
    fn test_custom_sort_precedes_shared_clause() {
        let allow: AllowList<AllowedSort> = vec![AllowedSort::from("created_at"), name_length()].into();
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=created_at,-name_length");

        apply_sorts(&mut query, &mut spec, &allow, None).unwrap();
        assert!(query
            .to_sql()
            .ends_with("ORDER BY LENGTH(name) DESC, `created_at` ASC"));
    }

    #[test]
    fn test_custom_sort_error_propagates() {
        let allow: AllowList<AllowedSort> =
            vec![AllowedSort::custom(["broken"], |_, _, _| Err(PlanError::operation("no index")))].into();
        let mut query = SelectQuery::new("users");
        let mut spec = spec("/?sort=broken");

        let err = apply_sorts(&mut query, &mut spec, &allow, None).unwrap_err();
        assert_eq!(err, PlanError::operation("no index"));
        assert!(query.orders.is_empty());
    }
}
