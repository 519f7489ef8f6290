//! # Query Specification Parser
//!
//! Parses URL query parameters into a [`QuerySpec`].
//!
//! Recognized parameters:
//! - `q`: free-text query
//! - `page`, `size`: 1-based pagination
//! - `sort`: comma-separated columns, `-` prefix for descending
//! - `filter[<name>]`: one value per filter, the last occurrence wins
//! - `include`: comma-separated relation paths
//! - `fields[<name>]`: comma-separated, repeatable sparse field selection
//!
//! Parsing never fails for a well-formed URL. Malformed `page` / `size`
//! values are recorded in [`QuerySpec::errors`] and the field is left unset.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::debug;
use url::Url;

use super::errors::ParseError;
use super::sort::SortDirective;
use super::value::FilterValue;

/// Base used to resolve inputs that carry only a path and query string
const PLACEHOLDER_BASE: &str = "http://localhost/";

/// Canonical, typed view of one request's query parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuerySpec {
    /// Free-text query (`q`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Requested page, clamped to at least 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Requested page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Filter name to coerced value
    pub filters: BTreeMap<String, FilterValue>,

    /// Sort directives, primary key first
    pub sort: Vec<SortDirective>,

    /// Raw include paths as supplied
    pub includes: Vec<String>,

    /// Sparse field selection per resource type
    pub fields: BTreeMap<String, Vec<String>>,

    /// Field-level parse errors
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ParseError>,
}

impl QuerySpec {
    /// Parse the query string of a URL.
    ///
    /// Accepts absolute URLs as well as path-and-query inputs such as
    /// `/users?page=2` or `?page=2`. Only a malformed URL is an error.
    pub fn parse_url(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(PLACEHOLDER_BASE)?.join(raw)?;
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        Ok(Self::from_pairs(pairs))
    }

    /// Build a specification from already-decoded key/value pairs.
    ///
    /// Pairs are read in order; repeated keys are allowed.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(K, V)> = pairs.into_iter().collect();
        let params = Params(
            pairs
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_ref()))
                .collect(),
        );

        let mut spec = QuerySpec::default();
        spec.set_query(&params);
        spec.set_page(&params);
        spec.set_size(&params);
        spec.set_sort(&params);
        spec.set_filters(&params);
        spec.set_includes(&params);
        spec.set_fields(&params);

        if !spec.errors.is_empty() {
            debug!(errors = spec.errors.len(), "query parameters parsed with errors");
        }

        spec
    }

    /// Whether any field-level parse error was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn set_query(&mut self, params: &Params<'_>) {
        if let Some(q) = params.first("q").filter(|q| !q.is_empty()) {
            self.query = Some(q.to_string());
        }
    }

    fn set_page(&mut self, params: &Params<'_>) {
        let Some(value) = params.first("page").filter(|v| !v.is_empty()) else {
            return;
        };
        match value.parse::<i64>() {
            Ok(page) => self.page = Some(page.max(1)),
            Err(source) => self.errors.push(ParseError::Page {
                value: value.to_string(),
                source,
            }),
        }
    }

    fn set_size(&mut self, params: &Params<'_>) {
        let Some(value) = params.first("size").filter(|v| !v.is_empty()) else {
            return;
        };
        match value.parse::<i64>() {
            Ok(size) => self.size = Some(size),
            Err(source) => self.errors.push(ParseError::Size {
                value: value.to_string(),
                source,
            }),
        }
    }

    fn set_sort(&mut self, params: &Params<'_>) {
        if let Some(value) = params.first("sort") {
            self.sort.extend(SortDirective::parse_list(value));
        }
    }

    fn set_filters(&mut self, params: &Params<'_>) {
        for (key, value) in params.iter() {
            if let Some(name) = bracket_name(key, "filter") {
                self.filters
                    .insert(name.to_string(), FilterValue::coerce(value));
            }
        }
    }

    fn set_includes(&mut self, params: &Params<'_>) {
        if let Some(value) = params.first("include").filter(|v| !v.is_empty()) {
            self.includes = value.split(',').map(str::to_string).collect();
        }
    }

    fn set_fields(&mut self, params: &Params<'_>) {
        for (key, value) in params.iter() {
            if let Some(name) = bracket_name(key, "fields") {
                self.fields
                    .entry(name.to_string())
                    .or_default()
                    .extend(value.split(',').map(str::to_string));
            }
        }
    }
}

/// Ordered view over raw parameters
struct Params<'a>(Vec<(&'a str, &'a str)>);

impl<'a> Params<'a> {
    fn first(&self, key: &str) -> Option<&'a str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.0.iter().copied()
    }
}

/// Extract `<name>` from a key of the form `prefix[<name>]`
fn bracket_name<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|name| !name.is_empty())
}

fn serialize_errors<S: Serializer>(errors: &[ParseError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> QuerySpec {
        QuerySpec::parse_url(url).unwrap()
    }

    #[test]
    fn test_parse_query() {
        let spec = parse("https://example.com?q=search");
        assert_eq!(spec.query.as_deref(), Some("search"));
    }

    #[test]
    fn test_empty_query_is_omitted() {
        let spec = parse("https://example.com?q=");
        assert!(spec.query.is_none());
    }

    #[test]
    fn test_parse_page_and_size() {
        let spec = parse("https://example.com?q=search&page=2&size=15");
        assert_eq!(spec.page, Some(2));
        assert_eq!(spec.size, Some(15));
        assert!(!spec.has_errors());
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(parse("/?page=0").page, Some(1));
        assert_eq!(parse("/?page=-3").page, Some(1));
    }

    #[test]
    fn test_size_is_not_clamped() {
        assert_eq!(parse("/?size=-5").size, Some(-5));
    }

    #[test]
    fn test_bad_page_is_recorded() {
        let spec = parse("/?page=abc&size=10&sort=name");
        assert!(spec.page.is_none());
        assert_eq!(spec.size, Some(10));
        assert_eq!(spec.sort.len(), 1);
        assert_eq!(spec.errors.len(), 1);
        assert_eq!(spec.errors[0].param(), "page");
    }

    #[test]
    fn test_bad_size_is_recorded() {
        let spec = parse("/?size=1.5");
        assert!(spec.size.is_none());
        assert!(matches!(spec.errors[0], ParseError::Size { .. }));
    }

    #[test]
    fn test_parse_sort() {
        let spec = parse("/?sort=name,-age");
        assert_eq!(
            spec.sort,
            vec![SortDirective::asc("name"), SortDirective::desc("age")]
        );
    }

    #[test]
    fn test_parse_filters() {
        let spec = parse("/?filter[active]=1&filter[enabled]=true&filter[name]=bob");
        assert_eq!(spec.filters["active"], FilterValue::Int(1));
        assert_eq!(spec.filters["enabled"], FilterValue::Bool(true));
        assert_eq!(spec.filters["name"], FilterValue::Str("bob".into()));
    }

    #[test]
    fn test_encoded_filter_keys() {
        let spec = parse("/?filter%5Bstatus%5D=done");
        assert_eq!(spec.filters["status"], FilterValue::from("done"));
    }

    #[test]
    fn test_repeated_filter_last_write_wins() {
        let spec = parse("/?filter[status]=a&filter[status]=b");
        assert_eq!(spec.filters.len(), 1);
        assert_eq!(spec.filters["status"], FilterValue::from("b"));

        // percent-encoded brackets name the same filter
        let spec = parse("/?filter[status]=a&filter%5Bstatus%5D=b");
        assert_eq!(spec.filters["status"], FilterValue::from("b"));
    }

    #[test]
    fn test_filter_key_must_be_exact() {
        let spec = parse("/?xfilter[a]=1&filter[]=2&filter[b=3");
        assert!(spec.filters.is_empty());
    }

    #[test]
    fn test_parse_includes_preserves_order_and_empties() {
        let spec = parse("/?include=wallet,,wallet.bank_account");
        assert_eq!(spec.includes, vec!["wallet", "", "wallet.bank_account"]);
    }

    #[test]
    fn test_missing_include_is_empty() {
        assert!(parse("/?page=1").includes.is_empty());
    }

    #[test]
    fn test_parse_fields_appends() {
        let spec = parse("/?fields[users]=id,name&fields[posts]=title&fields[users]=email");
        assert_eq!(spec.fields["users"], vec!["id", "name", "email"]);
        assert_eq!(spec.fields["posts"], vec!["title"]);
    }

    #[test]
    fn test_from_pairs() {
        let spec = QuerySpec::from_pairs([("sort", "-id"), ("filter[x]", "y"), ("q", "hi")]);
        assert_eq!(spec.sort, vec![SortDirective::desc("id")]);
        assert_eq!(spec.filters["x"], FilterValue::from("y"));
        assert_eq!(spec.query.as_deref(), Some("hi"));
    }

    #[test]
    fn test_first_scalar_wins() {
        let spec = QuerySpec::from_pairs([("page", "3"), ("page", "9")]);
        assert_eq!(spec.page, Some(3));
    }

    #[test]
    fn test_malformed_url_fails() {
        assert!(QuerySpec::parse_url("http://[::1").is_err());
    }

    #[test]
    fn test_serialize_spec() {
        let spec = parse("/?page=x&filter[a]=1");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["filters"]["a"], serde_json::json!(1));
        assert!(json["errors"][0].as_str().unwrap().starts_with("page parse error"));
        assert!(json.get("page").is_none());
    }
}
