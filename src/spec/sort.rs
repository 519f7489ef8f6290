//! # Sort Directives
//!
//! A `sort` parameter is a comma-separated list of column names, each
//! optionally prefixed with `-` for descending order.

use serde::{Deserialize, Serialize};

/// One parsed sort instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    pub name: String,
    pub ascending: bool,
}

impl SortDirective {
    pub fn new(name: impl Into<String>, ascending: bool) -> Self {
        Self {
            name: name.into(),
            ascending,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Parse a single token such as `created_at` or `-age`
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('-') {
            Some(name) => Self::desc(name),
            None => Self::asc(token),
        }
    }

    /// Parse a full `sort` value, skipping empty tokens
    pub fn parse_list(value: &str) -> Vec<Self> {
        value
            .split(',')
            .filter(|token| !token.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// `ASC` or `DESC`
    pub fn direction(&self) -> &'static str {
        if self.ascending {
            "ASC"
        } else {
            "DESC"
        }
    }
}
