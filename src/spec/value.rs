//! # Filter Value Coercion
//!
//! Query strings carry only text. Filter values are coerced into the
//! narrowest matching type so that `filter[active]=1` compares as a number
//! and `filter[active]=true` as a boolean.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A coerced filter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Integer value
    Int(i64),

    /// Boolean value
    Bool(bool),

    /// Anything else, kept verbatim
    Str(String),
}

impl FilterValue {
    /// Coerce a raw query value.
    ///
    /// Integer parsing is tried first, then a trimmed, case-insensitive
    /// comparison against `true` / `false`. Everything else stays a string,
    /// untrimmed.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return FilterValue::Int(n);
        }

        let lowered = raw.trim().to_lowercase();
        if lowered == "true" {
            return FilterValue::Bool(true);
        }
        if lowered == "false" {
            return FilterValue::Bool(false);
        }

        FilterValue::Str(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FilterValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Wrap the value in `%` wildcards for a substring match
    pub fn to_contains_pattern(&self) -> FilterValue {
        FilterValue::Str(format!("%{}%", self))
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(n) => write!(f, "{}", n),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Str(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Str(s)
    }
}
