//! # Specification Parse Errors
//!
//! Field-level problems found while reading query parameters. These are
//! recorded on the [`QuerySpec`](super::QuerySpec) rather than returned,
//! so the rest of the request stays usable.

use std::num::ParseIntError;

use thiserror::Error;

/// Non-fatal parse error recorded on a specification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `page` is not an integer
    #[error("page parse error: {value:?}: {source}")]
    Page {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// `size` is not an integer
    #[error("size parse error: {value:?}: {source}")]
    Size {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl ParseError {
    /// Name of the parameter that failed to parse
    pub fn param(&self) -> &'static str {
        match self {
            ParseError::Page { .. } => "page",
            ParseError::Size { .. } => "size",
        }
    }
}
