//! # Query Specification
//!
//! Turns raw URL query parameters into a typed [`QuerySpec`]: free text,
//! pagination, sort directives, coerced filters, includes and sparse
//! field selections.

mod errors;
mod parser;
mod sort;
mod value;

pub use errors::ParseError;
pub use parser::QuerySpec;
pub use sort::SortDirective;
pub use value::FilterValue;
