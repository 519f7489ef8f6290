//! aeroquery - Compiles URL query parameters into validated query plans
//!
//! - [`spec`]: parse a URL into a typed [`QuerySpec`]
//! - [`plan`]: validate a specification against allow-lists and compile it
//!   onto a [`QueryBuilder`]
//! - [`config`]: file-based adapter configuration
//! - [`cli`]: command-line entry point

pub mod cli;
pub mod config;
pub mod plan;
pub mod spec;

pub use config::{AdapterConfig, ConfigError, OperationRegistry};
pub use plan::{AllowedFilter, AllowedSort, PlanError, PlanResult, QueryAdapter, QueryBuilder, SelectQuery};
pub use spec::{FilterValue, ParseError, QuerySpec, SortDirective};
