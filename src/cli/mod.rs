//! CLI module for aeroquery
//!
//! Provides command-line interface for:
//! - parse: Print the query specification of a URL
//! - plan: Compile a URL into a query plan, optionally against a config file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{parse, plan, run, run_command, PlanOutput};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_json, write_json_to};
