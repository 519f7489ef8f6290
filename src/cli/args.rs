//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroquery parse <URL>
//! - aeroquery plan [--config <path>] [--table <name>] [--paginate] <URL>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeroquery - Compile URL query parameters into query plans
#[derive(Parser, Debug)]
#[command(name = "aeroquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a URL and print its query specification
    Parse {
        /// Absolute URL, or a path with a query string
        url: String,
    },

    /// Compile a URL into a query plan
    Plan {
        /// Path to adapter configuration file (default: unrestricted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Table the query selects from
        #[arg(long, default_value = "records")]
        table: String,

        /// Always paginate, filling in page 1 / size 30
        #[arg(long)]
        paginate: bool,

        /// Absolute URL, or a path with a query string
        url: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
