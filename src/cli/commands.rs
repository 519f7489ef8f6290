//! CLI command implementations
//!
//! Commands are pure functions over their arguments; only [`run`] touches
//! process state (logging, stdout).

use std::path::Path;

use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AdapterConfig, OperationRegistry};
use crate::plan::{PlanError, QueryAdapter, SelectQuery};
use crate::spec::QuerySpec;

use super::args::Command;
use super::errors::CliResult;
use super::io::write_json;

/// Output of the `plan` command
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    /// Rendered SQL for the compiled query
    pub sql: String,
    /// Normalized relations the query eager-loads
    pub relationships: Vec<String>,
    /// Specification after defaults were applied
    pub spec: QuerySpec,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    init_tracing();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Parse { url } => write_json(&parse(&url)?),
        Command::Plan {
            config,
            table,
            paginate,
            url,
        } => write_json(&plan(config.as_deref(), &table, paginate, &url)?),
    }
}

/// Log to stderr, `warn` and above unless `RUST_LOG` says otherwise
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // a subscriber may already be installed by an embedding binary
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Parse a URL into its query specification
pub fn parse(url: &str) -> CliResult<QuerySpec> {
    let spec = QuerySpec::parse_url(url).map_err(PlanError::from)?;
    Ok(spec)
}

/// Compile a URL against a [`SelectQuery`] on `table`.
///
/// Without a config file the adapter is unrestricted. Configurations may
/// not reference custom operations here, since the CLI registers none.
pub fn plan(
    config_path: Option<&Path>,
    table: &str,
    paginate: bool,
    url: &str,
) -> CliResult<PlanOutput> {
    let mut adapter = match config_path {
        Some(path) => {
            let config = AdapterConfig::load(path)?;
            debug!(path = %path.display(), "loaded adapter config");
            config.build(&OperationRegistry::new())?
        }
        None => QueryAdapter::new(),
    };

    let mut spec = parse(url)?;
    let mut query = SelectQuery::new(table);

    if paginate {
        adapter.paginate(&mut query, &mut spec)?;
    } else {
        adapter.execute(&mut query, &mut spec)?;
    }

    Ok(PlanOutput {
        sql: query.to_sql(),
        relationships: adapter.relationships().to_vec(),
        spec,
    })
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir, config: serde_json::Value) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("adapter.json");
        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_parse_relative_url() {
        let spec = parse("/users?q=bob&page=0&sort=-id").unwrap();
        assert_eq!(spec.query.as_deref(), Some("bob"));
        assert_eq!(spec.page, Some(1));
    }

    #[test]
    fn test_parse_output_shape() {
        let spec = parse("/?filter[age]=30&page=x").unwrap();
        let value = serde_json::to_value(&spec).unwrap();

        assert_eq!(value["filters"], json!({"age": 30}));
        assert_eq!(value["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_plan_unrestricted() {
        let output = plan(None, "users", false, "/?filter[name]=bob&include=wallet").unwrap();

        assert_eq!(
            output.sql,
            "SELECT * FROM `users` WHERE `name` LIKE '%bob%'"
        );
        assert_eq!(output.relationships, vec!["Wallet"]);
    }

    #[test]
    fn test_plan_paginate_flag() {
        let output = plan(None, "users", true, "/").unwrap();
        assert_eq!(output.sql, "SELECT * FROM `users` LIMIT 30 OFFSET 0");
        assert_eq!(output.spec.size, Some(30));
    }

    #[test]
    fn test_plan_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(
            &temp_dir,
            json!({
                "filters": [{"exact": "status"}],
                "sorts": ["created_at"],
                "default_sort": "-created_at"
            }),
        );

        let output = plan(Some(config_path.as_path()), "tasks", false, "/?filter[status]=open").unwrap();
        assert_eq!(
            output.sql,
            "SELECT * FROM `tasks` WHERE `status` = 'open' ORDER BY `created_at` DESC"
        );
    }

    #[test]
    fn test_plan_rejects_unlisted_filter() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({"filters": ["status"]}));

        let result = plan(Some(config_path.as_path()), "tasks", false, "/?filter[active]=1");
        assert_eq!(result.unwrap_err().code(), CliErrorCode::Rejected);
    }

    #[test]
    fn test_plan_custom_entry_without_registry() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({"filters": [{"custom": "age_range"}]}));

        let result = plan(Some(config_path.as_path()), "tasks", false, "/");
        assert_eq!(result.unwrap_err().code(), CliErrorCode::ConfigError);
    }

    #[test]
    fn test_plan_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = plan(Some(temp_dir.path().join("nope.json").as_path()), "t", false, "/");
        assert_eq!(result.unwrap_err().code(), CliErrorCode::ConfigError);
    }

    #[test]
    fn test_plan_bad_url() {
        let result = plan(None, "t", false, "http://[::1");
        assert_eq!(result.unwrap_err().code(), CliErrorCode::InvalidUrl);
    }
}
