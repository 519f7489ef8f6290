//! # Adapter Configuration
//!
//! Declarative, file-based description of a [`QueryAdapter`]:
//!
//! ```json
//! {
//!   "filters": ["status", {"exact": "is_completed"}, {"search": "name"}, {"custom": "age_range"}],
//!   "sorts": ["created_at", {"custom": "name_length"}],
//!   "includes": ["wallet", "wallet.bank_account"],
//!   "default_sort": "-created_at",
//!   "pagination": {"page": 1, "size": 30}
//! }
//! ```
//!
//! `{"custom": ...}` entries name operations registered in an
//! [`OperationRegistry`]. The registered operation declares the keys it
//! handles; the configured name is only a handle.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::{
    AllowedFilter, AllowedSort, FilterOperation, PageDefaults, PlanError, PlanResult, QueryAdapter,
    SortOperation,
};
use crate::spec::SortDirective;

/// Errors loading an adapter configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// One allow-list entry as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    /// Plain column name
    Name(String),
    /// Exact-match filter
    Exact { exact: String },
    /// Substring filter
    Search { search: String },
    /// Registered operation
    Custom { custom: String },
}

impl EntryConfig {
    /// The name this entry refers to
    pub fn name(&self) -> &str {
        match self {
            EntryConfig::Name(name) => name,
            EntryConfig::Exact { exact } => exact,
            EntryConfig::Search { search } => search,
            EntryConfig::Custom { custom } => custom,
        }
    }

    fn to_filter(&self, registry: &OperationRegistry) -> PlanResult<AllowedFilter> {
        match self {
            EntryConfig::Name(name) => Ok(AllowedFilter::name(name.as_str())),
            EntryConfig::Exact { exact } => Ok(AllowedFilter::exact(exact.as_str())),
            EntryConfig::Search { search } => Ok(AllowedFilter::search(search.as_str())),
            EntryConfig::Custom { custom } => registry
                .filter(custom)
                .map(AllowedFilter::Operation)
                .ok_or_else(|| {
                    PlanError::configuration(format!("unknown custom filter '{}'", custom))
                }),
        }
    }

    fn to_sort(&self, registry: &OperationRegistry) -> PlanResult<AllowedSort> {
        match self {
            EntryConfig::Name(name) => Ok(AllowedSort::name(name.as_str())),
            EntryConfig::Custom { custom } => registry
                .sort(custom)
                .map(AllowedSort::Operation)
                .ok_or_else(|| PlanError::configuration(format!("unknown custom sort '{}'", custom))),
            EntryConfig::Exact { .. } | EntryConfig::Search { .. } => {
                Err(PlanError::configuration(format!(
                    "sort entry '{}' must be a column name or a custom operation",
                    self.name()
                )))
            }
        }
    }
}

/// Named filter and sort operations available to configurations
#[derive(Clone, Default)]
pub struct OperationRegistry {
    filters: HashMap<String, Arc<dyn FilterOperation>>,
    sorts: HashMap<String, Arc<dyn SortOperation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter operation under `name`, replacing any previous one
    pub fn register_filter(
        &mut self,
        name: impl Into<String>,
        op: impl FilterOperation + 'static,
    ) -> &mut Self {
        self.filters.insert(name.into(), Arc::new(op));
        self
    }

    /// Register a sort operation under `name`, replacing any previous one
    pub fn register_sort(
        &mut self,
        name: impl Into<String>,
        op: impl SortOperation + 'static,
    ) -> &mut Self {
        self.sorts.insert(name.into(), Arc::new(op));
        self
    }

    pub fn filter(&self, name: &str) -> Option<Arc<dyn FilterOperation>> {
        self.filters.get(name).cloned()
    }

    pub fn sort(&self, name: &str) -> Option<Arc<dyn SortOperation>> {
        self.sorts.get(name).cloned()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut filters: Vec<_> = self.filters.keys().collect();
        let mut sorts: Vec<_> = self.sorts.keys().collect();
        filters.sort();
        sorts.sort();
        f.debug_struct("OperationRegistry")
            .field("filters", &filters)
            .field("sorts", &sorts)
            .finish()
    }
}

/// Adapter configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Filter allow-list (empty: unrestricted)
    #[serde(default)]
    pub filters: Vec<EntryConfig>,

    /// Sort allow-list (empty: unrestricted)
    #[serde(default)]
    pub sorts: Vec<EntryConfig>,

    /// Include allow-list (empty: unrestricted)
    #[serde(default)]
    pub includes: Vec<String>,

    /// Sort token applied when a request has none, e.g. `-created_at`
    #[serde(default)]
    pub default_sort: Option<String>,

    /// Pagination defaults; pagination is only forced when present
    #[serde(default)]
    pub pagination: Option<PageDefaults>,
}

impl AdapterConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: AdapterConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names and non-positive pagination defaults
    pub fn validate(&self) -> ConfigResult<()> {
        for (section, entries) in [("filters", &self.filters), ("sorts", &self.sorts)] {
            if let Some(index) = entries.iter().position(|e| e.name().is_empty()) {
                return Err(ConfigError::invalid(format!(
                    "{} entry #{} has an empty name",
                    section, index
                )));
            }
        }

        if let Some(index) = self.includes.iter().position(String::is_empty) {
            return Err(ConfigError::invalid(format!(
                "includes entry #{} is empty",
                index
            )));
        }

        if let Some(token) = &self.default_sort {
            if SortDirective::parse(token).name.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "default_sort '{}' names no column",
                    token
                )));
            }
        }

        if let Some(defaults) = &self.pagination {
            if defaults.page <= 0 {
                return Err(ConfigError::invalid("pagination.page must be > 0"));
            }
            if defaults.size <= 0 {
                return Err(ConfigError::invalid("pagination.size must be > 0"));
            }
        }

        Ok(())
    }

    /// Resolve entries against `registry` and build an adapter
    pub fn build(&self, registry: &OperationRegistry) -> PlanResult<QueryAdapter> {
        let filters = self
            .filters
            .iter()
            .map(|entry| entry.to_filter(registry))
            .collect::<PlanResult<Vec<_>>>()?;
        let sorts = self
            .sorts
            .iter()
            .map(|entry| entry.to_sort(registry))
            .collect::<PlanResult<Vec<_>>>()?;

        let mut adapter = QueryAdapter::new()
            .allowed_filters(filters)
            .allowed_sorts(sorts)
            .allowed_includes(self.includes.iter().cloned())
            .with_pagination(self.pagination);

        if let Some(token) = &self.default_sort {
            adapter = adapter.default_sort(SortDirective::parse(token));
        }

        Ok(adapter)
    }
}
