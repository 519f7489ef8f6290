//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code and is
//! printed with its stable code string.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::plan::PlanError;

/// Stable code identifying a class of CLI failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    ConfigError,
    IoError,
    InvalidUrl,
    Rejected,
    PlanFailed,
}

impl CliErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "AEROQUERY_CLI_CONFIG_ERROR",
            Self::IoError => "AEROQUERY_CLI_IO_ERROR",
            Self::InvalidUrl => "AEROQUERY_CLI_INVALID_URL",
            Self::Rejected => "AEROQUERY_CLI_REJECTED",
            Self::PlanFailed => "AEROQUERY_CLI_PLAN_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("output failed: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Code reported alongside the message
    pub fn code(&self) -> CliErrorCode {
        match self {
            CliError::Config(_) => CliErrorCode::ConfigError,
            CliError::Plan(PlanError::Url(_)) => CliErrorCode::InvalidUrl,
            CliError::Plan(PlanError::InvalidFilter(_) | PlanError::InvalidSort(_)) => {
                CliErrorCode::Rejected
            }
            CliError::Plan(PlanError::Configuration(_)) => CliErrorCode::ConfigError,
            CliError::Plan(PlanError::Operation(_)) => CliErrorCode::PlanFailed,
            CliError::Io(_) | CliError::Json(_) => CliErrorCode::IoError,
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
