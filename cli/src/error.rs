//! Unified error handling for the CLI.

use crate::config::ConfigError;
use roster_engine::{Error, ImportError};

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Engine(#[from] Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import failed: {0}")]
    Import(ImportError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => 78,
            CliError::Engine(e) if is_io(e) => 74,
            CliError::Engine(_) => 1,
            CliError::Output(_) | CliError::Json(_) => 74,
            CliError::Import(ImportError::Fatal(e)) if is_io(e) => 74,
            CliError::Import(_) => 65,
        }
    }
}

fn is_io(err: &Error) -> bool {
    matches!(err, Error::Io { .. } | Error::Persist(_))
}

/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, CliError>;
