//! Configuration management for the CLI.

use roster_engine::DuplicatePolicy;
use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON snapshot backing the store
    pub snapshot_path: PathBuf,
    /// Policy used by `import` when `--policy` is not given
    pub duplicate_policy: DuplicatePolicy,
    /// Whether `import` enforces the [0, 100] score range by default
    pub validate_range: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let snapshot_path = lookup("ROSTER_SNAPSHOT")
            .unwrap_or_else(|| "students.json".to_string())
            .into();

        let duplicate_policy = match lookup("ROSTER_DUPLICATE_POLICY") {
            Some(name) => name
                .parse::<DuplicatePolicy>()
                .map_err(|_| ConfigError::InvalidPolicy(name))?,
            None => DuplicatePolicy::default(),
        };

        let validate_range = match lookup("ROSTER_VALIDATE_RANGE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValidateRange(raw))?,
            None => true,
        };

        Ok(Self {
            snapshot_path,
            duplicate_policy,
            validate_range,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ROSTER_DUPLICATE_POLICY value '{0}' (expected skip, overwrite or reassign)")]
    InvalidPolicy(String),

    #[error("Invalid ROSTER_VALIDATE_RANGE value '{0}'")]
    InvalidValidateRange(String),
}
