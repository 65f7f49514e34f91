//! Duplicate resolution for imported rows.
//!
//! When an incoming row carries a key the store already holds, the
//! [`DuplicatePolicy`] decides what happens to it.

use crate::{Error, Key};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule for an incoming row whose key is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the existing record, drop the row (default)
    #[default]
    Skip,
    /// Replace name, group and score of the existing record
    Overwrite,
    /// Store the row as a new record under the next free key
    Reassign,
    /// A policy name nothing understands. Import aborts at the first
    /// collision it would have to resolve.
    #[serde(skip)]
    Unrecognized(String),
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Overwrite => "overwrite",
            DuplicatePolicy::Reassign => "reassign",
            DuplicatePolicy::Unrecognized(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, DuplicatePolicy::Unrecognized(_))
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient: unknown names become [`DuplicatePolicy::Unrecognized`].
impl From<&str> for DuplicatePolicy {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "skip" => DuplicatePolicy::Skip,
            "overwrite" => DuplicatePolicy::Overwrite,
            "reassign" => DuplicatePolicy::Reassign,
            _ => DuplicatePolicy::Unrecognized(name.to_string()),
        }
    }
}

/// Strict: unknown names are an error.
impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match DuplicatePolicy::from(s) {
            DuplicatePolicy::Unrecognized(name) => Err(Error::UnknownPolicy(name)),
            policy => Ok(policy),
        }
    }
}

/// What happened to one accepted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// Key was free; inserted as-is
    Imported,
    /// Key was taken; row dropped
    Skipped,
    /// Key was taken; existing record's fields replaced
    Overwritten,
    /// Key was taken; inserted under a fresh key
    Reassigned { from: Key, to: Key },
}
