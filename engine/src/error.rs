//! Error types for the Roster engine.

use crate::Key;
use thiserror::Error;

/// All possible errors from the Roster engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Store errors
    #[error("key already exists: {0}")]
    KeyExists(Key),

    #[error("key not found: {0}")]
    KeyNotFound(Key),

    #[error("score for key {0} must be a finite number")]
    InvalidScore(Key),

    // Source/destination errors
    #[error("file '{0}' not found")]
    SourceNotFound(String),

    #[error("header must contain: key, name, group, score (found: {found})")]
    MissingHeaders { found: String },

    #[error("unknown duplicate policy '{0}'")]
    UnknownPolicy(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("io error on '{path}': {message}")]
    Io { path: String, message: String },

    // Snapshot errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("failed to persist snapshot: {0}")]
    Persist(String),
}

impl Error {
    /// Whether the in-memory mutation went through despite this error.
    ///
    /// Only a failed snapshot write qualifies: the store never rolls back
    /// a mutation because persisting it failed.
    pub fn is_applied(&self) -> bool {
        matches!(self, Error::Persist(_))
    }

    pub(crate) fn io(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        Error::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single data row was rejected during import.
///
/// The `Display` text is the reason recorded in the import outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("key must be an integer")]
    InvalidKey,

    #[error("score must be numeric")]
    InvalidScore,

    #[error("score must be between 0 and 100")]
    ScoreOutOfRange,

    #[error("name cannot be empty")]
    EmptyName,

    #[error("group cannot be empty")]
    EmptyGroup,

    #[error("no free key left to reassign")]
    NoFreeKey,

    #[error("malformed row: {0}")]
    Malformed(String),
}
