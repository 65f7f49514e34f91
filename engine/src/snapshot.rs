//! Snapshot types for persisting and restoring store state.
//!
//! Snapshots are the bridge between the in-memory Store and persistent storage.
//! A snapshot is the whole store: every save overwrites the previous one.
//! On disk it is a plain JSON array of `{key, name, group, score}` objects.

use crate::{error::Result, Error, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A point-in-time copy of every live record.
///
/// Records are kept in ascending key order so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    records: Vec<Record>,
}

impl StoreSnapshot {
    /// Build a snapshot from records in any order.
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        let mut records: Vec<Record> = records.into_iter().collect();
        records.sort_by_key(|r| r.key);
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reject snapshots that break the one-record-per-key invariant.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            if !seen.insert(record.key) {
                return Err(Error::InvalidSnapshot(format!(
                    "duplicate key {} in snapshot",
                    record.key
                )));
            }
        }
        Ok(())
    }

    /// Serialize to JSON with deterministic ordering.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON (two-space indent).
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(Self::new(snapshot.records))
    }
}

/// Where the store loads from and writes back to.
pub trait SnapshotBackend {
    /// Load the last saved snapshot. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreSnapshot>>;

    /// Replace the saved snapshot wholesale.
    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// Snapshot stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::io(self.path.display(), e))?;
        StoreSnapshot::from_json(&json).map(Some)
    }

    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        let json = snapshot.to_json_pretty()?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::Persist(format!("{}: {}", self.path.display(), e)))
    }
}

/// In-process backend. Clones share the same buffer, so a test can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    json: Option<String>,
    saves: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing snapshot text, valid or not.
    pub fn with_json(json: impl Into<String>) -> Self {
        let backend = Self::default();
        backend.state().json = Some(json.into());
        backend
    }

    /// Raw JSON of the last save, if any.
    pub fn json(&self) -> Option<String> {
        self.state().json.clone()
    }

    /// Number of saves performed so far.
    pub fn saves(&self) -> usize {
        self.state().saves
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        match &self.state().json {
            Some(json) => StoreSnapshot::from_json(json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        let json = snapshot.to_json_pretty()?;
        let mut state = self.state();
        state.json = Some(json);
        state.saves += 1;
        Ok(())
    }
}
