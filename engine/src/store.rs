//! Store - the in-memory state container.
//!
//! The Store owns every live record, keyed by [`Key`]. It is loaded from a
//! [`SnapshotBackend`] when opened and writes the full snapshot back after
//! each successful mutation. There is no staging: if the write fails the
//! mutation still stands in memory and the failure is returned as
//! [`Error::Persist`].

use crate::{
    error::Result, Error, Key, MemoryBackend, Record, RecordPatch, SnapshotBackend, StoreSnapshot,
};
use std::collections::BTreeMap;

/// Ordered collection of uniquely keyed records.
pub struct Store {
    records: BTreeMap<Key, Record>,
    backend: Box<dyn SnapshotBackend>,
    load_error: Option<Error>,
}

impl Store {
    /// Open a store over `backend`, loading whatever it holds.
    ///
    /// A missing snapshot yields an empty store. An unreadable or corrupt one
    /// also yields an empty store; the failure is logged and kept in
    /// [`Store::load_error`].
    pub fn open(backend: impl SnapshotBackend + 'static) -> Self {
        let (records, load_error) = match backend.load() {
            Ok(Some(snapshot)) => (snapshot.into_records(), None),
            Ok(None) => (Vec::new(), None),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load snapshot, starting empty");
                (Vec::new(), Some(err))
            }
        };

        tracing::debug!(records = records.len(), "store opened");

        Self {
            records: records.into_iter().map(|r| (r.key, r)).collect(),
            backend: Box::new(backend),
            load_error,
        }
    }

    /// Open an empty store backed by memory only.
    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::new())
    }

    /// The error hit while loading the snapshot, if any.
    pub fn load_error(&self) -> Option<&Error> {
        self.load_error.as_ref()
    }

    /// Insert a new record.
    ///
    /// Fails with [`Error::KeyExists`] and changes nothing when the key is taken.
    /// A NaN or infinite score is refused with [`Error::InvalidScore`].
    pub fn add(&mut self, record: Record) -> Result<()> {
        self.insert_record(record)?;
        self.persist()
    }

    /// Get a record by key.
    pub fn find(&self, key: Key) -> Option<&Record> {
        self.records.get(&key)
    }

    /// Case-insensitive substring search over names.
    pub fn search_by_name(&self, query: &str) -> Vec<&Record> {
        let needle = query.trim().to_lowercase();
        self.records
            .values()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Apply a partial update to an existing record.
    pub fn update(&mut self, key: Key, patch: RecordPatch) -> Result<()> {
        let record = self.records.get_mut(&key).ok_or(Error::KeyNotFound(key))?;
        if patch.score.is_some_and(|score| !score.is_finite()) {
            return Err(Error::InvalidScore(key));
        }
        record.apply_patch(patch);
        self.persist()
    }

    /// Remove a record.
    pub fn delete(&mut self, key: Key) -> Result<()> {
        if self.records.remove(&key).is_none() {
            return Err(Error::KeyNotFound(key));
        }
        self.persist()
    }

    /// All records in ascending key order.
    pub fn list_sorted(&self) -> Vec<&Record> {
        self.records.values().collect()
    }

    /// Iterate over all records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `1` for an empty store, otherwise one past the largest key.
    ///
    /// Computed on every call: the maximum moves with each insert or delete.
    pub fn next_free_key(&self) -> Key {
        self.records
            .keys()
            .next_back()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Copy the current state into a snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.records.values().cloned())
    }

    /// Group several mutations under a single snapshot write.
    pub fn batch(&mut self) -> Batch<'_> {
        Batch { store: self }
    }

    fn insert_record(&mut self, record: Record) -> Result<()> {
        if self.records.contains_key(&record.key) {
            return Err(Error::KeyExists(record.key));
        }
        check_score(&record)?;
        self.records.insert(record.key, record);
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        self.backend.save(&snapshot).map_err(|err| {
            tracing::warn!(error = %err, "snapshot write failed, in-memory state kept");
            match err {
                Error::Persist(_) => err,
                other => Error::Persist(other.to_string()),
            }
        })
    }
}

// serde_json writes NaN and infinities as null, which no snapshot can load back.
fn check_score(record: &Record) -> Result<()> {
    if record.score.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidScore(record.key))
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("records", &self.records.len())
            .field("load_error", &self.load_error)
            .finish()
    }
}

/// Mutations that skip the per-call snapshot write.
///
/// Nothing reaches the backend until [`Batch::commit`], which writes once.
#[must_use = "a batch must be committed to persist its changes"]
pub struct Batch<'s> {
    store: &'s mut Store,
}

impl Batch<'_> {
    pub fn find(&self, key: Key) -> Option<&Record> {
        self.store.find(key)
    }

    pub fn next_free_key(&self) -> Key {
        self.store.next_free_key()
    }

    /// Insert a record whose key must be free.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.store.insert_record(record)
    }

    /// Replace name, group and score of the record sharing `record.key`.
    pub fn overwrite(&mut self, record: Record) -> Result<()> {
        let existing = self
            .store
            .records
            .get_mut(&record.key)
            .ok_or(Error::KeyNotFound(record.key))?;
        check_score(&record)?;
        existing.overwrite_from(record);
        Ok(())
    }

    /// Write the store's final state in one snapshot.
    pub fn commit(self) -> Result<()> {
        self.store.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    impl SnapshotBackend for FailingBackend {
        fn load(&self) -> Result<Option<StoreSnapshot>> {
            Ok(None)
        }

        fn save(&mut self, _snapshot: &StoreSnapshot) -> Result<()> {
            Err(Error::Persist("read-only".into()))
        }
    }

    fn seeded() -> Store {
        let mut store = Store::in_memory();
        store.add(Record::new(1, "Alice Johnson", "10-A", 88.5)).unwrap();
        store.add(Record::new(2, "Bob Singh", "10-A", 76.0)).unwrap();
        store.add(Record::new(3, "Chirag Mehta", "10-B", 91.2)).unwrap();
        store
    }

    #[test]
    fn add_and_find() {
        let mut store = Store::in_memory();
        store.add(Record::new(10, "Dev Patel", "9-A", 82.0)).unwrap();

        let record = store.find(10).unwrap();
        assert_eq!(record.name, "Dev Patel");
        assert_eq!(record.group, "9-A");
        assert_eq!(record.score, 82.0);
    }

    #[test]
    fn add_duplicate_key() {
        let mut store = Store::in_memory();
        store.add(Record::new(1, "A", "X", 10.0)).unwrap();

        let result = store.add(Record::new(1, "B", "Y", 20.0));
        assert!(matches!(result, Err(Error::KeyExists(1))));
        assert_eq!(store.find(1).unwrap().name, "A");
    }

    #[test]
    fn update_record() {
        let mut store = Store::in_memory();
        store.add(Record::new(5, "Name", "Class", 50.0)).unwrap();

        let patch = RecordPatch::new()
            .with_name("New Name")
            .with_group("11-C")
            .with_score(97.5);
        store.update(5, patch).unwrap();

        let record = store.find(5).unwrap();
        assert_eq!(record.name, "New Name");
        assert_eq!(record.group, "11-C");
        assert_eq!(record.score, 97.5);
    }

    #[test]
    fn update_missing() {
        let mut store = Store::in_memory();
        let result = store.update(999, RecordPatch::new().with_name("Nobody"));
        assert!(matches!(result, Err(Error::KeyNotFound(999))));
    }

    #[test]
    fn delete_record() {
        let mut store = Store::in_memory();
        store.add(Record::new(7, "To Delete", "9-B", 60.0)).unwrap();

        store.delete(7).unwrap();
        assert!(store.find(7).is_none());
        assert!(matches!(store.delete(7), Err(Error::KeyNotFound(7))));
    }

    #[test]
    fn list_sorted_by_key() {
        let mut store = Store::in_memory();
        store.add(Record::new(3, "Three", "X", 30.0)).unwrap();
        store.add(Record::new(1, "One", "X", 10.0)).unwrap();
        store.add(Record::new(2, "Two", "X", 20.0)).unwrap();

        let keys: Vec<_> = store.list_sorted().iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn search_is_case_insensitive_partial() {
        let store = seeded();

        let hits = store.search_by_name("ali");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Alice Johnson");

        let hits = store.search_by_name("  SINGH ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, 2);

        assert!(store.search_by_name("zed").is_empty());
    }

    #[test]
    fn next_free_key() {
        let mut store = Store::in_memory();
        assert_eq!(store.next_free_key(), 1);

        store.add(Record::new(1, "A", "X", 1.0)).unwrap();
        store.add(Record::new(3, "C", "X", 3.0)).unwrap();
        assert_eq!(store.next_free_key(), 4);

        store.delete(3).unwrap();
        assert_eq!(store.next_free_key(), 2);
    }

    #[test]
    fn every_mutation_persists() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());

        store.add(Record::new(1, "A", "X", 1.0)).unwrap();
        store.update(1, RecordPatch::new().with_score(2.0)).unwrap();
        store.add(Record::new(2, "B", "X", 1.0)).unwrap();
        store.delete(2).unwrap();
        assert_eq!(backend.saves(), 4);

        let reopened = Store::open(backend);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.find(1).unwrap().score, 2.0);
    }

    #[test]
    fn failed_mutation_does_not_persist() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        store.add(Record::new(1, "A", "X", 1.0)).unwrap();

        let _ = store.add(Record::new(1, "B", "X", 1.0));
        let _ = store.delete(42);
        assert_eq!(backend.saves(), 1);
    }

    #[test]
    fn persist_failure_keeps_mutation() {
        let mut store = Store::open(FailingBackend);

        let err = store.add(Record::new(1, "A", "X", 1.0)).unwrap_err();
        assert!(err.is_applied());
        assert!(store.find(1).is_some());
    }

    #[test]
    fn non_finite_scores_are_refused() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        store.add(Record::new(1, "A", "X", 10.0)).unwrap();
        store.add(Record::new(2, "B", "X", 20.0)).unwrap();

        assert!(matches!(
            store.update(2, RecordPatch::new().with_score(f64::NAN)),
            Err(Error::InvalidScore(2))
        ));
        assert!(matches!(
            store.add(Record::new(3, "C", "X", f64::INFINITY)),
            Err(Error::InvalidScore(3))
        ));
        assert_eq!(store.find(2).unwrap().score, 20.0);
        assert_eq!(backend.saves(), 2);

        let reopened = Store::open(backend);
        assert!(reopened.load_error().is_none());
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.find(2).unwrap().score, 20.0);
    }

    #[test]
    fn batch_refuses_non_finite_scores() {
        let mut store = Store::in_memory();
        store.add(Record::new(1, "A", "X", 10.0)).unwrap();

        let mut batch = store.batch();
        assert!(matches!(
            batch.insert(Record::new(2, "B", "X", f64::NEG_INFINITY)),
            Err(Error::InvalidScore(2))
        ));
        assert!(matches!(
            batch.overwrite(Record::new(1, "A", "X", f64::NAN)),
            Err(Error::InvalidScore(1))
        ));
        batch.commit().unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find(1).unwrap().score, 10.0);
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let store = Store::open(MemoryBackend::with_json("[{\"key\": \"oops\"}"));

        assert!(store.is_empty());
        assert!(matches!(store.load_error(), Some(Error::InvalidSnapshot(_))));
    }

    #[test]
    fn batch_persists_once() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        store.add(Record::new(1, "A", "X", 1.0)).unwrap();

        let mut batch = store.batch();
        batch.insert(Record::new(2, "B", "X", 2.0)).unwrap();
        batch.overwrite(Record::new(1, "A2", "Y", 9.0)).unwrap();
        let fresh = batch.next_free_key();
        batch.insert(Record::new(fresh, "C", "X", 3.0)).unwrap();
        assert!(matches!(
            batch.insert(Record::new(2, "dup", "X", 0.0)),
            Err(Error::KeyExists(2))
        ));
        batch.commit().unwrap();

        assert_eq!(backend.saves(), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.find(1).unwrap().name, "A2");
        assert_eq!(store.find(3).unwrap().name, "C");
    }
}
