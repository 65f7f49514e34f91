//! # Roster Engine
//!
//! A record store with a CSV import/export engine on top.
//!
//! This crate keeps an authoritative, in-memory set of uniquely keyed
//! records, persists it as a JSON snapshot after every change, and merges
//! tabular data into it under a configurable duplicate policy.
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] has a unique integer [`Key`], a name, a group label and a
//! floating-point score. Partial updates go through a [`RecordPatch`].
//!
//! ### Store
//!
//! The [`Store`] owns all records and writes a full [`StoreSnapshot`] to its
//! [`SnapshotBackend`] after every successful mutation. A failed write is
//! reported but never rolls the mutation back.
//!
//! ### Sync
//!
//! The [`SyncEngine`] exports the store as CSV and imports CSV rows into it.
//! Each row is validated on its own; a bad row is counted and skipped.
//! Rows whose key already exists are handled by a [`DuplicatePolicy`]:
//! - [`DuplicatePolicy::Skip`] - keep the existing record (default)
//! - [`DuplicatePolicy::Overwrite`] - replace its name, group and score
//! - [`DuplicatePolicy::Reassign`] - insert the row under the next free key
//!
//! ## Quick Start
//!
//! ```rust
//! use roster_engine::{ImportOptions, Record, Store, SyncEngine};
//!
//! let mut store = Store::in_memory();
//! store.add(Record::new(1, "Existing", "X", 55.5)).unwrap();
//!
//! let csv = "key,name,group,score\n1,New,Y,99\n2,Other,Y,40\n";
//! let options = ImportOptions::new("overwrite");
//! let outcome = SyncEngine::new(&mut store).import_from(csv.as_bytes(), &options);
//!
//! assert_eq!(outcome.overwritten, 1);
//! assert_eq!(outcome.imported, 1);
//! assert_eq!(store.find(1).unwrap().name, "New");
//! ```

pub mod error;
pub mod policy;
pub mod record;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod tabular;

// Re-export main types at crate root
pub use error::{Error, RowRejection};
pub use policy::{DuplicatePolicy, Resolution};
pub use record::{Record, RecordPatch};
pub use snapshot::{JsonFileBackend, MemoryBackend, SnapshotBackend, StoreSnapshot};
pub use store::{Batch, Store};
pub use sync::{ExportOutcome, ImportError, ImportOptions, ImportOutcome, SyncEngine};

/// Unique record identifier.
pub type Key = u64;
