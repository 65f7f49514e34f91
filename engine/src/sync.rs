//! Tabular sync between a [`Store`] and CSV text.
//!
//! This is the only place that reads or writes the tabular encoding.
//!
//! # Import algorithm
//!
//! 1. Locate the four required columns in the header (fatal if any is missing)
//! 2. For each data row, in file order, validate it into a [`Record`]
//! 3. Rejected rows are counted and reported with their line number
//! 4. Accepted rows are resolved against the store by [`DuplicatePolicy`]
//! 5. Persist the store once, after the last row
//!
//! Every call returns an outcome value; nothing propagates past it.

use crate::error::RowRejection;
use crate::store::Batch;
use crate::tabular::{self, ColumnMap};
use crate::{error::Result, DuplicatePolicy, Error, Record, Resolution, Store};
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Knobs for one import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub duplicate_policy: DuplicatePolicy,
    /// Reject scores outside [0, 100]
    pub validate_range: bool,
}

impl ImportOptions {
    pub fn new(duplicate_policy: impl Into<DuplicatePolicy>) -> Self {
        Self {
            duplicate_policy: duplicate_policy.into(),
            ..Self::default()
        }
    }

    pub fn with_validate_range(mut self, validate_range: bool) -> Self {
        self.validate_range = validate_range;
        self
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Skip,
            validate_range: true,
        }
    }
}

/// One entry in an import's error list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// A data row was rejected; the import carried on.
    #[error("Line {line}: {reason}")]
    Row { line: u64, reason: RowRejection },

    /// The import stopped (or never started), or its final write failed.
    #[error(transparent)]
    Fatal(#[from] Error),
}

impl ImportError {
    /// Source line of a row error. Line 1 is the header.
    pub fn line(&self) -> Option<u64> {
        match self {
            ImportError::Row { line, .. } => Some(*line),
            ImportError::Fatal(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ImportError::Fatal(_))
    }
}

impl Serialize for ImportError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Summary of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Data rows in the source (header excluded)
    pub read_rows: usize,
    /// Rows inserted under their own key
    pub imported: usize,
    /// Colliding rows dropped under `skip`
    pub skipped_duplicates: usize,
    /// Colliding rows written over the existing record under `overwrite`
    pub overwritten: usize,
    /// Colliding rows inserted under a fresh key under `reassign`
    pub reassigned: usize,
    /// Rows that failed validation
    pub invalid_rows: usize,
    /// Row errors and fatal errors, in the order they happened
    pub errors: Vec<ImportError>,
}

impl ImportOutcome {
    fn fatal(err: Error) -> Self {
        Self {
            errors: vec![ImportError::Fatal(err)],
            ..Self::default()
        }
    }

    /// Whether every read row landed in exactly one bucket.
    ///
    /// Only an aborted import can break this.
    pub fn is_consistent(&self) -> bool {
        self.read_rows
            == self.imported
                + self.skipped_duplicates
                + self.overwritten
                + self.reassigned
                + self.invalid_rows
    }

    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(ImportError::is_fatal)
    }

    pub fn row_errors(&self) -> impl Iterator<Item = &ImportError> {
        self.errors.iter().filter(|e| !e.is_fatal())
    }

    fn tally(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Imported => self.imported += 1,
            Resolution::Skipped => self.skipped_duplicates += 1,
            Resolution::Overwritten => self.overwritten += 1,
            Resolution::Reassigned { .. } => self.reassigned += 1,
        }
    }

    fn reject(&mut self, line: u64, reason: RowRejection) {
        tracing::debug!(line, %reason, "row rejected");
        self.invalid_rows += 1;
        self.errors.push(ImportError::Row { line, reason });
    }
}

/// Summary of one export run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub rows_written: usize,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "display")]
    pub error: Option<Error>,
}

impl ExportOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn display<S: Serializer>(
    error: &Option<Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.collect_str(err),
        None => serializer.serialize_none(),
    }
}

/// Moves records between a [`Store`] and CSV.
pub struct SyncEngine<'s> {
    store: &'s mut Store,
}

impl<'s> SyncEngine<'s> {
    pub fn new(store: &'s mut Store) -> Self {
        Self { store }
    }

    /// Write the header and every record, key-ascending. Returns the row count.
    pub fn export_to<W: io::Write>(&self, destination: W) -> Result<usize> {
        let mut writer = tabular::writer(destination);
        tabular::write_header(&mut writer)?;

        let mut count = 0;
        for record in self.store.list_sorted() {
            tabular::write_record(&mut writer, record)?;
            count += 1;
        }
        writer.flush().map_err(csv::Error::from)?;

        Ok(count)
    }

    /// Export to a file. The store is never touched.
    pub fn export(&self, path: impl AsRef<Path>) -> ExportOutcome {
        let path = path.as_ref();
        let written = File::create(path)
            .map_err(|e| Error::io(path.display(), e))
            .and_then(|file| self.export_to(file));

        match written {
            Ok(rows_written) => {
                tracing::info!(rows = rows_written, path = %path.display(), "export finished");
                ExportOutcome {
                    rows_written,
                    destination: path.to_path_buf(),
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "export failed");
                ExportOutcome {
                    rows_written: 0,
                    destination: path.to_path_buf(),
                    error: Some(err),
                }
            }
        }
    }

    /// Import from a file. A missing file is fatal and processes nothing.
    pub fn import(&mut self, path: impl AsRef<Path>, options: &ImportOptions) -> ImportOutcome {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => self.import_from(file, options),
            Err(e) => {
                let err = match e.kind() {
                    io::ErrorKind::NotFound => Error::SourceNotFound(path.display().to_string()),
                    _ => Error::io(path.display(), e),
                };
                tracing::warn!(error = %err, "import aborted");
                ImportOutcome::fatal(err)
            }
        }
    }

    /// Merge CSV rows from `source` into the store.
    pub fn import_from<R: io::Read>(
        &mut self,
        source: R,
        options: &ImportOptions,
    ) -> ImportOutcome {
        let mut reader = tabular::reader(source);
        let columns = match reader
            .headers()
            .map_err(Error::from)
            .and_then(ColumnMap::from_headers)
        {
            Ok(columns) => columns,
            Err(err) => {
                tracing::warn!(error = %err, "import aborted");
                return ImportOutcome::fatal(err);
            }
        };

        let mut outcome = ImportOutcome::default();
        let mut batch = self.store.batch();
        let mut aborted = false;

        for result in reader.records() {
            let row = match result {
                Err(err) if err.is_io_error() => {
                    outcome.errors.push(ImportError::Fatal(err.into()));
                    break;
                }
                other => other,
            };
            outcome.read_rows += 1;
            if aborted {
                continue;
            }

            let (line, parsed) = match row {
                Ok(row) => (
                    row.position().map_or(0, |p| p.line()),
                    tabular::parse_row(&row, &columns, options.validate_range),
                ),
                Err(err) => (
                    err.position().map_or(0, |p| p.line()),
                    Err(RowRejection::Malformed(err.to_string())),
                ),
            };

            let record = match parsed {
                Ok(record) => record,
                Err(reason) => {
                    outcome.reject(line, reason);
                    continue;
                }
            };

            match resolve(&mut batch, record, &options.duplicate_policy) {
                Ok(resolution) => outcome.tally(resolution),
                Err(Resolve::Reject(reason)) => outcome.reject(line, reason),
                Err(Resolve::Abort(err)) => {
                    tracing::warn!(line, error = %err, "import aborted");
                    outcome.errors.push(ImportError::Fatal(err));
                    aborted = true;
                }
            }
        }

        if let Err(err) = batch.commit() {
            outcome.errors.push(ImportError::Fatal(err));
        }

        tracing::info!(
            read = outcome.read_rows,
            imported = outcome.imported,
            overwritten = outcome.overwritten,
            skipped = outcome.skipped_duplicates,
            reassigned = outcome.reassigned,
            invalid = outcome.invalid_rows,
            "import finished"
        );

        outcome
    }
}

enum Resolve {
    Reject(RowRejection),
    Abort(Error),
}

fn resolve(
    batch: &mut Batch<'_>,
    record: Record,
    policy: &DuplicatePolicy,
) -> std::result::Result<Resolution, Resolve> {
    if batch.find(record.key).is_none() {
        batch.insert(record).map_err(Resolve::Abort)?;
        return Ok(Resolution::Imported);
    }

    match policy {
        DuplicatePolicy::Skip => Ok(Resolution::Skipped),
        DuplicatePolicy::Overwrite => {
            batch.overwrite(record).map_err(Resolve::Abort)?;
            Ok(Resolution::Overwritten)
        }
        DuplicatePolicy::Reassign => {
            let from = record.key;
            let to = batch.next_free_key();
            batch
                .insert(Record { key: to, ..record })
                .map_err(|_| Resolve::Reject(RowRejection::NoFreeKey))?;
            Ok(Resolution::Reassigned { from, to })
        }
        DuplicatePolicy::Unrecognized(name) => {
            Err(Resolve::Abort(Error::UnknownPolicy(name.clone())))
        }
    }
}
