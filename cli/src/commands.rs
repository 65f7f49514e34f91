//! Command definitions and their execution against a store.
//!
//! Every command prints JSON to the given writer so the output can be piped.

use crate::config::Config;
use crate::error::{CliError, Result};
use clap::{Parser, Subcommand};
use roster_engine::{
    DuplicatePolicy, ImportError, ImportOptions, Key, Record, RecordPatch, Store, SyncEngine,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Student roster with CSV import/export")]
pub struct Cli {
    /// JSON snapshot file (overrides ROSTER_SNAPSHOT)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new record
    Add {
        #[arg(long)]
        key: Key,
        #[arg(long)]
        name: String,
        #[arg(long)]
        group: String,
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },
    /// List all records by key
    List,
    /// Show one record
    Find { key: Key },
    /// Case-insensitive name search
    Search { query: String },
    /// Change some fields of a record
    Update {
        key: Key,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        score: Option<f64>,
    },
    /// Remove a record
    Delete { key: Key },
    /// Write all records to a CSV file
    Export { path: PathBuf },
    /// Merge a CSV file into the store
    Import {
        path: PathBuf,
        /// skip, overwrite or reassign
        #[arg(long)]
        policy: Option<DuplicatePolicy>,
        /// Accept scores outside 0-100
        #[arg(long)]
        no_validate_range: bool,
    },
}

#[derive(Debug, Serialize)]
struct Ack<'a> {
    action: &'a str,
    key: Key,
}

/// Execute one command, writing its result to `out`.
pub fn run(
    command: Command,
    store: &mut Store,
    config: &Config,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Add {
            key,
            name,
            group,
            score,
        } => {
            store.add(Record::new(key, name, group, score))?;
            tracing::info!(key, "record added");
            emit(out, &Ack { action: "added", key })
        }
        Command::List => emit(out, &store.list_sorted()),
        Command::Find { key } => match store.find(key) {
            Some(record) => emit(out, record),
            None => Err(roster_engine::Error::KeyNotFound(key).into()),
        },
        Command::Search { query } => emit(out, &store.search_by_name(&query)),
        Command::Update {
            key,
            name,
            group,
            score,
        } => {
            let patch = RecordPatch { name, group, score };
            if patch.is_empty() {
                if store.find(key).is_none() {
                    return Err(roster_engine::Error::KeyNotFound(key).into());
                }
                tracing::warn!(key, "update without fields, nothing to change");
                return emit(out, &Ack { action: "unchanged", key });
            }
            store.update(key, patch)?;
            tracing::info!(key, "record updated");
            emit(out, &Ack { action: "updated", key })
        }
        Command::Delete { key } => {
            store.delete(key)?;
            tracing::info!(key, "record deleted");
            emit(out, &Ack { action: "deleted", key })
        }
        Command::Export { path } => {
            let outcome = SyncEngine::new(store).export(&path);
            emit(out, &outcome)?;
            match outcome.error {
                Some(err) => Err(err.into()),
                None => Ok(()),
            }
        }
        Command::Import {
            path,
            policy,
            no_validate_range,
        } => {
            let options = ImportOptions {
                duplicate_policy: policy.unwrap_or_else(|| config.duplicate_policy.clone()),
                validate_range: config.validate_range && !no_validate_range,
            };
            let outcome = SyncEngine::new(store).import(&path, &options);
            emit(out, &outcome)?;
            match outcome.errors.into_iter().find(ImportError::is_fatal) {
                Some(fatal) => Err(CliError::Import(fatal)),
                None => Ok(()),
            }
        }
    }
}

fn emit<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
