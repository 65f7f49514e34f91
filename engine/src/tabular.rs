//! Tabular (CSV) encoding of records.
//!
//! The header is `key,name,group,score`. Exports always use that order;
//! imports accept the four names in any order and ignore extra columns.

use crate::error::{Result, RowRejection};
use crate::{Error, Key, Record};
use std::io;

/// Canonical column names, in export order.
pub const HEADER: [&str; 4] = ["key", "name", "group", "score"];

/// Outcome of parsing one data row.
pub type RowResult = std::result::Result<Record, RowRejection>;

/// Column index of each required field within a source's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    key: usize,
    name: usize,
    group: usize,
    score: usize,
}

impl ColumnMap {
    /// Locate the required columns. Any missing one is fatal for the source.
    pub fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let position = |field: &str| headers.iter().position(|h| h.trim() == field);

        match (
            position("key"),
            position("name"),
            position("group"),
            position("score"),
        ) {
            (Some(key), Some(name), Some(group), Some(score)) => Ok(Self {
                key,
                name,
                group,
                score,
            }),
            _ => Err(Error::MissingHeaders {
                found: headers.iter().collect::<Vec<_>>().join(","),
            }),
        }
    }
}

/// Validate one data row and turn it into a record.
///
/// Checks run in a fixed order and stop at the first failure: key, score,
/// score range (only when `validate_range` is set), name, group.
pub fn parse_row(row: &csv::StringRecord, columns: &ColumnMap, validate_range: bool) -> RowResult {
    let field = |index: usize| row.get(index).unwrap_or("").trim();

    let key = parse_key(field(columns.key))?;
    let score = parse_score(field(columns.score))?;
    if validate_range && !(0.0..=100.0).contains(&score) {
        return Err(RowRejection::ScoreOutOfRange);
    }

    let name = field(columns.name);
    if name.is_empty() {
        return Err(RowRejection::EmptyName);
    }
    let group = field(columns.group);
    if group.is_empty() {
        return Err(RowRejection::EmptyGroup);
    }

    Ok(Record::new(key, name, group, score))
}

/// Plain decimal digits only: no sign, no whitespace inside.
fn parse_key(raw: &str) -> std::result::Result<Key, RowRejection> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RowRejection::InvalidKey);
    }
    raw.parse().map_err(|_| RowRejection::InvalidKey)
}

// NaN and infinities cannot be written to the JSON snapshot.
fn parse_score(raw: &str) -> std::result::Result<f64, RowRejection> {
    raw.parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
        .ok_or(RowRejection::InvalidScore)
}

/// Decimal text for a score that parses back to the same value.
///
/// Whole numbers keep one decimal place (`76.0`).
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.1}", score)
    } else {
        score.to_string()
    }
}

pub(crate) fn reader<R: io::Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source)
}

pub(crate) fn writer<W: io::Write>(destination: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().from_writer(destination)
}

pub(crate) fn write_header<W: io::Write>(writer: &mut csv::Writer<W>) -> csv::Result<()> {
    writer.write_record(HEADER)
}

pub(crate) fn write_record<W: io::Write>(
    writer: &mut csv::Writer<W>,
    record: &Record,
) -> csv::Result<()> {
    let key = record.key.to_string();
    let score = format_score(record.score);
    writer.write_record([
        key.as_str(),
        record.name.as_str(),
        record.group.as_str(),
        score.as_str(),
    ])
}
