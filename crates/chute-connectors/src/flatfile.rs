//! Delimited flat-file reading: bounded preview and strict full scan.
//!
//! Both entry points parse a header-bearing delimited file into [`Record`]s
//! with per-column coercion. They differ only in failure policy:
//! - `preview` favors visibility — a field that fails coercion keeps its
//!   untouched string value and the row is kept;
//! - `read_all` favors strictness — a row with any coercion failure is
//!   dropped with a diagnostic, so malformed rows never reach an insert.

use std::path::Path;

use tracing::{debug, warn};

use chute_core::error::TransferError;
use chute_core::schema::CoercionMap;
use chute_core::value::{FieldValue, Record};

/// Rows returned by a preview when the caller does not say otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

fn csv_error(e: csv::Error) -> TransferError {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => TransferError::Io(io),
        _ => TransferError::Parse(message),
    }
}

fn open_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>, TransferError> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)
}

fn headers(reader: &mut csv::Reader<std::fs::File>) -> Result<Vec<String>, TransferError> {
    Ok(reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect())
}

/// Read at most `max_rows` records from the start of the file.
///
/// Stops without consuming the rest of the file. Coercion is best-effort:
/// a failing field stays text, a short row keeps whatever fields exist.
pub fn preview(
    path: &Path,
    delimiter: u8,
    max_rows: usize,
    coercion: &CoercionMap,
) -> Result<Vec<Record>, TransferError> {
    let mut reader = open_reader(path, delimiter)?;
    let header = headers(&mut reader)?;

    let mut records = Vec::new();
    for result in reader.records().take(max_rows) {
        let row = result.map_err(csv_error)?;
        let mut fields = Vec::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            let Some(raw) = row.get(i) else { break };
            let value = coercion
                .coerce(name, raw)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string()));
            fields.push((name.clone(), value));
        }
        records.push(Record::new(fields));
    }

    debug!(path = %path.display(), rows = records.len(), "preview read");
    Ok(records)
}

/// Read the whole file, dropping rows that fail coercion.
///
/// Each dropped row is reported with a diagnostic; file-level IO and parse
/// errors still propagate.
pub fn read_all(
    path: &Path,
    delimiter: u8,
    coercion: &CoercionMap,
) -> Result<Vec<Record>, TransferError> {
    let mut reader = open_reader(path, delimiter)?;
    let header = headers(&mut reader)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    'rows: for (line, result) in reader.records().enumerate() {
        let row = result.map_err(csv_error)?;
        if row.len() < header.len() {
            warn!(
                path = %path.display(),
                line = line + 2,
                fields = row.len(),
                expected = header.len(),
                "skipping short row"
            );
            skipped += 1;
            continue;
        }
        let mut fields = Vec::with_capacity(header.len());
        for (i, name) in header.iter().enumerate() {
            let raw = row.get(i).unwrap_or_default();
            match coercion.coerce(name, raw) {
                Ok(value) => fields.push((name.clone(), value)),
                Err(e) => {
                    warn!(path = %path.display(), line = line + 2, error = %e, "skipping row");
                    skipped += 1;
                    continue 'rows;
                }
            }
        }
        records.push(Record::new(fields));
    }

    debug!(
        path = %path.display(),
        rows = records.len(),
        skipped,
        "full scan complete"
    );
    Ok(records)
}
