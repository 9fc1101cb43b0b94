//! Batched import: parsed records → store table.
//!
//! Records are written in consecutive batches of at most `batch_size` rows;
//! the batch is both the unit of insertion (one statement per batch) and
//! the unit of failure. The run halts at the first failing batch; batches
//! committed before it stay committed, and the error reports exactly how
//! many rows landed.

use thiserror::Error;
use tracing::{debug, info};

use chute_core::error::TransferError;
use chute_core::query::build_insert;
use chute_core::value::Record;

use crate::store::StoreSession;

/// Rows per insert statement when the caller does not say otherwise.
pub const DEFAULT_IMPORT_BATCH_SIZE: usize = 500;

/// An import run that failed partway through.
///
/// `inserted` counts the rows of all batches committed before the failure.
#[derive(Debug, Error)]
#[error("import halted after {inserted} rows: {source}")]
pub struct ImportError {
    pub inserted: u64,
    #[source]
    pub source: TransferError,
}

/// Insert `records` into `table` in batches of at most `batch_size` rows,
/// returning the total inserted.
///
/// The column list of each batch is derived from its first record; all
/// records in a batch carrying the same key set is the caller's contract
/// (the boundary projects every record through the same column list).
pub async fn import<S: StoreSession + ?Sized>(
    session: &mut S,
    table: &str,
    records: &[Record],
    batch_size: usize,
) -> Result<u64, ImportError> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut inserted = 0u64;
    for batch in records.chunks(batch_size.max(1)) {
        let columns = batch[0].columns();
        let rows: Vec<_> = batch.iter().map(Record::values).collect();
        let sql = build_insert(table, &columns, &rows).map_err(|source| ImportError {
            inserted,
            source,
        })?;
        session.execute(&sql).await.map_err(|source| ImportError {
            inserted,
            source,
        })?;
        inserted += batch.len() as u64;
        debug!(table, batch_rows = batch.len(), total = inserted, "batch committed");
    }

    info!(table, rows = inserted, "import complete");
    Ok(inserted)
}
