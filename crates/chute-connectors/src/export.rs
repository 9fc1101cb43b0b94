//! Streaming export: store query → delimited flat file.
//!
//! Rows are pulled from the session's streaming cursor one at a time and
//! written through a buffered sink, so memory stays bounded regardless of
//! result size. The sink is opened once and closed on every exit path; a
//! partial file produced by a mid-stream failure is kept as-is.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use chute_core::error::TransferError;
use chute_core::query::QuerySpec;

use crate::store::StoreSession;

/// Rows per flush when the caller does not say otherwise.
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 1000;

/// How an export run writes its sink.
#[derive(Debug, Clone)]
pub struct ExportSpec {
    pub query: QuerySpec,
    /// Flush interval in rows; also the chunking unit of the write loop.
    pub batch_size: usize,
    /// Field separator of the produced file.
    pub output_delimiter: char,
    /// Write the projected column names as the first line.
    pub include_header: bool,
}

impl ExportSpec {
    pub fn new(query: QuerySpec) -> Self {
        Self {
            query,
            batch_size: DEFAULT_EXPORT_BATCH_SIZE,
            output_delimiter: ',',
            include_header: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_header(mut self) -> Self {
        self.include_header = true;
        self
    }
}

/// Run the export and return the number of data rows written.
///
/// Single-column results go through the same path as multi-column ones —
/// every row arrives as a field vector and is joined the same way, so a
/// scalar 42 produces the line `42`.
pub async fn export<S: StoreSession + ?Sized>(
    session: &mut S,
    spec: &ExportSpec,
    sink_path: &Path,
) -> Result<u64, TransferError> {
    let sql = spec.query.to_sql()?;
    debug!(%sql, sink = %sink_path.display(), "starting export");

    let delimiter = spec.output_delimiter.to_string();
    // Fields are public; guard against a directly-constructed zero batch size.
    let flush_every = spec.batch_size.max(1) as u64;
    let file = File::create(sink_path).await?;
    let mut writer = BufWriter::new(file);

    if spec.include_header {
        let mut header = spec.query.columns().join(&delimiter);
        header.push('\n');
        writer.write_all(header.as_bytes()).await?;
    }

    let mut rows_written = 0u64;
    {
        let mut rows = session.fetch_stream(&sql).await?;
        while let Some(row) = rows.next().await {
            let row = row?;
            let mut line = row.join(&delimiter);
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            rows_written += 1;
            if rows_written % flush_every == 0 {
                writer.flush().await?;
            }
        }
    }

    writer.flush().await?;
    writer.shutdown().await?;

    info!(rows = rows_written, sink = %sink_path.display(), "export complete");
    Ok(rows_written)
}
