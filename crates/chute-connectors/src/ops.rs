//! Operation boundary: typed requests in, uniform success/error result out.
//!
//! One function per transfer operation. Each opens its own connector, runs
//! the engine, and converts every failure into an [`OpError`] carrying the
//! error text and any partial row count. The transport layer that routes
//! requests and speaks JSON over the wire is not part of this crate; it
//! deserializes into these request types and serializes the [`reply`]
//! shape back out.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::error;

use chute_core::error::TransferError;
use chute_core::query::{JoinOn, QuerySpec};
use chute_core::schema::{CoercionMap, ColumnType};
use chute_core::value::Record;

use crate::config::EngineConfig;
use crate::export::{export, ExportSpec};
use crate::flatfile;
use crate::import::{import, ImportError};
use crate::store::{self, ConnectionParams, StoreConnector};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub table: String,
    pub columns: Vec<String>,
    pub output_file: PathBuf,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub output_delimiter: Option<char>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinExportRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub tables: [String; 2],
    pub columns: Vec<String>,
    pub join: JoinOn,
    pub output_file: PathBuf,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub output_delimiter: Option<char>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub file_path: PathBuf,
    pub target_table: String,
    /// Column subset to insert; every record is projected through this
    /// list, so all records in a batch share one key set.
    pub columns: Vec<String>,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub column_types: Option<HashMap<String, ColumnType>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub column_types: Option<HashMap<String, ColumnType>>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Successful outcome of one operation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Tables { tables: Vec<String> },
    Columns { columns: Vec<String> },
    Count { count: u64 },
    Preview { preview: Vec<Record> },
}

/// Failed outcome; `rows_processed` is non-zero when some batches were
/// committed before the failure.
#[derive(Debug, Serialize)]
pub struct OpError {
    pub error: String,
    pub rows_processed: u64,
}

pub type OpResult = Result<Outcome, OpError>;

impl From<TransferError> for OpError {
    fn from(e: TransferError) -> Self {
        OpError {
            error: e.to_string(),
            rows_processed: 0,
        }
    }
}

impl From<ImportError> for OpError {
    fn from(e: ImportError) -> Self {
        OpError {
            error: e.to_string(),
            rows_processed: e.inserted,
        }
    }
}

/// Render an [`OpResult`] as the uniform transport reply:
/// `{"success": true, ...}` or `{"success": false, "error": ..}`.
pub fn reply(result: OpResult) -> serde_json::Value {
    match result {
        Ok(outcome) => {
            let mut value = serde_json::to_value(&outcome)
                .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
            if let Some(map) = value.as_object_mut() {
                map.insert("success".to_string(), serde_json::Value::Bool(true));
            }
            value
        }
        Err(e) => serde_json::json!({
            "success": false,
            "error": e.error,
            "rows_processed": e.rows_processed,
        }),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn delimiter_byte(delimiter: Option<char>) -> Result<u8, TransferError> {
    let c = delimiter.unwrap_or(',');
    u8::try_from(c as u32)
        .map_err(|_| TransferError::Config(format!("delimiter '{}' is not a single byte", c)))
}

fn coercion_map(column_types: &Option<HashMap<String, ColumnType>>) -> CoercionMap {
    column_types
        .clone()
        .map(CoercionMap::from_map)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Open a session and list the store's tables.
pub async fn connect_store(req: &ConnectRequest) -> OpResult {
    let run = async {
        let connector = StoreConnector::connect(&req.connection).await?;
        let mut session = connector.session().await?;
        let tables = store::list_tables(&mut session).await?;
        drop(session);
        connector.close().await;
        Ok::<_, TransferError>(Outcome::Tables { tables })
    };
    run.await.map_err(fail)
}

/// Describe one table's columns.
pub async fn fetch_columns(req: &ColumnsRequest) -> OpResult {
    let run = async {
        let connector = StoreConnector::connect(&req.connection).await?;
        let mut session = connector.session().await?;
        let columns = store::describe_table(&mut session, &req.table).await?;
        drop(session);
        connector.close().await;
        Ok::<_, TransferError>(Outcome::Columns { columns })
    };
    run.await.map_err(fail)
}

/// Stream a column-projected table to a flat file.
pub async fn export_table(req: &ExportRequest, config: &EngineConfig) -> OpResult {
    let spec = export_spec(
        QuerySpec::single(&req.table, req.columns.clone()),
        req.batch_size,
        req.output_delimiter,
        config,
    );
    run_export(&req.connection, &spec, &req.output_file).await
}

/// Stream a two-table join to a flat file.
pub async fn export_join(req: &JoinExportRequest, config: &EngineConfig) -> OpResult {
    let spec = export_spec(
        QuerySpec::join(req.tables.clone(), req.columns.clone(), req.join.clone()),
        req.batch_size,
        req.output_delimiter,
        config,
    );
    run_export(&req.connection, &spec, &req.output_file).await
}

fn export_spec(
    query: QuerySpec,
    batch_size: Option<usize>,
    output_delimiter: Option<char>,
    config: &EngineConfig,
) -> ExportSpec {
    let mut spec =
        ExportSpec::new(query).with_batch_size(batch_size.unwrap_or(config.export_batch_size));
    if let Some(delimiter) = output_delimiter {
        spec.output_delimiter = delimiter;
    }
    spec
}

async fn run_export(
    connection: &ConnectionParams,
    spec: &ExportSpec,
    output_file: &std::path::Path,
) -> OpResult {
    let run = async {
        let connector = StoreConnector::connect(connection).await?;
        let mut session = connector.session().await?;
        let count = export(&mut session, spec, output_file).await?;
        drop(session);
        connector.close().await;
        Ok::<_, TransferError>(Outcome::Count { count })
    };
    run.await.map_err(fail)
}

/// Ingest a flat file into a store table in batches.
pub async fn import_file(req: &ImportRequest, config: &EngineConfig) -> OpResult {
    let records = read_projected(req).map_err(fail)?;
    let batch_size = req.batch_size.unwrap_or(config.import_batch_size);

    let connector = StoreConnector::connect(&req.connection)
        .await
        .map_err(fail)?;
    let mut session = connector.session().await.map_err(fail)?;
    let result = import(&mut session, &req.target_table, &records, batch_size).await;
    drop(session);
    connector.close().await;

    match result {
        Ok(count) => Ok(Outcome::Count { count }),
        Err(e) => {
            error!(error = %e, "import failed");
            Err(OpError::from(e))
        }
    }
}

/// Parse the import file and project every record to the requested columns.
fn read_projected(req: &ImportRequest) -> Result<Vec<Record>, TransferError> {
    let delimiter = delimiter_byte(req.delimiter)?;
    let coercion = coercion_map(&req.column_types);
    let records = flatfile::read_all(&req.file_path, delimiter, &coercion)?;
    records
        .iter()
        .map(|record| record.project(&req.columns))
        .collect()
}

/// Bounded preview of a flat file; no store session involved.
pub async fn preview_file(req: &PreviewRequest, config: &EngineConfig) -> OpResult {
    let run = || {
        let delimiter = delimiter_byte(req.delimiter)?;
        let coercion = coercion_map(&req.column_types);
        let max_rows = req.max_rows.unwrap_or(config.preview_rows);
        let preview = flatfile::preview(&req.file_path, delimiter, max_rows, &coercion)?;
        Ok::<_, TransferError>(Outcome::Preview { preview })
    };
    run().map_err(fail)
}

fn fail(e: TransferError) -> OpError {
    error!(error = %e, "operation failed");
    OpError::from(e)
}
