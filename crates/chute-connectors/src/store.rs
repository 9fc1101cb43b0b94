//! Store connectivity: connection parameters, pooled sessions and schema
//! introspection.
//!
//! The engines are written against the [`StoreSession`] trait so the store
//! protocol stays a pluggable collaborator; the shipped implementation
//! speaks the Postgres wire protocol via sqlx. Each logical operation
//! acquires exactly one session and the pool guarantees its return when the
//! session is dropped, on success and on failure alike.

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, info};

use chute_core::error::TransferError;
use chute_core::query::validate_identifier;

/// Ports on which the store terminates TLS. Any other port connects
/// unencrypted.
pub const SECURE_PORTS: [u16; 2] = [9440, 8443];

// ---------------------------------------------------------------------------
// Connection parameters
// ---------------------------------------------------------------------------

/// Caller-supplied, request-scoped connection parameters.
///
/// `credential` is a password-equivalent secret (e.g. a bearer token used
/// as the password); it is redacted from debug output.
#[derive(Clone, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub credential: String,
}

impl ConnectionParams {
    /// Whether the port implies an encrypted session.
    pub fn is_secure(&self) -> bool {
        SECURE_PORTS.contains(&self.port)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("credential", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// StoreSession trait
// ---------------------------------------------------------------------------

/// Query-execution capability of one store session.
///
/// `fetch_all` materializes a result set; `fetch_stream` yields rows one at
/// a time without holding the full result in memory — the export engine
/// only ever uses the streaming form.
#[async_trait]
pub trait StoreSession: Send {
    /// Execute `sql` and return the whole result set as text rows.
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<String>>, TransferError>;

    /// Execute `sql` and stream result rows without materializing them.
    async fn fetch_stream<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> Result<BoxStream<'a, Result<Vec<String>, TransferError>>, TransferError>;

    /// Execute a statement (INSERT path) and return rows affected.
    async fn execute(&mut self, sql: &str) -> Result<u64, TransferError>;
}

// ---------------------------------------------------------------------------
// StoreConnector — pooled sqlx implementation
// ---------------------------------------------------------------------------

/// An authenticated handle to the store, owning a small connection pool.
///
/// One connector per engine call; not shared or reused across requests.
pub struct StoreConnector {
    pool: PgPool,
}

impl StoreConnector {
    /// Open a pool against the store described by `params`.
    ///
    /// Transport security is decided by the port: [`SECURE_PORTS`] require
    /// TLS, everything else connects plain.
    pub async fn connect(params: &ConnectionParams) -> Result<Self, TransferError> {
        let ssl_mode = if params.is_secure() {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.database)
            .username(&params.user)
            .password(&params.credential)
            .ssl_mode(ssl_mode);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;

        info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            secure = params.is_secure(),
            "store connection opened"
        );

        Ok(Self { pool })
    }

    /// Acquire one session from the pool. The session returns to the pool
    /// when dropped, whether the operation succeeded or failed.
    pub async fn session(&self) -> Result<PgSession, TransferError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;
        Ok(PgSession { conn })
    }

    /// Close the pool explicitly. Dropping the connector also releases it.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// One pooled store session.
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl StoreSession for PgSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<String>>, TransferError> {
        debug!(%sql, "fetch_all");
        let rows = sqlx::query(sql)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(row_to_text).collect())
    }

    async fn fetch_stream<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> Result<BoxStream<'a, Result<Vec<String>, TransferError>>, TransferError> {
        debug!(%sql, "fetch_stream");
        let stream = sqlx::query(sql)
            .fetch(&mut *self.conn)
            .map(|item| match item {
                Ok(row) => Ok(row_to_text(&row)),
                Err(e) => Err(query_error(e)),
            })
            .boxed();
        Ok(stream)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, TransferError> {
        debug!(%sql, "execute");
        let done = sqlx::query(sql)
            .execute(&mut *self.conn)
            .await
            .map_err(query_error)?;
        Ok(done.rows_affected())
    }
}

fn query_error(e: sqlx::Error) -> TransferError {
    match e {
        sqlx::Error::Io(io) => TransferError::Connection(io.to_string()),
        other => TransferError::Query(other.to_string()),
    }
}

/// Render one wire row as text fields.
///
/// Columns are probed from narrowest numeric type to text; NULL renders as
/// an empty field, matching the export line format.
fn row_to_text(row: &PgRow) -> Vec<String> {
    (0..row.columns().len())
        .map(|i| {
            if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(i) {
                return v.to_string();
            }
            if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(i) {
                return v.to_string();
            }
            if let Ok(Some(v)) = row.try_get::<Option<i16>, _>(i) {
                return v.to_string();
            }
            if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(i) {
                return v.to_string();
            }
            if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(i) {
                return v.to_string();
            }
            if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(i) {
                return v.to_string();
            }
            row.try_get::<Option<String>, _>(i)
                .ok()
                .flatten()
                .unwrap_or_default()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Schema introspection
// ---------------------------------------------------------------------------

const LIST_TABLES_SQL: &str =
    "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'";

/// List table names in store-reported order (no re-sorting).
pub async fn list_tables<S: StoreSession + ?Sized>(
    session: &mut S,
) -> Result<Vec<String>, TransferError> {
    let rows = session.fetch_all(LIST_TABLES_SQL).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect())
}

/// Ordered column names of one table, derived on demand (never cached).
///
/// A table with no reported columns does not exist as far as the transfer
/// engine is concerned.
pub async fn describe_table<S: StoreSession + ?Sized>(
    session: &mut S,
    table: &str,
) -> Result<Vec<String>, TransferError> {
    validate_identifier(table)?;
    let sql = format!(
        "SELECT column_name FROM information_schema.columns \
         WHERE table_name = '{}' ORDER BY ordinal_position",
        table
    );
    let rows = session.fetch_all(&sql).await?;
    if rows.is_empty() {
        return Err(TransferError::TableNotFound(table.to_string()));
    }
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect())
}
