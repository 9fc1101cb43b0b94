//! Typed errors for transfer operations.

use thiserror::Error;

/// Errors that can occur while moving data between the store and flat files.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to establish a session with the store.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A statement was rejected by the store or could not be composed.
    #[error("query failed: {0}")]
    Query(String),

    /// The requested table does not exist (or reports no columns).
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A table or column name contains characters that are not allowed
    /// in composed statement text.
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A textual field could not be converted to its declared column type.
    #[error("coercion failed for column '{column}': '{value}'")]
    Coercion { column: String, value: String },

    /// A flat file could not be parsed as delimited records.
    #[error("malformed flat file: {0}")]
    Parse(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// File open/read/write failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
