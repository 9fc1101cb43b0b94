//! Chute connectors - everything that touches the outside world
//!
//! This crate provides:
//! - store connectivity and schema introspection ([`store`])
//! - delimited flat-file reading with bounded preview ([`flatfile`])
//! - the streaming export and batched import engines ([`export`], [`import`])
//! - the operation boundary converting engine results into a uniform
//!   success/error reply ([`ops`])
//!
//! Engines are written against the [`store::StoreSession`] trait; the
//! [`testing`] module ships a scripted in-memory session for tests.

pub mod config;
pub mod export;
pub mod flatfile;
pub mod import;
pub mod ops;
pub mod store;
pub mod testing;

pub use config::EngineConfig;
pub use export::{export, ExportSpec, DEFAULT_EXPORT_BATCH_SIZE};
pub use flatfile::{preview, read_all, DEFAULT_PREVIEW_ROWS};
pub use import::{import, ImportError, DEFAULT_IMPORT_BATCH_SIZE};
pub use store::{
    describe_table, list_tables, ConnectionParams, PgSession, StoreConnector, StoreSession,
    SECURE_PORTS,
};
