//! Chute core - store-agnostic building blocks
//!
//! This crate provides the pieces of the transfer engine that do not touch
//! the store or the filesystem:
//! - typed field values and ordered records
//! - per-column coercion schemas for flat-file ingestion
//! - SELECT / JOIN / INSERT statement text composition

pub mod error;
pub mod query;
pub mod schema;
pub mod value;

pub use error::TransferError;
pub use query::{
    build_insert, build_join_select, build_select, validate_identifier, CompareOp, JoinOn,
    QuerySpec,
};
pub use schema::{CoercionMap, ColumnType};
pub use value::{FieldValue, Record};
