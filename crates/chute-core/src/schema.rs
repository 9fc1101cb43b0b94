//! Per-column type coercion for flat-file ingestion.
//!
//! Callers describe which columns carry typed data; everything else stays
//! text. The map is supplied per request, so two files with different
//! shapes never share coercion rules.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::TransferError;
use crate::value::FieldValue;

/// Declared type of a flat-file column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

/// Column-name → declared-type map driving text-to-typed conversion.
///
/// Unmapped columns pass through as [`FieldValue::Text`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CoercionMap {
    columns: HashMap<String, ColumnType>,
}

impl CoercionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(columns: HashMap<String, ColumnType>) -> Self {
        Self { columns }
    }

    /// Builder-style registration of one typed column.
    pub fn with_column(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.insert(name.to_string(), ty);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert one raw field to its declared type.
    ///
    /// Whether a failure drops the row or keeps the raw text is the
    /// caller's policy (strict full scan vs. best-effort preview).
    pub fn coerce(&self, column: &str, raw: &str) -> Result<FieldValue, TransferError> {
        let fail = || TransferError::Coercion {
            column: column.to_string(),
            value: raw.to_string(),
        };
        match self.columns.get(column) {
            None | Some(ColumnType::Text) => Ok(FieldValue::Text(raw.to_string())),
            Some(ColumnType::Integer) => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| fail()),
            Some(ColumnType::Float) => raw
                .trim()
                .parse::<f64>()
                .map(FieldValue::Float)
                .map_err(|_| fail()),
        }
    }
}
