//! Typed field values and ordered records.
//!
//! A [`Record`] is one row of a flat file after coercion: an ordered
//! column-to-value mapping that preserves the header order of the source
//! file. The import engine consumes records; the flat-file reader produces
//! them.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::TransferError;

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single typed field of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

fn sanitize_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

impl FieldValue {
    /// Render this value as a SQL literal for statement text.
    ///
    /// Text values are single-quoted with embedded quotes doubled, so the
    /// rendered literal cannot terminate the string early.
    pub fn to_sql_literal(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("'{}'", sanitize_sql_string(s)),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(x) => x.to_string(),
            FieldValue::Null => "NULL".to_string(),
        }
    }

    /// The raw textual rendering, as written to export lines.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Float(x) => x.to_string(),
            FieldValue::Null => String::new(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Float(x) => serializer.serialize_f64(*x),
            FieldValue::Null => serializer.serialize_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row: an ordered mapping from column name to value.
///
/// Order is the header order of the file the record came from (or the
/// projection order requested by the caller). Serializes as a map, so a
/// preview of records is directly presentable.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Column names in record order.
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Values in record order.
    pub fn values(&self) -> Vec<FieldValue> {
        self.fields.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Project this record down to `columns`, in the given order.
    ///
    /// Every record of an import batch goes through the same projection, so
    /// all records in the batch end up with an identical key set.
    pub fn project(&self, columns: &[String]) -> Result<Record, TransferError> {
        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            let value = self.get(column).ok_or_else(|| {
                TransferError::Query(format!("column '{}' not present in record", column))
            })?;
            fields.push((column.clone(), value.clone()));
        }
        Ok(Record { fields })
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec() -> Record {
        Record::new(vec![
            ("id".to_string(), FieldValue::Integer(7)),
            ("name".to_string(), FieldValue::Text("ada".to_string())),
            ("age".to_string(), FieldValue::Integer(36)),
        ])
    }

    // -- literal rendering ---------------------------------------------------

    #[test]
    fn text_literal_is_quoted() {
        assert_eq!(
            FieldValue::Text("ada".to_string()).to_sql_literal(),
            "'ada'"
        );
    }

    #[test]
    fn text_literal_doubles_embedded_quotes() {
        let v = FieldValue::Text("'; DROP TABLE users; --".to_string());
        assert_eq!(v.to_sql_literal(), "'''; DROP TABLE users; --'");
    }

    #[test]
    fn numeric_literals_are_bare() {
        assert_eq!(FieldValue::Integer(-5).to_sql_literal(), "-5");
        assert_eq!(FieldValue::Float(19.99).to_sql_literal(), "19.99");
        assert_eq!(FieldValue::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn to_text_renders_plain() {
        assert_eq!(FieldValue::Integer(42).to_text(), "42");
        assert_eq!(FieldValue::Text("x,y".to_string()).to_text(), "x,y");
        assert_eq!(FieldValue::Null.to_text(), "");
    }

    // -- record --------------------------------------------------------------

    #[test]
    fn columns_and_values_preserve_order() {
        let r = rec();
        assert_eq!(r.columns(), vec!["id", "name", "age"]);
        assert_eq!(r.values()[1], FieldValue::Text("ada".to_string()));
    }

    #[test]
    fn project_selects_and_reorders() {
        let r = rec().project(&["age".to_string(), "id".to_string()]).unwrap();
        assert_eq!(r.columns(), vec!["age", "id"]);
        assert_eq!(r.get("age"), Some(&FieldValue::Integer(36)));
        assert_eq!(r.get("name"), None);
    }

    #[test]
    fn project_missing_column_is_an_error() {
        let err = rec().project(&["salary".to_string()]).unwrap_err();
        assert!(err.to_string().contains("salary"));
    }

    #[test]
    fn record_serializes_as_map() {
        let json = serde_json::to_value(rec()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "ada");
    }

    #[test]
    fn null_serializes_as_null() {
        let r = Record::new(vec![("x".to_string(), FieldValue::Null)]);
        let json = serde_json::to_value(r).unwrap();
        assert!(json["x"].is_null());
    }
}
