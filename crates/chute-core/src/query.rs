//! Statement text composition for SELECT, two-table JOIN SELECT and
//! multi-row INSERT.
//!
//! Composition is purely textual; no existence checks are made against the
//! store. Identifiers are validated (not quoted) and join predicates are
//! structured, so no caller-supplied raw SQL ever reaches statement text.

use serde::Deserialize;

use crate::error::TransferError;
use crate::value::FieldValue;

/// Reject anything that is not a plain (optionally qualified) identifier.
///
/// Identifiers are interpolated into statement text unquoted, so the
/// allowed alphabet is the safety boundary.
pub fn validate_identifier(name: &str) -> Result<(), TransferError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(TransferError::InvalidIdentifier(name.to_string()))
    }
}

fn validate_all(names: &[String]) -> Result<(), TransferError> {
    for name in names {
        validate_identifier(name)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Join predicates
// ---------------------------------------------------------------------------

/// Comparison operator of a join predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// Structured two-column join predicate: `left <op> right`.
///
/// Both sides are identifiers (typically table-qualified), never value
/// literals or free-form predicate text.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinOn {
    pub left: String,
    pub op: CompareOp,
    pub right: String,
}

impl JoinOn {
    pub fn eq(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            op: CompareOp::Eq,
            right: right.to_string(),
        }
    }

    pub fn to_sql(&self) -> Result<String, TransferError> {
        validate_identifier(&self.left)?;
        validate_identifier(&self.right)?;
        Ok(format!("{} {} {}", self.left, self.op.as_sql(), self.right))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// `SELECT <columns> FROM <table>`.
pub fn build_select(table: &str, columns: &[String]) -> Result<String, TransferError> {
    validate_identifier(table)?;
    validate_all(columns)?;
    if columns.is_empty() {
        return Err(TransferError::Query("no columns selected".to_string()));
    }
    Ok(format!("SELECT {} FROM {}", columns.join(", "), table))
}

/// `SELECT <columns> FROM <t0> JOIN <t1> ON <left> <op> <right>`.
///
/// Only the two-table form is supported.
pub fn build_join_select(
    tables: &[String; 2],
    columns: &[String],
    join: &JoinOn,
) -> Result<String, TransferError> {
    validate_all(tables)?;
    validate_all(columns)?;
    if columns.is_empty() {
        return Err(TransferError::Query("no columns selected".to_string()));
    }
    Ok(format!(
        "SELECT {} FROM {} JOIN {} ON {}",
        columns.join(", "),
        tables[0],
        tables[1],
        join.to_sql()?
    ))
}

/// `INSERT INTO <table> (<columns>) VALUES (..), (..)` with one value group
/// per row. Rows must already be aligned with `columns`.
pub fn build_insert(
    table: &str,
    columns: &[String],
    rows: &[Vec<FieldValue>],
) -> Result<String, TransferError> {
    validate_identifier(table)?;
    validate_all(columns)?;
    if columns.is_empty() {
        return Err(TransferError::Query("no columns to insert".to_string()));
    }
    if rows.is_empty() {
        return Err(TransferError::Query("no rows to insert".to_string()));
    }
    let groups: Vec<String> = rows
        .iter()
        .map(|row| {
            let literals: Vec<String> = row.iter().map(FieldValue::to_sql_literal).collect();
            format!("({})", literals.join(", "))
        })
        .collect();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        columns.join(", "),
        groups.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// QuerySpec
// ---------------------------------------------------------------------------

/// A caller-supplied, request-scoped query description.
#[derive(Debug, Clone)]
pub enum QuerySpec {
    /// Column-projected read of one table.
    Single { table: String, columns: Vec<String> },
    /// Two-table join read.
    Join {
        tables: [String; 2],
        columns: Vec<String>,
        on: JoinOn,
    },
}

impl QuerySpec {
    pub fn single(table: &str, columns: Vec<String>) -> Self {
        QuerySpec::Single {
            table: table.to_string(),
            columns,
        }
    }

    pub fn join(tables: [String; 2], columns: Vec<String>, on: JoinOn) -> Self {
        QuerySpec::Join {
            tables,
            columns,
            on,
        }
    }

    /// The projected column names, used for optional header lines.
    pub fn columns(&self) -> &[String] {
        match self {
            QuerySpec::Single { columns, .. } => columns,
            QuerySpec::Join { columns, .. } => columns,
        }
    }

    pub fn to_sql(&self) -> Result<String, TransferError> {
        match self {
            QuerySpec::Single { table, columns } => build_select(table, columns),
            QuerySpec::Join {
                tables,
                columns,
                on,
            } => build_join_select(tables, columns, on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // -- identifier validation ----------------------------------------------

    #[test]
    fn plain_and_qualified_identifiers_pass() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("t1.id").is_ok());
        assert!(validate_identifier("order_items_2024").is_ok());
    }

    #[test]
    fn hostile_identifiers_are_rejected() {
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(".id").is_err());
        assert!(validate_identifier("t.").is_err());
        assert!(validate_identifier("col\"").is_err());
    }

    // -- SELECT --------------------------------------------------------------

    #[test]
    fn select_composes() {
        let sql = build_select("users", &cols(&["id", "name"])).unwrap();
        assert_eq!(sql, "SELECT id, name FROM users");
    }

    #[test]
    fn select_single_column() {
        let sql = build_select("users", &cols(&["id"])).unwrap();
        assert_eq!(sql, "SELECT id FROM users");
    }

    #[test]
    fn select_requires_columns() {
        assert!(build_select("users", &[]).is_err());
    }

    #[test]
    fn select_rejects_hostile_table() {
        assert!(build_select("users; --", &cols(&["id"])).is_err());
    }

    // -- JOIN ----------------------------------------------------------------

    #[test]
    fn join_select_composes_exactly() {
        let sql = build_join_select(
            &["t1".to_string(), "t2".to_string()],
            &cols(&["t1.id", "t2.value"]),
            &JoinOn::eq("t1.id", "t2.id"),
        )
        .unwrap();
        assert_eq!(sql, "SELECT t1.id, t2.value FROM t1 JOIN t2 ON t1.id = t2.id");
    }

    #[test]
    fn join_supports_inequality_predicates() {
        let join = JoinOn {
            left: "a.ts".to_string(),
            op: CompareOp::Lte,
            right: "b.ts".to_string(),
        };
        let sql = build_join_select(
            &["a".to_string(), "b".to_string()],
            &cols(&["a.id"]),
            &join,
        )
        .unwrap();
        assert_eq!(sql, "SELECT a.id FROM a JOIN b ON a.ts <= b.ts");
    }

    #[test]
    fn join_predicate_rejects_raw_sql() {
        let join = JoinOn::eq("t1.id = t2.id OR 1=1", "t2.id");
        assert!(join.to_sql().is_err());
    }

    // -- INSERT ----------------------------------------------------------------

    #[test]
    fn insert_composes_multi_row() {
        let rows = vec![
            vec![FieldValue::Integer(1), FieldValue::Text("a".to_string())],
            vec![FieldValue::Integer(2), FieldValue::Text("b'c".to_string())],
        ];
        let sql = build_insert("users", &cols(&["id", "name"]), &rows).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO users (id, name) VALUES (1, 'a'), (2, 'b''c')"
        );
    }

    #[test]
    fn insert_requires_rows() {
        assert!(build_insert("users", &cols(&["id"]), &[]).is_err());
    }

    #[test]
    fn insert_rejects_hostile_column() {
        let rows = vec![vec![FieldValue::Integer(1)]];
        assert!(build_insert("users", &cols(&["id) VALUES (1); --"]), &rows).is_err());
    }

    // -- QuerySpec -------------------------------------------------------------

    #[test]
    fn query_spec_single_to_sql() {
        let spec = QuerySpec::single("events", cols(&["ts", "kind"]));
        assert_eq!(spec.to_sql().unwrap(), "SELECT ts, kind FROM events");
    }

    #[test]
    fn query_spec_join_to_sql() {
        let spec = QuerySpec::join(
            ["t1".to_string(), "t2".to_string()],
            cols(&["t1.id", "t2.value"]),
            JoinOn::eq("t1.id", "t2.id"),
        );
        assert_eq!(
            spec.to_sql().unwrap(),
            "SELECT t1.id, t2.value FROM t1 JOIN t2 ON t1.id = t2.id"
        );
    }

    #[test]
    fn compare_op_deserializes_snake_case() {
        let join: JoinOn =
            serde_json::from_str(r#"{"left":"t1.id","op":"eq","right":"t2.id"}"#).unwrap();
        assert_eq!(join.op, CompareOp::Eq);
    }
}
