//! End-to-end transfer properties driven through a scripted store session.

use tempfile::tempdir;

use chute_connectors::export::{export, ExportSpec};
use chute_connectors::flatfile::read_all;
use chute_connectors::import::import;
use chute_connectors::testing::MockSession;
use chute_core::query::QuerySpec;
use chute_core::schema::{CoercionMap, ColumnType};
use chute_core::value::FieldValue;

fn table_rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| vec![i.to_string(), format!("user{}", i), (20 + i).to_string()])
        .collect()
}

fn users_query() -> QuerySpec {
    QuerySpec::single(
        "users",
        vec!["id".to_string(), "name".to_string(), "age".to_string()],
    )
}

fn users_coercion() -> CoercionMap {
    CoercionMap::new()
        .with_column("id", ColumnType::Integer)
        .with_column("age", ColumnType::Integer)
}

#[tokio::test]
async fn export_then_import_round_trips_row_count_and_contents() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("users.csv");

    // Export with a header line so the file is valid import input.
    let mut source = MockSession::with_rows(table_rows(137));
    let spec = ExportSpec::new(users_query()).with_header();
    let exported = export(&mut source, &spec, &file).await.unwrap();
    assert_eq!(exported, 137);

    // Read the file back and import it into an empty table of the same shape.
    let records = read_all(&file, b',', &users_coercion()).unwrap();
    assert_eq!(records.len(), 137);

    let mut target = MockSession::new();
    let imported = import(&mut target, "users_copy", &records, 50).await.unwrap();
    assert_eq!(imported, exported);

    // ceil(137 / 50) insert statements, all against the same column list.
    assert_eq!(target.executed.len(), 3);
    assert!(target
        .executed
        .iter()
        .all(|sql| sql.starts_with("INSERT INTO users_copy (id, name, age) VALUES")));

    // Sorted contents survive the trip: spot-check the first data row.
    assert_eq!(records[0].get("id"), Some(&FieldValue::Integer(0)));
    assert_eq!(
        records[0].get("name"),
        Some(&FieldValue::Text("user0".to_string()))
    );
    assert_eq!(records[136].get("age"), Some(&FieldValue::Integer(156)));
}

#[tokio::test]
async fn round_trip_of_empty_table_moves_nothing() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("empty.csv");

    let mut source = MockSession::with_rows(vec![]);
    let spec = ExportSpec::new(users_query()).with_header();
    assert_eq!(export(&mut source, &spec, &file).await.unwrap(), 0);

    let records = read_all(&file, b',', &users_coercion()).unwrap();
    assert!(records.is_empty());

    let mut target = MockSession::new();
    assert_eq!(import(&mut target, "users_copy", &records, 50).await.unwrap(), 0);
    assert!(target.executed.is_empty());
}
