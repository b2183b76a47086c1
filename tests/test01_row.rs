use std::sync::Arc;

use rqlite_client::prelude::*;

fn row(columns: &[&str], values: Vec<SqlValue>) -> Row {
    Row::new(
        Arc::new(columns.iter().map(|c| (*c).to_string()).collect()),
        values,
    )
}

#[test]
fn positional_and_name_access_agree_for_unique_names() {
    let row = row(
        &["id", "name"],
        vec![SqlValue::Int(1), SqlValue::Text("fiona".into())],
    );
    assert_eq!(row.len(), 2);
    assert_eq!(row.get_by_index(0), Some(&SqlValue::Int(1)));
    assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(row.get("name"), Some(&SqlValue::Text("fiona".into())));
    assert_eq!(row.get_by_index(1), row.get("name"));
}

#[test]
fn duplicate_names_are_preserved_positionally_and_first_match_by_name() {
    // A join of two tables both carrying an `id` column.
    let row = row(
        &["id", "name", "id"],
        vec![
            SqlValue::Int(1),
            SqlValue::Text("fiona".into()),
            SqlValue::Int(7),
        ],
    );
    assert_eq!(row.len(), 3);
    assert_eq!(row.get_by_index(0), Some(&SqlValue::Int(1)));
    assert_eq!(row.get_by_index(2), Some(&SqlValue::Int(7)));
    assert_ne!(row.get_by_index(0), row.get_by_index(2));
    // Name lookup resolves to the first matching column only.
    assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
}

#[test]
fn missing_lookups_return_none() {
    let row = row(&["a"], vec![SqlValue::Null]);
    assert_eq!(row.get("b"), None);
    assert_eq!(row.get_by_index(5), None);
    assert_eq!(row.get_column_index("nope"), None);
}

#[test]
fn iteration_follows_column_order() {
    let row = row(
        &["a", "b", "a"],
        vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)],
    );
    let pairs: Vec<(&str, &SqlValue)> = row.iter().collect();
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0], ("a", &SqlValue::Int(1)));
    assert_eq!(pairs[2], ("a", &SqlValue::Int(3)));
    assert_eq!(row.values().len(), 3);
}

#[test]
fn accessors_narrow_value_types() {
    let row = row(
        &["i", "f", "s", "b"],
        vec![
            SqlValue::Int(42),
            SqlValue::Float(3.5),
            SqlValue::Text("x".into()),
            SqlValue::Blob(vec![1, 2, 3]),
        ],
    );
    assert_eq!(row.get("i").and_then(SqlValue::as_int), Some(&42));
    assert_eq!(row.get("f").and_then(SqlValue::as_float), Some(3.5));
    assert_eq!(row.get("s").and_then(SqlValue::as_text), Some("x"));
    assert_eq!(
        row.get("b").and_then(SqlValue::as_blob),
        Some(&[1u8, 2, 3][..])
    );
    assert!(row.get("i").is_some_and(|v| !v.is_null()));
}
