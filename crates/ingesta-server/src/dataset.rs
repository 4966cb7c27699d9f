//! In-memory table snapshot produced by a connector

use serde_json::{Map, Value};
use std::collections::HashSet;

/// One row: column name to value, in the order the source returned the columns
pub type Record = Map<String, Value>;

/// A named, fully materialized table or collection
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Dataset {
    /// Dataset with a known column list (relational result metadata).
    ///
    /// Keys present in rows but missing from `columns` are appended in
    /// first-seen order.
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        let mut columns = columns;
        let mut seen: HashSet<String> = columns.iter().cloned().collect();
        extend_union(&mut columns, &mut seen, &rows);

        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Dataset whose columns are the ordered union of the keys of `rows`
    pub fn from_records(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self::new(name, Vec::new(), rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn extend_union(columns: &mut Vec<String>, seen: &mut HashSet<String>, rows: &[Record]) {
    for row in rows {
        for key in row.keys() {
            if !seen.contains(key) {
                seen.insert(key.clone());
                columns.push(key.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let rows = vec![
            record(json!({"_id": "a1", "user_id": 7, "seats": 2})),
            record(json!({"_id": "a2", "promo": "2x1", "user_id": 9})),
            record(json!({"status": "paid", "_id": "a3"})),
        ];

        let dataset = Dataset::from_records("bookings", rows);

        assert_eq!(
            dataset.columns(),
            &["_id", "user_id", "seats", "promo", "status"]
        );
        assert_eq!(dataset.row_count(), 3);
    }

    #[test]
    fn test_metadata_columns_come_first() {
        let rows = vec![record(json!({"id": 1, "title": "Alien"}))];
        let dataset = Dataset::new(
            "movies",
            vec!["id".into(), "title".into(), "year".into()],
            rows,
        );

        assert_eq!(dataset.columns(), &["id", "title", "year"]);
        assert_eq!(dataset.name(), "movies");
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dataset = Dataset::new("salas", vec!["id".into(), "cinema_id".into()], vec![]);
        assert!(dataset.is_empty());
        assert_eq!(dataset.columns().len(), 2);
    }
}
