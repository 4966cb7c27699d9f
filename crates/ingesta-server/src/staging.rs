//! Local CSV staging
//!
//! Datasets are written to `{root}/{dataset}/date={YYYY-MM-DD}/{dataset}.csv`
//! before upload. Re-staging the same dataset on the same day overwrites the
//! previous file in place.

use chrono::NaiveDate;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::{
    dataset::Dataset,
    error::{IngestError, IngestResult},
};

/// Extension of staged files
pub const STAGED_EXTENSION: &str = "csv";

/// A file written by [`StagingWriter::write`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct StagingWriter {
    root: PathBuf,
}

impl StagingWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the staged file of `dataset` for `date`
    pub fn partition_dir(&self, dataset: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join(dataset)
            .join(format!("date={}", date.format("%Y-%m-%d")))
    }

    #[instrument(skip(self, dataset), fields(dataset = dataset.name(), rows = dataset.row_count()))]
    pub async fn write(&self, dataset: &Dataset, date: NaiveDate) -> IngestResult<StagedFile> {
        let dir = self.partition_dir(dataset.name(), date);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| IngestError::staging(&dir, e))?;

        let filename = format!("{}.{}", dataset.name(), STAGED_EXTENSION);
        let path = dir.join(&filename);

        let contents = encode_csv(dataset).map_err(|e| IngestError::staging(&path, e))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| IngestError::staging(&path, e))?;

        debug!(path = %path.display(), "Dataset staged");

        Ok(StagedFile { path, filename })
    }
}

/// Serialize a dataset as CSV: header row of column names, then one line per row.
///
/// A dataset without columns yields an empty document.
pub fn encode_csv(dataset: &Dataset) -> std::io::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if !dataset.columns().is_empty() {
        writer.write_record(dataset.columns())?;

        for row in dataset.rows() {
            writer.write_record(dataset.columns().iter().map(|column| render_cell(row.get(column))))?;
        }
    }

    writer.into_inner().map_err(|e| e.into_error())
}

/// Text form of one cell; absent and null values are empty
fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_encode_csv_fills_absent_fields() {
        let dataset = Dataset::from_records(
            "bookings",
            vec![
                record(json!({"_id": "b1", "seats": 2, "paid": true})),
                record(json!({"_id": "b2", "extras": ["popcorn"], "note": "aisle, please"})),
            ],
        );

        let csv = String::from_utf8(encode_csv(&dataset).unwrap()).unwrap();

        assert_eq!(
            csv,
            "_id,seats,paid,extras,note\n\
             b1,2,true,,\n\
             b2,,,\"[\"\"popcorn\"\"]\",\"aisle, please\"\n"
        );
    }

    #[test]
    fn test_encode_csv_header_only_for_empty_table() {
        let dataset = Dataset::new("salas", vec!["id".into(), "name".into()], vec![]);
        assert_eq!(encode_csv(&dataset).unwrap(), b"id,name\n");

        let no_columns = Dataset::from_records("bookings", vec![]);
        assert!(encode_csv(&no_columns).unwrap().is_empty());
    }

    #[test]
    fn test_render_cell_null_is_empty() {
        assert_eq!(render_cell(Some(&Value::Null)), "");
        assert_eq!(render_cell(Some(&json!(4.5))), "4.5");
        assert_eq!(render_cell(Some(&json!({"a": 1}))), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_write_uses_date_partition() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StagingWriter::new(dir.path());
        let dataset = Dataset::from_records("movies", vec![record(json!({"id": 1}))]);

        let staged = writer.write(&dataset, date()).await.unwrap();

        assert_eq!(staged.filename, "movies.csv");
        assert_eq!(
            staged.path,
            dir.path().join("movies").join("date=2024-03-01").join("movies.csv")
        );
        assert_eq!(std::fs::read_to_string(&staged.path).unwrap(), "id\n1\n");
    }

    #[tokio::test]
    async fn test_second_write_same_day_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StagingWriter::new(dir.path());

        let first = Dataset::from_records(
            "users",
            vec![record(json!({"id": 1, "name": "Ana"})), record(json!({"id": 2, "name": "Luis"}))],
        );
        let second = Dataset::from_records("users", vec![record(json!({"id": 3, "name": "Eva"}))]);

        let a = writer.write(&first, date()).await.unwrap();
        let b = writer.write(&second, date()).await.unwrap();

        assert_eq!(a.path, b.path);
        assert_eq!(std::fs::read_to_string(&b.path).unwrap(), "id,name\n3,Eva\n");
    }

    #[tokio::test]
    async fn test_write_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let writer = StagingWriter::new(&blocker);
        let dataset = Dataset::from_records("cinemas", vec![record(json!({"id": 1}))]);

        let err = writer.write(&dataset, date()).await.unwrap_err();
        assert!(matches!(err, IngestError::Staging { .. }));
    }
}
