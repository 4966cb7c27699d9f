//! In-process stand-ins for connectors and object storage
//!
//! Used by the unit tests and the integration tests under `tests/`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    dataset::{Dataset, Record},
    error::{IngestError, IngestResult},
    sources::{Connectors, SourceConnector, SourceKind},
    storage::ObjectStore,
};

/// Returns the same datasets on every call
#[derive(Debug, Clone)]
pub struct StaticConnector {
    datasets: Vec<Dataset>,
}

impl StaticConnector {
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self { datasets }
    }
}

#[async_trait]
impl SourceConnector for StaticConnector {
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        Ok(self.datasets.clone())
    }
}

/// Fails every call with a connection error for `kind`
#[derive(Debug, Clone, Copy)]
pub struct FailingConnector {
    kind: SourceKind,
}

impl FailingConnector {
    pub fn new(kind: SourceKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl SourceConnector for FailingConnector {
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        Err(IngestError::connection(self.kind, "connection refused"))
    }
}

/// Object store keeping uploads in memory, keyed by `(bucket, key)`
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock().get(&(bucket.to_string(), key.to_string())).cloned()
    }

    /// Stored keys across all buckets, sorted
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().map(|(_, key)| key.clone()).collect()
    }

    pub fn put_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> anyhow::Result<()> {
        let body = tokio::fs::read(path).await?;
        self.lock().insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}

/// Rejects every upload
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingObjectStore;

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn put_file(&self, bucket: &str, _key: &str, _path: &Path) -> anyhow::Result<()> {
        anyhow::bail!("access denied to bucket {}", bucket)
    }
}

/// Build a record from a JSON object literal; non-objects yield an empty record
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn dataset(name: &str, rows: Vec<Value>) -> Dataset {
    Dataset::from_records(name, rows.into_iter().map(record).collect())
}

pub fn postgres_connector() -> StaticConnector {
    StaticConnector::new(vec![
        dataset(
            "movies",
            vec![
                json!({"id": 1, "title": "Alien", "duration_min": 117}),
                json!({"id": 2, "title": "Roma", "duration_min": 135}),
            ],
        ),
        dataset(
            "showtimes",
            vec![
                json!({"id": 10, "movie_id": 1, "sala_id": 3, "starts_at": "2024-03-01T18:00:00"}),
                json!({"id": 11, "movie_id": 1, "sala_id": 3, "starts_at": "2024-03-01T21:00:00"}),
                json!({"id": 12, "movie_id": 2, "sala_id": 1, "starts_at": "2024-03-01T20:30:00"}),
            ],
        ),
    ])
}

pub fn mysql_connector() -> StaticConnector {
    StaticConnector::new(vec![dataset(
        "users",
        vec![json!({"id": 7, "email": "ana@example.com", "active": 1})],
    )])
}

pub fn mongo_connector() -> StaticConnector {
    StaticConnector::new(vec![dataset(
        "bookings",
        vec![
            json!({"_id": "65e1a0c2f1d2c3b4a5968778", "user_id": 7, "seats": ["C4", "C5"]}),
            json!({"_id": "65e1a0c2f1d2c3b4a5968779", "user_id": 7, "promo": "2x1"}),
        ],
    )])
}

pub fn sqlite_connector() -> StaticConnector {
    StaticConnector::new(vec![
        dataset(
            "cinemas",
            vec![json!({"id": 1, "name": "Centro", "city": "Lima"})],
        ),
        dataset(
            "salas",
            vec![
                json!({"id": 1, "cinema_id": 1, "capacity": 120}),
                json!({"id": 3, "cinema_id": 1, "capacity": 80}),
            ],
        ),
    ])
}

/// Static connectors for all four sources
pub fn sample_connectors() -> Connectors {
    Connectors::new(
        Arc::new(postgres_connector()),
        Arc::new(mysql_connector()),
        Arc::new(mongo_connector()),
        Arc::new(sqlite_connector()),
    )
}
