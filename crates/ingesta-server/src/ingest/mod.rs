//! Ingestion orchestrator
//!
//! Runs extract → stage → upload for one source or for every source in a
//! fixed order. Each call is stateless; a failure aborts the call and leaves
//! any objects already uploaded in place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    config::Config,
    error::IngestResult,
    sources::{Connectors, SourceKind},
    staging::StagingWriter,
    storage::{S3ObjectStore, Uploader},
};

/// Outcome of uploading one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Dataset name, e.g. `showtimes`
    pub source: String,
    pub rows: usize,
    pub s3_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Success,
}

/// Response of a full ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    pub status: IngestionStatus,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<UploadRecord>,
}

pub struct Ingestor {
    connectors: Connectors,
    staging: StagingWriter,
    uploader: Uploader,
}

impl Ingestor {
    pub fn new(connectors: Connectors, staging: StagingWriter, uploader: Uploader) -> Self {
        Self {
            connectors,
            staging,
            uploader,
        }
    }

    /// Wire the real connectors and S3 client from configuration
    pub async fn from_config(config: &Config) -> Self {
        let store = S3ObjectStore::new(&config.storage).await;
        let uploader = Uploader::new(
            Arc::new(store),
            config.storage.bucket.clone(),
            config.storage.prefix.clone(),
        );

        Self::new(
            Connectors::from_config(&config.sources),
            StagingWriter::new(config.staging.root.clone()),
            uploader,
        )
    }

    /// Ingest one source, partitioned under today's UTC date
    pub async fn ingest_source(&self, kind: SourceKind) -> IngestResult<Vec<UploadRecord>> {
        self.ingest_source_on(kind, today()).await
    }

    #[instrument(skip(self), fields(source = %kind))]
    pub async fn ingest_source_on(
        &self,
        kind: SourceKind,
        date: NaiveDate,
    ) -> IngestResult<Vec<UploadRecord>> {
        info!("Starting {} ingestion", kind.display_name());

        let datasets = self.connectors.get(kind).extract().await?;

        let mut records = Vec::with_capacity(datasets.len());
        for dataset in &datasets {
            let staged = self.staging.write(dataset, date).await?;
            let s3_uri = self
                .uploader
                .upload(&staged.path, kind.category(), &staged.filename, date)
                .await?;

            records.push(UploadRecord {
                source: dataset.name().to_string(),
                rows: dataset.row_count(),
                s3_uri,
            });
        }

        info!(datasets = records.len(), "Finished {} ingestion", kind.display_name());
        Ok(records)
    }

    /// Ingest every source in [`SourceKind::ALL`] order
    pub async fn ingest_all(&self) -> IngestResult<IngestionResult> {
        self.ingest_all_on(today()).await
    }

    #[instrument(skip(self))]
    pub async fn ingest_all_on(&self, date: NaiveDate) -> IngestResult<IngestionResult> {
        let mut sources = Vec::new();
        for kind in SourceKind::ALL {
            sources.extend(self.ingest_source_on(kind, date).await?);
        }

        info!(datasets = sources.len(), "Full ingestion complete");

        Ok(IngestionResult {
            status: IngestionStatus::Success,
            timestamp: Utc::now(),
            sources,
        })
    }
}

/// Partition date for a new request
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
