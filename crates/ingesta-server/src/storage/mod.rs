//! Object storage upload
//!
//! [`ObjectStore`] is the transport seam: [`S3ObjectStore`] talks to S3 (or an
//! S3-compatible endpoint), tests swap in an in-memory store. [`Uploader`] owns
//! the key layout `{prefix}/{category}/date={YYYY-MM-DD}/{filename}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use chrono::NaiveDate;
use std::{path::Path, sync::Arc};
use tracing::{debug, info, instrument};

use crate::error::{IngestError, IngestResult};

pub mod config;

/// Content type of staged files
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Whole-file transfer to a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the full contents of `path` to `bucket/key`, replacing any existing object
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;
}

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build an S3 client from the storage configuration.
    ///
    /// Static credentials are used when configured, otherwise the default AWS
    /// provider chain (environment, profile, instance role).
    pub async fn new(config: &config::StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "ingesta-storage",
            ));
        }

        let shared = loader.load().await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = %config.region,
            bucket = %config.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Storage client initialized"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, path))]
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        debug!("Uploading {} to s3://{}/{}", path.display(), bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(CSV_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .context("Failed to upload to S3")?;

        Ok(())
    }
}

/// Pushes staged files to `bucket` under the date-partitioned key layout
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `local_path` and return its locator `s3://{bucket}/{key}`
    #[instrument(skip(self, local_path))]
    pub async fn upload(
        &self,
        local_path: &Path,
        category: &str,
        filename: &str,
        date: NaiveDate,
    ) -> IngestResult<String> {
        let key = build_key(&self.prefix, category, date, filename);

        self.store
            .put_file(&self.bucket, &key, local_path)
            .await
            .map_err(|e| IngestError::Upload {
                key: key.clone(),
                message: format!("{:#}", e),
            })?;

        let uri = locator(&self.bucket, &key);
        info!("Successfully uploaded to {}", uri);

        Ok(uri)
    }
}

/// `{prefix}/{category}/date={YYYY-MM-DD}/{filename}`; an empty prefix is omitted
pub fn build_key(prefix: &str, category: &str, date: NaiveDate, filename: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let partition = format!("{}/date={}/{}", category, date.format("%Y-%m-%d"), filename);

    if prefix.is_empty() {
        partition
    } else {
        format!("{}/{}", prefix, partition)
    }
}

pub fn locator(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}
