use ingesta_common::Result;
use serde::{Deserialize, Serialize};

use crate::config::parse_or;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET: &str = "ingestacinema";
pub const DEFAULT_PREFIX: &str = "raw";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom S3-compatible endpoint (MinIO, LocalStack); `None` targets AWS
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Base prefix of every uploaded key
    pub prefix: String,
    /// Static credentials; when absent the default AWS provider chain is used
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl StorageConfig {
    pub(crate) fn from_lookup<F>(var: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: var("S3_ENDPOINT"),
            region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: var("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            prefix: var("S3_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            access_key: var("S3_ACCESS_KEY"),
            secret_key: var("S3_SECRET_KEY"),
            path_style: parse_or(var, "S3_PATH_STYLE", false)?,
        })
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            bucket: bucket.into(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }
}
