//! Ingestion error types

use std::{fmt::Display, path::PathBuf};
use thiserror::Error;

use crate::sources::SourceKind;

/// Result type alias for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Everything that can abort an ingestion request.
///
/// Connection and query failures carry the human name of the store
/// ("PostgreSQL", "MongoDB", ...) so the message identifies the source.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unrecognized source: {0}")]
    UnknownSource(String),

    #[error("{source_name} connection error: {message}")]
    Connection {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} query error on {dataset}: {message}")]
    Query {
        source_name: &'static str,
        dataset: String,
        message: String,
    },

    #[error("failed to stage {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

impl IngestError {
    pub fn connection(kind: SourceKind, err: impl Display) -> Self {
        IngestError::Connection {
            source_name: kind.display_name(),
            message: err.to_string(),
        }
    }

    pub fn query(kind: SourceKind, dataset: &str, err: impl Display) -> Self {
        IngestError::Query {
            source_name: kind.display_name(),
            dataset: dataset.to_string(),
            message: err.to_string(),
        }
    }

    pub fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Staging {
            path: path.into(),
            source,
        }
    }

    /// Missing credential for a source, reported as a connection failure
    pub fn missing_setting(kind: SourceKind, variable: &str) -> Self {
        Self::connection(kind, format!("{} is not configured", variable))
    }

    /// True for the invalid-request case (client error rather than server error)
    pub fn is_client_error(&self) -> bool {
        matches!(self, IngestError::UnknownSource(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_source() {
        let err = IngestError::connection(SourceKind::Postgres, "connection refused");
        assert_eq!(err.to_string(), "PostgreSQL connection error: connection refused");

        let err = IngestError::query(SourceKind::Sqlite, "salas", "no such table: salas");
        assert_eq!(err.to_string(), "SQLite query error on salas: no such table: salas");

        let err = IngestError::missing_setting(SourceKind::Mongo, "MONGO_URI");
        assert_eq!(err.to_string(), "MongoDB connection error: MONGO_URI is not configured");
    }

    #[test]
    fn test_only_unknown_source_is_a_client_error() {
        assert!(IngestError::UnknownSource("oracle".into()).is_client_error());
        assert!(!IngestError::connection(SourceKind::Mysql, "timeout").is_client_error());
        let staging = IngestError::staging(
            "/data/users.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!staging.is_client_error());
        assert!(staging.to_string().starts_with("failed to stage /data/users.csv"));
    }
}
