//! Ingesta server library
//!
//! Exports full snapshots of the cinema operational stores to object storage.
//!
//! # Overview
//!
//! Each ingestion is a sequential extract → stage → upload pass:
//!
//! - **Sources**: PostgreSQL (`movies`, `showtimes`), MySQL (`users`),
//!   MongoDB (`bookings`) and a SQLite file (`cinemas`, `salas`)
//! - **Staging**: every dataset is written as CSV under a date partition
//! - **Storage**: staged files are uploaded to S3 under
//!   `{prefix}/{category}/date={YYYY-MM-DD}/{dataset}.csv`
//!
//! The same orchestrator backs the HTTP API (`ingesta-server`) and the
//! one-shot runner (`ingesta-run`).
//!
//! # Example
//!
//! ```no_run
//! use ingesta_server::{config::Config, ingest::Ingestor, sources::SourceKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let ingestor = Ingestor::from_config(&config).await;
//!     let records = ingestor.ingest_source(SourceKind::Sqlite).await?;
//!     println!("{}", serde_json::to_string_pretty(&records)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod sources;
pub mod staging;
pub mod storage;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{IngestError, IngestResult};
