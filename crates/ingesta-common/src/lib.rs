//! Ingesta Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the Ingesta workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`IngestaError`] and the [`Result`] alias used for
//!   configuration and startup failures
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`], the single
//!   place where the global `tracing` subscriber is installed
//!
//! # Example
//!
//! ```no_run
//! use ingesta_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> ingesta_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!     info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{IngestaError, Result};
