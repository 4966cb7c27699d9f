//! Configuration management
//!
//! The whole process configuration is read once at startup into [`Config`] and
//! passed down explicitly. Nothing below `main` reads the environment.

use ingesta_common::{IngestaError, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr};

use crate::storage::config::StorageConfig;

// ============================================================================
// Defaults
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default local staging root for CSV files before upload.
pub const DEFAULT_STAGING_DIR: &str = "/data_ingesta";

pub const DEFAULT_PG_PORT: u16 = 5432;
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_MONGO_DB: &str = "bookingsdb";
pub const DEFAULT_SQLITE_PATH: &str = "/mnt/theaters/theaters.db";

/// Process-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub staging: StagingConfig,
    pub storage: StorageConfig,
    pub sources: SourcesConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    pub root: PathBuf,
}

/// Connection settings for every backing store.
///
/// Credentials are optional here; a missing value only fails the ingestion of
/// the source that needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub postgres: RelationalConfig,
    pub mysql: RelationalConfig,
    pub mongo: MongoConfig,
    pub sqlite: SqliteConfig,
}

/// Host/port/user/password/database for a networked relational store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationalConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    #[serde(skip_serializing)]
    pub uri: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: DEFAULT_MONGO_DB.to_string(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let relational = |prefix: &str, default_port: u16| -> Result<RelationalConfig> {
            Ok(RelationalConfig {
                host: var(&format!("{}_HOST", prefix)),
                port: parse_or(&var, &format!("{}_PORT", prefix), default_port)?,
                user: var(&format!("{}_USER", prefix)),
                password: var(&format!("{}_PASSWORD", prefix)),
                database: var(&format!("{}_DB", prefix)),
            })
        };

        Ok(Config {
            server: ServerConfig {
                host: var("INGESTA_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parse_or(&var, "INGESTA_PORT", DEFAULT_SERVER_PORT)?,
                shutdown_timeout_secs: parse_or(
                    &var,
                    "INGESTA_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                )?,
            },
            staging: StagingConfig {
                root: var("INGESTA_STAGING_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            },
            storage: StorageConfig::from_lookup(&var)?,
            sources: SourcesConfig {
                postgres: relational("PG", DEFAULT_PG_PORT)?,
                mysql: relational("MYSQL", DEFAULT_MYSQL_PORT)?,
                mongo: MongoConfig {
                    uri: var("MONGO_URI"),
                    database: var("MONGO_DB").unwrap_or_else(|| DEFAULT_MONGO_DB.to_string()),
                },
                sqlite: SqliteConfig {
                    path: var("SQLITE_DB")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
                },
            },
        })
    }

    /// Validate server-level settings. Source credentials are checked on first use.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(IngestaError::Config("Server port must be greater than 0".into()));
        }

        if self.storage.bucket.is_empty() {
            return Err(IngestaError::Config("S3 bucket cannot be empty".into()));
        }

        if self.staging.root.as_os_str().is_empty() {
            return Err(IngestaError::Config("Staging directory cannot be empty".into()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            staging: StagingConfig {
                root: PathBuf::from(DEFAULT_STAGING_DIR),
            },
            storage: StorageConfig::default(),
            sources: SourcesConfig {
                postgres: RelationalConfig {
                    port: DEFAULT_PG_PORT,
                    ..Default::default()
                },
                mysql: RelationalConfig {
                    port: DEFAULT_MYSQL_PORT,
                    ..Default::default()
                },
                mongo: MongoConfig::default(),
                sqlite: SqliteConfig::default(),
            },
        }
    }
}

/// Parse `name` with `FromStr`, falling back to `default` when it is unset
pub(crate) fn parse_or<T, F>(var: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IngestaError::invalid_var(name, &raw)),
        None => Ok(default),
    }
}
