//! Source connectors
//!
//! Each backing store has one connector that opens a connection, runs fixed
//! full scans, materializes one [`Dataset`] per table/collection and closes the
//! connection before returning.
//!
//! | Source | Store | Datasets | Remote category |
//! |---|---|---|---|
//! | `postgres` | PostgreSQL | `movies`, `showtimes` | `movies` |
//! | `mysql` | MySQL | `users` | `users` |
//! | `mongo` | MongoDB | `bookings` | `bookings` |
//! | `sqlite` | SQLite file | `cinemas`, `salas` | `theaters` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

use crate::{config::SourcesConfig, dataset::Dataset, error::IngestError, error::IngestResult};

pub mod mongo;
pub mod mysql;
pub mod postgres;
mod sql;
pub mod sqlite;

pub use mongo::MongoConnector;
pub use mysql::MysqlConnector;
pub use postgres::PostgresConnector;
pub use sqlite::SqliteConnector;

/// The four known backing stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Postgres,
    Mysql,
    Mongo,
    Sqlite,
}

impl SourceKind {
    /// Every source, in full-ingestion order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Postgres,
        SourceKind::Mysql,
        SourceKind::Mongo,
        SourceKind::Sqlite,
    ];

    /// Key used in URLs and on the command line
    pub fn key(self) -> &'static str {
        match self {
            SourceKind::Postgres => "postgres",
            SourceKind::Mysql => "mysql",
            SourceKind::Mongo => "mongo",
            SourceKind::Sqlite => "sqlite",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Postgres => "PostgreSQL",
            SourceKind::Mysql => "MySQL",
            SourceKind::Mongo => "MongoDB",
            SourceKind::Sqlite => "SQLite",
        }
    }

    /// Remote path segment grouping this source's files
    pub fn category(self) -> &'static str {
        match self {
            SourceKind::Postgres => "movies",
            SourceKind::Mysql => "users",
            SourceKind::Mongo => "bookings",
            SourceKind::Sqlite => "theaters",
        }
    }

    /// Datasets this source produces, in extraction order
    pub fn datasets(self) -> &'static [&'static str] {
        match self {
            SourceKind::Postgres => &["movies", "showtimes"],
            SourceKind::Mysql => &["users"],
            SourceKind::Mongo => &["bookings"],
            SourceKind::Sqlite => &["cinemas", "salas"],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SourceKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(SourceKind::Postgres),
            "mysql" => Ok(SourceKind::Mysql),
            "mongo" => Ok(SourceKind::Mongo),
            "sqlite" => Ok(SourceKind::Sqlite),
            other => Err(IngestError::UnknownSource(other.to_string())),
        }
    }
}

/// Extracts full snapshots from one backing store
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Connect, scan every dataset of the source, disconnect.
    ///
    /// Either all datasets are returned or none.
    async fn extract(&self) -> IngestResult<Vec<Dataset>>;
}

/// One connector per [`SourceKind`]
#[derive(Clone)]
pub struct Connectors {
    postgres: Arc<dyn SourceConnector>,
    mysql: Arc<dyn SourceConnector>,
    mongo: Arc<dyn SourceConnector>,
    sqlite: Arc<dyn SourceConnector>,
}

impl Connectors {
    pub fn new(
        postgres: Arc<dyn SourceConnector>,
        mysql: Arc<dyn SourceConnector>,
        mongo: Arc<dyn SourceConnector>,
        sqlite: Arc<dyn SourceConnector>,
    ) -> Self {
        Self {
            postgres,
            mysql,
            mongo,
            sqlite,
        }
    }

    /// Real connectors for the configured stores
    pub fn from_config(config: &SourcesConfig) -> Self {
        Self::new(
            Arc::new(PostgresConnector::new(config.postgres.clone())),
            Arc::new(MysqlConnector::new(config.mysql.clone())),
            Arc::new(MongoConnector::new(config.mongo.clone())),
            Arc::new(SqliteConnector::new(config.sqlite.clone())),
        )
    }

    pub fn get(&self, kind: SourceKind) -> &dyn SourceConnector {
        match kind {
            SourceKind::Postgres => self.postgres.as_ref(),
            SourceKind::Mysql => self.mysql.as_ref(),
            SourceKind::Mongo => self.mongo.as_ref(),
            SourceKind::Sqlite => self.sqlite.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.key().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = "oracle".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, IngestError::UnknownSource(ref key) if key == "oracle"));
        assert!("Postgres".parse::<SourceKind>().is_err());
        assert!("all".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_categories_group_datasets() {
        assert_eq!(SourceKind::Postgres.category(), "movies");
        assert_eq!(SourceKind::Postgres.datasets(), &["movies", "showtimes"]);
        assert_eq!(SourceKind::Sqlite.category(), "theaters");
        assert_eq!(SourceKind::Sqlite.datasets(), &["cinemas", "salas"]);
    }

    #[test]
    fn test_serde_uses_keys() {
        assert_eq!(serde_json::to_string(&SourceKind::Mongo).unwrap(), "\"mongo\"");
    }
}
