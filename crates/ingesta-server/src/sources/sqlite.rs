//! SQLite connector (`cinemas`, `salas`) reading a local or mounted file

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteRow},
    Connection, Executor, SqliteConnection, Statement,
};
use tracing::{info, instrument, warn};

use super::{
    sql::{column_names, decode_cell, float, hex, rows_to_dataset, select_all},
    SourceConnector, SourceKind,
};
use crate::{
    config::SqliteConfig,
    dataset::Dataset,
    error::{IngestError, IngestResult},
};

const KIND: SourceKind = SourceKind::Sqlite;

pub struct SqliteConnector {
    config: SqliteConfig,
}

impl SqliteConnector {
    pub fn new(config: SqliteConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SourceConnector for SqliteConnector {
    #[instrument(skip(self), fields(source = %KIND, path = %self.config.path.display()))]
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        // Never create the file: a missing mount must fail, not export empty tables.
        let options = SqliteConnectOptions::new()
            .filename(&self.config.path)
            .read_only(true)
            .create_if_missing(false);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| IngestError::connection(KIND, e))?;

        let scanned = scan(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close SQLite connection cleanly");
        }

        if scanned.is_ok() {
            info!("Read from {}", self.config.path.display());
        }

        scanned
    }
}

async fn scan(conn: &mut SqliteConnection) -> IngestResult<Vec<Dataset>> {
    let mut datasets = Vec::new();

    for table in KIND.datasets() {
        let sql = select_all(table);

        let columns = {
            let statement = (&mut *conn)
                .prepare(sql.as_str())
                .await
                .map_err(|e| IngestError::query(KIND, table, e))?;
            column_names(statement.columns())
        };

        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| IngestError::query(KIND, table, e))?;

        datasets.push(rows_to_dataset(KIND, table, columns, &rows, decode)?);
    }

    Ok(datasets)
}

// SQLite reports the storage class of each value, so a column can mix types.
fn decode(row: &SqliteRow, idx: usize) -> Option<Value> {
    decode_cell!(row, idx,
        i64 => Value::from,
        f64 => float,
        String => Value::String,
        Vec<u8> => hex,
    )
}
