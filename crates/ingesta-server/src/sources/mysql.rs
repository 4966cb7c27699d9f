//! MySQL connector (`users`)

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlRow},
    Connection, Executor, MySqlConnection, Statement,
};
use tracing::{info, instrument, warn};

use super::{
    sql::{as_text, column_names, decode_cell, float, hex, rows_to_dataset, select_all},
    SourceConnector, SourceKind,
};
use crate::{
    config::RelationalConfig,
    dataset::Dataset,
    error::{IngestError, IngestResult},
};

const KIND: SourceKind = SourceKind::Mysql;

pub struct MysqlConnector {
    config: RelationalConfig,
}

impl MysqlConnector {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> IngestResult<MySqlConnectOptions> {
        let missing = |variable| IngestError::missing_setting(KIND, variable);

        let host = self.config.host.as_deref().ok_or_else(|| missing("MYSQL_HOST"))?;
        let user = self.config.user.as_deref().ok_or_else(|| missing("MYSQL_USER"))?;
        let database = self.config.database.as_deref().ok_or_else(|| missing("MYSQL_DB"))?;

        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(self.config.port)
            .username(user)
            .database(database);

        if let Some(password) = &self.config.password {
            options = options.password(password);
        }

        Ok(options)
    }
}

#[async_trait]
impl SourceConnector for MysqlConnector {
    #[instrument(skip(self), fields(source = %KIND))]
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        let options = self.connect_options()?;
        let mut conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| IngestError::connection(KIND, e))?;

        info!(
            "Connected to MySQL at {}:{}",
            self.config.host.as_deref().unwrap_or_default(),
            self.config.port
        );

        let scanned = scan(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close MySQL connection cleanly");
        }

        scanned
    }
}

async fn scan(conn: &mut MySqlConnection) -> IngestResult<Vec<Dataset>> {
    let mut datasets = Vec::with_capacity(KIND.datasets().len());
    for table in KIND.datasets() {
        datasets.push(fetch_table(conn, table).await?);
    }
    Ok(datasets)
}

async fn fetch_table(conn: &mut MySqlConnection, table: &str) -> IngestResult<Dataset> {
    let sql = select_all(table);
    let query_error = |e: sqlx::Error| IngestError::query(KIND, table, e);

    let columns = column_names((&mut *conn).prepare(sql.as_str()).await.map_err(query_error)?.columns());

    // Plain `&str` goes through COM_QUERY, so every value arrives as text.
    let rows = (&mut *conn)
        .fetch_all(sql.as_str())
        .await
        .map_err(query_error)?;

    rows_to_dataset(KIND, table, columns, &rows, decode)
}

// TINYINT(1) flags come out as 0/1. DECIMAL, dates, YEAR, TIME and JSON keep
// the server's text.
fn decode(row: &MySqlRow, idx: usize) -> Option<Value> {
    decode_cell!(row, idx,
        i64 => Value::from,
        u64 => Value::from,
        f64 => float,
        String => Value::String,
        Vec<u8> => hex,
    )
    .or_else(|| as_text(row, idx))
}
