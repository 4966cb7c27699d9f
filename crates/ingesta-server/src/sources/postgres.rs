//! PostgreSQL connector (`movies`, `showtimes`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgRow},
    Connection, Executor, PgConnection, Statement,
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

const KIND: SourceKind = SourceKind::Postgres;

pub struct PostgresConnector {
    config: RelationalConfig,
}

impl PostgresConnector {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn connect_options(&self) -> IngestResult<PgConnectOptions> {
        let host = required(&self.config.host, "PG_HOST")?;
        let user = required(&self.config.user, "PG_USER")?;
        let database = required(&self.config.database, "PG_DB")?;

        let mut options = PgConnectOptions::new()
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
impl SourceConnector for PostgresConnector {
    #[instrument(skip(self), fields(source = %KIND))]
    async fn extract(&self) -> IngestResult<Vec<Dataset>> {
        let options = self.connect_options()?;
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| IngestError::connection(KIND, e))?;

        info!(
            "Connected to PostgreSQL at {}:{}",
            options.get_host(),
            options.get_port()
        );

        let scanned = scan(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close PostgreSQL connection cleanly");
        }

        scanned
    }
}

fn required<'a>(value: &'a Option<String>, variable: &str) -> IngestResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| IngestError::missing_setting(KIND, variable))
}

async fn scan(conn: &mut PgConnection) -> IngestResult<Vec<Dataset>> {
    let mut datasets = Vec::with_capacity(KIND.datasets().len());
    for table in KIND.datasets() {
        datasets.push(fetch_table(conn, table).await?);
    }
    Ok(datasets)
}

async fn fetch_table(conn: &mut PgConnection, table: &str) -> IngestResult<Dataset> {
    let sql = select_all(table);

    let columns = {
        let statement = (&mut *conn)
            .prepare(sql.as_str())
            .await
            .map_err(|e| IngestError::query(KIND, table, e))?;
        column_names(statement.columns())
    };

    // Unprepared `&str` runs on the text protocol so every type has a rendering.
    let rows = (&mut *conn)
        .fetch_all(sql.as_str())
        .await
        .map_err(|e| IngestError::query(KIND, table, e))?;

    rows_to_dataset(KIND, table, columns, &rows, decode)
}

// Anything not listed (real, numeric, dates, uuid, enums, arrays, interval,
// inet, money) keeps the server's text, so numeric scale survives as written.
fn decode(row: &PgRow, idx: usize) -> Option<Value> {
    decode_cell!(row, idx,
        bool => Value::Bool,
        i16 => Value::from,
        i32 => Value::from,
        i64 => Value::from,
        f64 => float,
        DateTime<Utc> => |v: DateTime<Utc>| Value::String(v.to_rfc3339()),
        Value => |v: Value| v,
        Vec<u8> => hex,
    )
    .or_else(|| as_text(row, idx))
}
