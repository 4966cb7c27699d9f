//! PostgreSQL connector tests
//!
//! **Requirements**:
//! - A PostgreSQL server reachable with `PG_HOST`/`PG_PORT`/`PG_USER`/`PG_PASSWORD`
//! - The user must be allowed to create databases; each test works in its own
//!   scratch database (created from `PG_DB`, default `postgres`) and drops it
//! - Tests are skipped if PG_HOST is not configured
//!
//! **Running tests**:
//! ```bash
//! PG_HOST=localhost PG_USER=postgres PG_PASSWORD=postgres cargo test --test postgres_connector_tests
//! ```

mod common;

use ingesta_server::{
    config::RelationalConfig,
    error::IngestError,
    sources::{PostgresConnector, SourceConnector},
    staging::encode_csv,
};
use serde_json::{json, Value};
use sqlx::{postgres::PgConnectOptions, Connection, Executor, PgConnection};

/// Connector settings pointing at a scratch database, plus the database the
/// scratch one was created from
struct Scratch {
    config: RelationalConfig,
    admin_database: String,
    name: String,
}

/// Scratch database with `statements` applied, or `None` when no server is configured
async fn setup_database(test: &str, statements: &[&str]) -> Option<Scratch> {
    std::env::var("PG_HOST").ok()?;
    let base = common::sources_from_env().postgres;
    let admin_database = base.database.clone().unwrap_or_else(|| "postgres".to_string());
    let name = common::scratch_name(test);

    let mut admin = connect(&base, &admin_database).await;
    admin
        .execute(format!("CREATE DATABASE {}", name).as_str())
        .await
        .unwrap();
    admin.close().await.unwrap();

    let mut conn = connect(&base, &name).await;
    for statement in statements {
        conn.execute(*statement).await.unwrap();
    }
    conn.close().await.unwrap();

    Some(Scratch {
        config: RelationalConfig {
            database: Some(name.clone()),
            ..base
        },
        admin_database,
        name,
    })
}

async fn teardown_database(scratch: &Scratch) {
    let mut admin = connect(&scratch.config, &scratch.admin_database).await;
    admin
        .execute(format!("DROP DATABASE IF EXISTS {}", scratch.name).as_str())
        .await
        .unwrap();
    admin.close().await.unwrap();
}

async fn connect(config: &RelationalConfig, database: &str) -> PgConnection {
    let mut options = PgConnectOptions::new()
        .host(config.host.as_deref().unwrap())
        .port(config.port)
        .username(config.user.as_deref().unwrap())
        .database(database);
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    PgConnection::connect_with(&options).await.unwrap()
}

const CATALOG: &[&str] = &[
    "CREATE TYPE mpaa AS ENUM ('G', 'PG', 'PG-13', 'R')",
    "CREATE TABLE movies (
        id integer PRIMARY KEY,
        title text NOT NULL,
        rating mpaa,
        genres text[],
        runtime interval,
        price numeric(6,2),
        released date,
        extra jsonb,
        poster bytea,
        added_at timestamptz,
        external_id uuid,
        box_office money,
        host inet,
        note text
    )",
    "INSERT INTO movies VALUES (
        1, 'Alien', 'R', '{horror,scifi}', '117 minutes', 9.50, '1979-05-25',
        '{\"a\": 1}', '\\x0102', '2024-03-01 18:00:00+00',
        'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11', 12.34, '10.0.0.1', NULL
    )",
    "CREATE TABLE showtimes (
        id bigint,
        movie_id integer,
        starts_at timestamp,
        screen_m real,
        ratio double precision,
        active boolean
    )",
];

#[tokio::test]
async fn test_every_column_type_is_exported() {
    let Some(scratch) = setup_database("pg_types", CATALOG).await else {
        println!("Skipping test: PG_HOST not configured");
        return;
    };

    let datasets = PostgresConnector::new(scratch.config.clone()).extract().await;
    teardown_database(&scratch).await;
    let datasets = datasets.unwrap();

    let movies = &datasets[0];
    assert_eq!(movies.name(), "movies");
    assert_eq!(movies.row_count(), 1);

    let row = &movies.rows()[0];
    assert_eq!(row["id"], json!(1));
    assert_eq!(row["title"], json!("Alien"));
    assert_eq!(row["rating"], json!("R"));
    assert_eq!(row["genres"], json!("{horror,scifi}"));
    assert_eq!(row["runtime"], json!("01:57:00"));
    assert_eq!(row["price"], json!("9.50"));
    assert_eq!(row["released"], json!("1979-05-25"));
    assert_eq!(row["extra"], json!({"a": 1}));
    assert_eq!(row["poster"], json!("0102"));
    assert_eq!(row["added_at"], json!("2024-03-01T18:00:00+00:00"));
    assert_eq!(row["external_id"], json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"));
    assert_eq!(row["host"], json!("10.0.0.1"));
    assert_eq!(row["note"], Value::Null);
    assert!(row["box_office"].as_str().is_some_and(|money| money.contains("12.34")));

    // Header comes from the statement even though the table is empty
    let showtimes = &datasets[1];
    assert!(showtimes.is_empty());
    assert_eq!(
        showtimes.columns(),
        &["id", "movie_id", "starts_at", "screen_m", "ratio", "active"]
    );
}

#[tokio::test]
async fn test_scalar_columns_keep_their_json_types() {
    let mut statements = CATALOG.to_vec();
    statements.push(
        "INSERT INTO showtimes VALUES
            (10, 1, '2024-03-01 18:00:00', 14.5, 'NaN', true),
            (11, 1, NULL, NULL, 1.25, false)",
    );
    let Some(scratch) = setup_database("pg_scalars", &statements).await else {
        println!("Skipping test: PG_HOST not configured");
        return;
    };

    let datasets = PostgresConnector::new(scratch.config.clone()).extract().await;
    teardown_database(&scratch).await;
    let datasets = datasets.unwrap();
    let showtimes = &datasets[1];

    let first = &showtimes.rows()[0];
    assert_eq!(first["id"], json!(10));
    assert_eq!(first["starts_at"], json!("2024-03-01 18:00:00"));
    assert_eq!(first["screen_m"], json!("14.5"));
    assert_eq!(first["ratio"], json!("NaN"));
    assert_eq!(first["active"], json!(true));

    let second = &showtimes.rows()[1];
    assert_eq!(second["starts_at"], Value::Null);
    assert_eq!(second["ratio"], json!(1.25));
    assert_eq!(second["active"], json!(false));

    let csv = String::from_utf8(encode_csv(showtimes).unwrap()).unwrap();
    assert_eq!(
        csv,
        "id,movie_id,starts_at,screen_m,ratio,active\n\
         10,1,2024-03-01 18:00:00,14.5,NaN,true\n\
         11,1,,,1.25,false\n"
    );
}

#[tokio::test]
async fn test_missing_table_is_query_error() {
    let Some(scratch) = setup_database("pg_missing", &CATALOG[..3]).await else {
        println!("Skipping test: PG_HOST not configured");
        return;
    };

    let result = PostgresConnector::new(scratch.config.clone()).extract().await;
    teardown_database(&scratch).await;

    assert!(matches!(
        result.unwrap_err(),
        IngestError::Query { source_name: "PostgreSQL", ref dataset, .. } if dataset == "showtimes"
    ));
}
