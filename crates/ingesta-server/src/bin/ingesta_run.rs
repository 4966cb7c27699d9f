//! Ingesta run - one-shot ingestion for cron and manual backfills
//!
//! Logs go to stderr; stdout carries only the JSON result.

use anyhow::Result;
use clap::Parser;
use ingesta_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use tracing::info;

use ingesta_server::{config::Config, ingest::Ingestor, sources::SourceKind};

const ALL_SOURCES: &str = "all";

#[derive(Parser, Debug)]
#[command(name = "ingesta-run")]
#[command(author, version, about = "Export cinema source data to object storage once")]
struct Cli {
    /// Source to ingest: postgres, mysql, mongo, sqlite or all
    #[arg(short, long, default_value = ALL_SOURCES)]
    source: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Stderr)
        .log_file_prefix("ingesta-run")
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    // Reject a bad key before touching any store
    let target = match cli.source.as_str() {
        ALL_SOURCES => None,
        key => Some(key.parse::<SourceKind>()?),
    };

    let config = Config::load()?;
    let ingestor = Ingestor::from_config(&config).await;

    let output = match target {
        Some(kind) => {
            let records = ingestor.ingest_source(kind).await?;
            serde_json::to_string_pretty(&records)?
        },
        None => {
            let result = ingestor.ingest_all().await?;
            serde_json::to_string_pretty(&result)?
        },
    };

    println!("{}", output);
    info!("Ingestion complete");

    Ok(())
}
