//! Shared setup for the engine-backed connector tests

#![allow(dead_code)]

use ingesta_server::config::{Config, SourcesConfig};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source settings from the environment (and `.env`), as the binaries read them
pub fn sources_from_env() -> SourcesConfig {
    dotenvy::dotenv().ok();
    Config::from_lookup(|name| std::env::var(name).ok())
        .expect("invalid source settings in environment")
        .sources
}

/// Throwaway database name, unique per test run
pub fn scratch_name(test: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("ingesta_test_{}_{}_{}", test, std::process::id(), nanos)
}
