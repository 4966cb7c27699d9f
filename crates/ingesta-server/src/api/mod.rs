//! HTTP surface
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | `GET` | `/health` | liveness with bucket and region |
//! | `POST` | `/upload/all` | [`IngestionResult`] for every source |
//! | `POST` | `/upload/:source` | upload records of one source |

pub mod response;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    config::Config,
    ingest::{IngestionResult, Ingestor, UploadRecord},
    middleware,
    sources::SourceKind,
};
use response::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(config: Config, ingestor: Ingestor) -> Self {
        Self {
            config: Arc::new(config),
            ingestor: Arc::new(ingestor),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload/all", post(upload_all))
        .route("/upload/:source", post(upload_source))
        .layer(middleware::tracing_layer())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    time: String,
    bucket: String,
    region: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        time: Utc::now().to_rfc3339(),
        bucket: state.config.storage.bucket.clone(),
        region: state.config.storage.region.clone(),
    })
}

async fn upload_all(State(state): State<AppState>) -> Result<Json<IngestionResult>, ApiError> {
    let result = state.ingestor.ingest_all().await?;
    Ok(Json(result))
}

async fn upload_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<Vec<UploadRecord>>, ApiError> {
    let kind: SourceKind = source.parse()?;
    let records = state.ingestor.ingest_source(kind).await?;
    Ok(Json(records))
}
