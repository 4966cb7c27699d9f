//! Error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::IngestError;

/// Handler error; unknown sources are the caller's fault, everything else is ours
#[derive(Debug)]
pub struct ApiError(pub IngestError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_client_error() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": "unrecognized source" })),
            )
                .into_response();
        }

        error!(error = %self.0, "Ingestion request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceKind;

    #[test]
    fn test_unknown_source_is_bad_request() {
        let response = ApiError(IngestError::UnknownSource("oracle".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_connector_failure_is_server_error() {
        let err = IngestError::connection(SourceKind::Mysql, "access denied for user");
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
