use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidParameter(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            // Upstream failures are normally masked by a synthetic fallback
            // before they get here; anything that still surfaces is reported
            // as a gateway problem without leaking the upstream error.
            AppError::UpstreamUnavailable(e) => {
                error!("Upstream error: {e}");
                (StatusCode::BAD_GATEWAY, "Upstream unavailable")
            }
            AppError::Internal(e) => {
                error!("Internal error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
