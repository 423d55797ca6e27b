//! Health check and service info handlers.

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "info",
    responses(
        (status = 200, description = "Health check passed")
    )
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AboutResponse {
    pub project: &'static str,
    pub version: &'static str,
    pub region: &'static str,
}

/// Short project info for the front-end about box.
#[utoipa::path(
    get,
    path = "/about",
    tag = "info",
    responses(
        (status = 200, description = "Project info", body = AboutResponse)
    )
)]
pub async fn about() -> Json<AboutResponse> {
    Json(AboutResponse {
        project: "Volcanic Trajectory 3D Viewer",
        version: env!("CARGO_PKG_VERSION"),
        region: "Java Island",
    })
}
