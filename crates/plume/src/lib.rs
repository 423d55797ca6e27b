pub mod config;
pub mod errors;
pub mod handlers;
pub mod hysplit;
pub mod meteo;
pub mod model;
pub mod request_id;
pub mod wind;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::ModelConfig,
    handlers::{
        AboutResponse, DispersionMeta, DispersionResponse, HysplitMultiMeta, HysplitMultiResponse,
        HysplitTrajectoryMeta, HysplitTrajectoryResponse, MultiTrajectoryMeta,
        MultiTrajectoryResponse, about, ash_dispersion, ash_trajectory, ash_trajectory_multi,
        health_check, hysplit_trajectory, hysplit_trajectory_multi,
    },
    hysplit::HysplitService,
    meteo::OpenMeteoService,
    model::{Simulation, SimulationMeta, Trip},
    wind::{WindProfile, WindSample},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::about,
        handlers::ash_trajectory,
        handlers::ash_trajectory_multi,
        handlers::hysplit_trajectory,
        handlers::hysplit_trajectory_multi,
        handlers::ash_dispersion,
    ),
    components(schemas(
        AboutResponse,
        Simulation,
        SimulationMeta,
        Trip,
        WindProfile,
        WindSample,
        MultiTrajectoryMeta,
        MultiTrajectoryResponse,
        HysplitTrajectoryMeta,
        HysplitTrajectoryResponse,
        HysplitMultiMeta,
        HysplitMultiResponse,
        DispersionMeta,
        DispersionResponse,
    )),
    tags(
        (name = "info", description = "Health and project info"),
        (name = "ash", description = "Custom ash model trajectories"),
        (name = "hysplit", description = "NOAA HYSPLIT trajectories"),
    )
)]
struct ApiDoc;

pub fn create_router(
    config: Arc<ModelConfig>,
    hysplit: HysplitService,
    meteo: OpenMeteoService,
) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/about", get(about))
        // Custom model routes
        .route("/api/ash_trajectory", get(ash_trajectory))
        .route("/api/ash_trajectory_multi", get(ash_trajectory_multi))
        .route("/api/ash_dispersion", get(ash_dispersion))
        // HYSPLIT routes
        .route("/api/hysplit_trajectory", get(hysplit_trajectory))
        .route("/api/hysplit_trajectory_multi", get(hysplit_trajectory_multi))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(Extension(config))
        .layer(Extension(hysplit))
        .layer(Extension(meteo))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

pub async fn run_server(
    config: Arc<ModelConfig>,
    hysplit: HysplitService,
    meteo: OpenMeteoService,
    port: u16,
) -> anyhow::Result<()> {
    let app = create_router(config, hysplit, meteo);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
