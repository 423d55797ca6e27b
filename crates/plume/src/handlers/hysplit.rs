//! NOAA HYSPLIT trajectory handlers.
//!
//! These endpoints exist so the front-end can compare the custom model
//! against HYSPLIT output; the fetch itself is masked-fallback (see
//! [`crate::hysplit`]), so they never fail on upstream problems.

use std::sync::Arc;

use axum::{Extension, extract::Query, response::Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::ModelConfig,
    errors::AppError,
    hysplit::{HysplitService, TrajectorySource},
    model::Trip,
};

use super::ash::RELEASE_LEVELS_M;

/// Start-point jitter for particle swarms: degrees around the center and
/// meters around the release height.
const SWARM_JITTER_DEG: f64 = 0.05;
const SWARM_JITTER_M: f64 = 500.0;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HysplitTrajectoryQuery {
    /// Release latitude; falls back to the volcano's coordinates when absent.
    pub lat: Option<f64>,
    /// Release longitude; falls back to the volcano's coordinates when absent.
    pub lon: Option<f64>,
    /// Release delay in hours from now.
    pub hour: Option<i64>,
    /// Release height, meters.
    pub alt: Option<f64>,
    /// Duration in hours.
    pub hours: Option<i64>,
    /// Number of released particles.
    pub particles: Option<usize>,
    /// Volcano used when lat/lon are absent.
    pub volcano: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HysplitTrajectoryMeta {
    pub source: String,
    pub particles: usize,
    /// `[lat, lon]` of the release center.
    #[schema(value_type = Vec<f64>)]
    pub center: [f64; 2],
    pub height: f64,
    pub duration_hr: i64,
    pub volcano: String,
    pub start: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HysplitTrajectoryResponse {
    pub meta: HysplitTrajectoryMeta,
    pub trips: Vec<Trip>,
}

fn resolve_center(
    config: &ModelConfig,
    q: &HysplitTrajectoryQuery,
) -> Result<(f64, f64), AppError> {
    let lat = q.lat.unwrap_or(0.0);
    let lon = q.lon.unwrap_or(0.0);
    // 0/0 is the "not provided" sentinel the front-end sends.
    if lat == 0.0 && lon == 0.0 {
        let volcano = q.volcano.as_deref().unwrap_or("merapi");
        let v = config.resolve_volcano(volcano)?;
        Ok((v.lat, v.lon))
    } else {
        Ok((lat, lon))
    }
}

/// Fetch (or synthesize) a HYSPLIT trajectory around one release point.
///
/// With `particles > 1` the release point is jittered per particle and each
/// particle is fetched independently.
#[utoipa::path(
    get,
    path = "/api/hysplit_trajectory",
    tag = "hysplit",
    params(HysplitTrajectoryQuery),
    responses(
        (status = 200, description = "Fetched or fallback trajectories", body = HysplitTrajectoryResponse),
        (status = 400, description = "Unknown volcano and no coordinates given")
    )
)]
pub async fn hysplit_trajectory(
    Extension(config): Extension<Arc<ModelConfig>>,
    Extension(service): Extension<HysplitService>,
    Query(q): Query<HysplitTrajectoryQuery>,
) -> Result<Json<HysplitTrajectoryResponse>, AppError> {
    let (lat, lon) = resolve_center(&config, &q)?;
    let height = q.alt.unwrap_or(config.default_plume_top_m);
    let duration = q.hours.unwrap_or(config.default_duration_hr);
    if duration < 0 {
        return Err(AppError::InvalidParameter(format!(
            "hours must be non-negative (got {duration})"
        )));
    }
    let particles = q.particles.unwrap_or(1).max(1);
    let volcano = q.volcano.as_deref().unwrap_or("merapi").to_lowercase();
    let start = OffsetDateTime::now_utc() + Duration::hours(q.hour.unwrap_or(0));

    let (trips, source) =
        fetch_swarm(&service, lat, lon, height, duration, particles, start).await;

    let meta = HysplitTrajectoryMeta {
        source: source.as_str().to_string(),
        particles,
        center: [lat, lon],
        height,
        duration_hr: duration,
        volcano,
        start: start
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
    };

    Ok(Json(HysplitTrajectoryResponse { meta, trips }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HysplitMultiMeta {
    pub source: String,
    pub volcano: String,
    pub duration_hr: i64,
    pub levels: Vec<f64>,
    pub particles_per_level: usize,
    pub total_trips: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HysplitMultiResponse {
    pub meta: HysplitMultiMeta,
    pub trips: Vec<Trip>,
}

/// Fetch HYSPLIT trajectories for every release level of a volcano.
#[utoipa::path(
    get,
    path = "/api/hysplit_trajectory_multi",
    tag = "hysplit",
    params(HysplitTrajectoryQuery),
    responses(
        (status = 200, description = "Trips for every release level", body = HysplitMultiResponse),
        (status = 400, description = "Unknown volcano")
    )
)]
pub async fn hysplit_trajectory_multi(
    Extension(config): Extension<Arc<ModelConfig>>,
    Extension(service): Extension<HysplitService>,
    Query(q): Query<HysplitTrajectoryQuery>,
) -> Result<Json<HysplitMultiResponse>, AppError> {
    let volcano = q.volcano.as_deref().unwrap_or("merapi");
    let v = config.resolve_volcano(volcano)?;
    let duration = q.hours.unwrap_or(config.default_duration_hr);
    if duration < 0 {
        return Err(AppError::InvalidParameter(format!(
            "hours must be non-negative (got {duration})"
        )));
    }
    let particles = q.particles.unwrap_or(5).max(1);
    let start = OffsetDateTime::now_utc();

    let mut trips = Vec::new();
    for &level in RELEASE_LEVELS_M {
        let (level_trips, _) =
            fetch_swarm(&service, v.lat, v.lon, level, duration, particles, start).await;
        trips.extend(level_trips.into_iter().map(|mut trip| {
            trip.level = Some(level);
            trip
        }));
    }

    let meta = HysplitMultiMeta {
        source: "hysplit_mock_multi".to_string(),
        volcano: volcano.to_lowercase(),
        duration_hr: duration,
        levels: RELEASE_LEVELS_M.to_vec(),
        particles_per_level: particles,
        total_trips: trips.len(),
    };

    Ok(Json(HysplitMultiResponse { meta, trips }))
}

/// Fetches one trip per particle, jittering the release point for all but a
/// single-particle request. Reports the fallback source if any fetch fell
/// back.
async fn fetch_swarm(
    service: &HysplitService,
    lat: f64,
    lon: f64,
    height: f64,
    duration: i64,
    particles: usize,
    start: OffsetDateTime,
) -> (Vec<Trip>, TrajectorySource) {
    if particles <= 1 {
        let (trip, source) = service
            .fetch_trajectory(lat, lon, height, duration, start)
            .await;
        return (vec![trip], source);
    }

    let mut trips = Vec::with_capacity(particles);
    let mut source = TrajectorySource::Mock;
    for _ in 0..particles {
        let (dlat, dlon, dalt) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(-SWARM_JITTER_DEG..=SWARM_JITTER_DEG),
                rng.gen_range(-SWARM_JITTER_DEG..=SWARM_JITTER_DEG),
                rng.gen_range(-SWARM_JITTER_M..=SWARM_JITTER_M),
            )
        };
        let (trip, fetch_source) = service
            .fetch_trajectory(lat + dlat, lon + dlon, height + dalt, duration, start)
            .await;
        if fetch_source == TrajectorySource::OfflineFallback {
            source = TrajectorySource::OfflineFallback;
        }
        trips.push(trip);
    }
    (trips, source)
}
