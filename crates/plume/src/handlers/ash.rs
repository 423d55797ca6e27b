//! Custom ash-model trajectory handlers.

use std::sync::Arc;

use axum::{Extension, extract::Query, response::Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::ModelConfig,
    errors::AppError,
    model::{self, Origin, Simulation, Trip},
};

/// Altitude levels swept by the multi-level endpoints, meters.
pub const RELEASE_LEVELS_M: &[f64] = &[3000.0, 5000.0, 8000.0, 10_000.0, 12_000.0];

/// Angular spread for multi-level sweeps, degrees. Wider than the
/// single-run default so the pooled level plumes fan out visibly.
pub const MULTI_LEVEL_ANGLE_SPREAD_DEG: f64 = 30.0;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AshTrajectoryQuery {
    /// Volcano name, case-insensitive. Defaults to merapi.
    pub volcano: Option<String>,
    /// Duration in simulated hours.
    pub hours: Option<i64>,
    /// Initial plume-top altitude, meters.
    pub alt: Option<f64>,
    /// Number of simulated particles.
    pub particles: Option<usize>,
}

/// Run the custom advection model for one volcano.
#[utoipa::path(
    get,
    path = "/api/ash_trajectory",
    tag = "ash",
    params(AshTrajectoryQuery),
    responses(
        (status = 200, description = "Simulated trajectories", body = Simulation),
        (status = 400, description = "Unknown volcano or invalid parameter")
    )
)]
pub async fn ash_trajectory(
    Extension(config): Extension<Arc<ModelConfig>>,
    Query(q): Query<AshTrajectoryQuery>,
) -> Result<Json<Simulation>, AppError> {
    let volcano = q.volcano.as_deref().unwrap_or("merapi");
    let hours = q.hours.unwrap_or(config.default_duration_hr);
    let alt = q.alt.unwrap_or(config.default_plume_top_m);
    let particles = q.particles.unwrap_or(1);

    let sim = model::advect(
        Origin::Volcano(volcano),
        alt,
        hours,
        particles,
        None,
        OffsetDateTime::now_utc(),
        &config,
        &mut rand::thread_rng(),
    )?;

    Ok(Json(sim))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MultiTrajectoryMeta {
    pub source: String,
    pub volcano: String,
    pub duration_hr: i64,
    pub levels: Vec<f64>,
    pub particles_per_level: usize,
    pub total_trips: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MultiTrajectoryResponse {
    pub meta: MultiTrajectoryMeta,
    pub trips: Vec<Trip>,
}

/// Run the model once per release level and pool the trips.
///
/// Levels above `alt + 2000` m are skipped so the sweep stays below the
/// requested plume top.
#[utoipa::path(
    get,
    path = "/api/ash_trajectory_multi",
    tag = "ash",
    params(AshTrajectoryQuery),
    responses(
        (status = 200, description = "Trips for every release level", body = MultiTrajectoryResponse),
        (status = 400, description = "Unknown volcano or invalid parameter")
    )
)]
pub async fn ash_trajectory_multi(
    Extension(config): Extension<Arc<ModelConfig>>,
    Query(q): Query<AshTrajectoryQuery>,
) -> Result<Json<MultiTrajectoryResponse>, AppError> {
    let volcano = q.volcano.as_deref().unwrap_or("merapi");
    let hours = q.hours.unwrap_or(config.default_duration_hr);
    let alt = q.alt.unwrap_or(config.default_plume_top_m);
    let particles = q.particles.unwrap_or(10);

    let start = OffsetDateTime::now_utc();
    let (levels, trips) = sweep_levels(
        &config,
        volcano,
        hours,
        alt,
        particles,
        start,
        &mut rand::thread_rng(),
    )?;

    let meta = MultiTrajectoryMeta {
        source: "custom_model_multi".to_string(),
        volcano: volcano.to_lowercase(),
        duration_hr: hours,
        levels,
        particles_per_level: particles,
        total_trips: trips.len(),
    };

    Ok(Json(MultiTrajectoryResponse { meta, trips }))
}

/// Runs the model once per release level at or below `alt + 2000` m and
/// pools the trips, each tagged with its level.
///
/// Sweeps use the widened [`MULTI_LEVEL_ANGLE_SPREAD_DEG`] in place of the
/// configured single-run spread.
pub fn sweep_levels(
    config: &ModelConfig,
    volcano: &str,
    hours: i64,
    alt: f64,
    particles: usize,
    start: OffsetDateTime,
    rng: &mut impl Rng,
) -> Result<(Vec<f64>, Vec<Trip>), AppError> {
    let mut sweep_config = config.clone();
    sweep_config.angle_spread_deg = MULTI_LEVEL_ANGLE_SPREAD_DEG;

    let levels: Vec<f64> = RELEASE_LEVELS_M
        .iter()
        .copied()
        .filter(|level| *level <= alt + 2000.0)
        .collect();

    let mut trips = Vec::new();
    for &level in &levels {
        let sim = model::advect(
            Origin::Volcano(volcano),
            level,
            hours,
            particles,
            None,
            start,
            &sweep_config,
            rng,
        )?;
        trips.extend(sim.trips.into_iter().map(|mut trip| {
            trip.level = Some(level);
            trip
        }));
    }

    Ok((levels, trips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::datetime;

    fn start() -> OffsetDateTime {
        datetime!(2026-01-01 00:00:00 UTC)
    }

    #[test]
    fn sweep_filters_levels_above_the_plume_top() {
        let config = ModelConfig::default();
        let mut rng = StdRng::seed_from_u64(31);
        let (levels, trips) =
            sweep_levels(&config, "merapi", 6, 5000.0, 3, start(), &mut rng).unwrap();
        // Cutoff is 7000 m, so only the two lowest levels survive.
        assert_eq!(levels, vec![3000.0, 5000.0]);
        assert_eq!(trips.len(), levels.len() * 3);
        for (i, trip) in trips.iter().enumerate() {
            let expected_level = levels[i / 3];
            assert_eq!(trip.level, Some(expected_level));
            assert_eq!(trip.path.len(), 7);
            assert_eq!(trip.path[0][2], expected_level);
        }
    }

    #[test]
    fn sweep_covers_all_levels_for_a_high_plume() {
        let config = ModelConfig::default();
        let mut rng = StdRng::seed_from_u64(32);
        let (levels, trips) =
            sweep_levels(&config, "semeru", 4, 10_000.0, 2, start(), &mut rng).unwrap();
        assert_eq!(levels, RELEASE_LEVELS_M);
        assert_eq!(trips.len(), RELEASE_LEVELS_M.len() * 2);
    }

    #[test]
    fn sweep_uses_the_widened_angular_spread() {
        let config = ModelConfig::default();
        let mut rng = StdRng::seed_from_u64(33);
        let (levels, trips) =
            sweep_levels(&config, "merapi", 6, 3000.0, 2, start(), &mut rng).unwrap();
        assert_eq!(levels, vec![3000.0, 5000.0]);

        // The first level's trips must match a direct run with the widened
        // spread and the same seed, not the 15-degree default.
        let mut widened = config.clone();
        widened.angle_spread_deg = MULTI_LEVEL_ANGLE_SPREAD_DEG;
        let mut rng_direct = StdRng::seed_from_u64(33);
        let direct = model::advect(
            Origin::Volcano("merapi"),
            3000.0,
            6,
            2,
            None,
            start(),
            &widened,
            &mut rng_direct,
        )
        .unwrap();
        assert_eq!(trips[0].path, direct.trips[0].path);
        assert_eq!(trips[1].path, direct.trips[1].path);
    }

    #[test]
    fn sweep_rejects_unknown_volcanoes() {
        let config = ModelConfig::default();
        let mut rng = StdRng::seed_from_u64(34);
        let err = sweep_levels(&config, "krakatau_typo", 6, 10_000.0, 2, start(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }
}
