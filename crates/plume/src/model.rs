//! Particle advection engine.
//!
//! Advects a plume of particles through a vertical wind profile with an
//! explicit Euler step, one step per simulated hour. Each particle draws its
//! perturbation coefficients (angular deviation, speed factor, sink factor)
//! once up front; divergence between trips comes solely from those three
//! coefficients plus the altitude dependence of the wind profile.
//!
//! This is a toy visualization model, not atmospheric physics.

use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

use crate::config::ModelConfig;
use crate::errors::AppError;
use crate::wind::WindProfile;

/// Meters per degree of latitude (small-angle approximation).
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// One simulated hour, in seconds.
pub const STEP_SECONDS: f64 = 3600.0;

/// Where a simulation starts: a registered volcano or raw coordinates.
#[derive(Debug, Clone, Copy)]
pub enum Origin<'a> {
    Volcano(&'a str),
    Point { lat: f64, lon: f64 },
}

/// Request summary attached to every simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SimulationMeta {
    pub source: String,
    pub region: String,
    pub volcano: String,
    /// Simulation start, RFC 3339.
    pub start: String,
    pub duration_hr: i64,
    pub top_alt_m: f64,
    pub particles: usize,
}

/// One particle's recorded trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Trip {
    /// `[lon, lat, alt_m]` per simulated hour, origin first.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub path: Vec<[f64; 3]>,
    /// Epoch seconds, shared across all trips of one simulation.
    pub timestamps: Vec<i64>,
    /// Release level tag, set by the multi-level endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Simulation {
    pub meta: SimulationMeta,
    pub trips: Vec<Trip>,
}

/// Per-particle perturbation, drawn once before the stepping loop.
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    angle_rad: f64,
    speed_factor: f64,
    sink_factor: f64,
}

impl Coefficients {
    /// The unperturbed reference trajectory.
    fn neutral() -> Self {
        Self {
            angle_rad: 0.0,
            speed_factor: 1.0,
            sink_factor: 1.0,
        }
    }

    fn draw(config: &ModelConfig, rng: &mut impl Rng) -> Self {
        let spread = config.angle_spread_deg;
        let (speed_lo, speed_hi) = config.speed_factor_range;
        let (sink_lo, sink_hi) = config.sink_factor_range;
        Self {
            angle_rad: rng.gen_range(-spread..=spread).to_radians(),
            speed_factor: rng.gen_range(speed_lo..=speed_hi),
            sink_factor: rng.gen_range(sink_lo..=sink_hi),
        }
    }
}

/// Runs the advection model and returns one trip per particle.
///
/// `hours` must be non-negative and `particles` at least 1; a volcano name
/// that is not in the registry is rejected with the known names listed.
/// A single-particle run is the unperturbed reference trajectory; with more
/// particles each one gets its own randomized coefficients from `rng`.
#[allow(clippy::too_many_arguments)]
pub fn advect(
    origin: Origin<'_>,
    plume_top_m: f64,
    hours: i64,
    particles: usize,
    profile: Option<&WindProfile>,
    start: OffsetDateTime,
    config: &ModelConfig,
    rng: &mut impl Rng,
) -> Result<Simulation, AppError> {
    if hours < 0 {
        return Err(AppError::InvalidParameter(format!(
            "hours must be non-negative (got {hours})"
        )));
    }
    if particles == 0 {
        return Err(AppError::InvalidParameter(
            "particles must be at least 1".to_string(),
        ));
    }

    let (origin_lat, origin_lon, label) = match origin {
        Origin::Volcano(name) => {
            let v = config.resolve_volcano(name)?;
            (v.lat, v.lon, name.to_lowercase())
        }
        Origin::Point { lat, lon } => (lat, lon, "custom".to_string()),
    };

    let profile = profile.unwrap_or(&config.default_wind);

    // Shared across all trips of this request.
    let timestamps: Vec<i64> = (0..=hours)
        .map(|i| (start + Duration::hours(i)).unix_timestamp())
        .collect();

    let mut trips = Vec::with_capacity(particles);
    for _ in 0..particles {
        let coeff = if particles == 1 {
            Coefficients::neutral()
        } else {
            Coefficients::draw(config, rng)
        };
        trips.push(advect_particle(
            origin_lat, origin_lon, plume_top_m, hours, profile, config, coeff, &timestamps,
        ));
    }

    let meta = SimulationMeta {
        source: "custom_model".to_string(),
        region: config.region.clone(),
        volcano: label,
        start: start.format(&Rfc3339).unwrap_or_default(),
        duration_hr: hours,
        top_alt_m: plume_top_m,
        particles,
    };

    Ok(Simulation { meta, trips })
}

#[allow(clippy::too_many_arguments)]
fn advect_particle(
    origin_lat: f64,
    origin_lon: f64,
    plume_top_m: f64,
    hours: i64,
    profile: &WindProfile,
    config: &ModelConfig,
    coeff: Coefficients,
    timestamps: &[i64],
) -> Trip {
    let (mut lat, mut lon, mut alt) = (origin_lat, origin_lon, plume_top_m);
    let (sin_t, cos_t) = coeff.angle_rad.sin_cos();

    let mut path = Vec::with_capacity(timestamps.len());
    for _ in 0..=hours {
        // Record at the start of the step so index 0 is the unperturbed origin.
        path.push([lon, lat, alt]);

        let (u, v) = profile.lookup(alt);
        let (u, v) = (u * coeff.speed_factor, v * coeff.speed_factor);
        let u_rot = u * cos_t - v * sin_t;
        let v_rot = u * sin_t + v * cos_t;

        let dlat = v_rot * STEP_SECONDS / METERS_PER_DEGREE;
        let dlon = u_rot * STEP_SECONDS / (METERS_PER_DEGREE * lat.to_radians().cos());
        lat += dlat;
        lon += dlon;
        alt = (alt - config.sink_rate_m_per_hr * coeff.sink_factor).max(0.0);
    }

    Trip {
        path,
        timestamps: timestamps.to_vec(),
        level: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wind::WindSample;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::datetime;

    fn start() -> OffsetDateTime {
        datetime!(2026-01-01 00:00:00 UTC)
    }

    fn run(
        origin: Origin<'_>,
        top: f64,
        hours: i64,
        particles: usize,
        profile: Option<&WindProfile>,
        seed: u64,
    ) -> Result<Simulation, AppError> {
        let config = ModelConfig::default();
        let mut rng = StdRng::seed_from_u64(seed);
        advect(origin, top, hours, particles, profile, start(), &config, &mut rng)
    }

    #[test]
    fn merapi_reference_scenario() {
        let sim = run(Origin::Volcano("merapi"), 10_000.0, 12, 1, None, 7).unwrap();
        assert_eq!(sim.trips.len(), 1);
        let trip = &sim.trips[0];
        assert_eq!(trip.path.len(), 13);
        assert_eq!(trip.timestamps.len(), 13);
        assert_eq!(trip.path[0], [110.446, -7.540, 10_000.0]);
        let final_alt = trip.path[12][2];
        assert!((final_alt - 8200.0).abs() < 1e-9, "final alt {final_alt}");
    }

    #[test]
    fn path_and_timestamp_lengths() {
        let sim = run(Origin::Volcano("semeru"), 12_000.0, 5, 4, None, 1).unwrap();
        assert_eq!(sim.trips.len(), 4);
        for trip in &sim.trips {
            assert_eq!(trip.path.len(), 6);
            assert_eq!(trip.timestamps.len(), 6);
        }
    }

    #[test]
    fn timestamps_step_one_hour_and_are_shared() {
        let sim = run(Origin::Volcano("bromo"), 8000.0, 6, 3, None, 2).unwrap();
        let first = &sim.trips[0].timestamps;
        for pair in first.windows(2) {
            assert_eq!(pair[1] - pair[0], 3600);
        }
        for trip in &sim.trips[1..] {
            assert_eq!(&trip.timestamps, first);
        }
    }

    #[test]
    fn altitude_never_increases_and_never_goes_negative() {
        let sim = run(Origin::Volcano("kelud"), 10_000.0, 100, 8, None, 3).unwrap();
        for trip in &sim.trips {
            for pair in trip.path.windows(2) {
                assert!(pair[1][2] <= pair[0][2]);
                assert!(pair[1][2] >= 0.0);
            }
        }
    }

    #[test]
    fn calm_profile_keeps_particles_in_place() {
        let calm = WindProfile::new(vec![
            WindSample::new(0.0, 0.0, 0.0),
            WindSample::new(15_000.0, 0.0, 0.0),
        ]);
        let sim = run(Origin::Volcano("ijen"), 9000.0, 10, 6, Some(&calm), 4).unwrap();
        for trip in &sim.trips {
            for point in &trip.path {
                assert_eq!(point[0], 114.242);
                assert_eq!(point[1], -8.058);
            }
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = run(Origin::Volcano("merapi"), 10_000.0, 12, 5, None, 42).unwrap();
        let b = run(Origin::Volcano("merapi"), 10_000.0, 12, 5, None, 42).unwrap();
        assert_eq!(a.trips, b.trips);
    }

    #[test]
    fn zero_hours_yields_only_the_origin() {
        let sim = run(Origin::Volcano("slamet"), 7000.0, 0, 1, None, 5).unwrap();
        let trip = &sim.trips[0];
        assert_eq!(trip.path, vec![[109.208, -7.242, 7000.0]]);
        assert_eq!(trip.timestamps.len(), 1);
    }

    #[test]
    fn raw_coordinates_are_accepted() {
        let origin = Origin::Point { lat: -6.1, lon: 106.8 };
        let sim = run(origin, 5000.0, 3, 1, None, 6).unwrap();
        assert_eq!(sim.meta.volcano, "custom");
        assert_eq!(sim.trips[0].path[0], [106.8, -6.1, 5000.0]);
    }

    #[test]
    fn unknown_volcano_is_rejected_with_known_names() {
        let err = run(Origin::Volcano("krakatau_typo"), 10_000.0, 12, 1, None, 0).unwrap_err();
        let AppError::InvalidParameter(msg) = err else {
            panic!("expected InvalidParameter");
        };
        assert!(msg.contains("krakatau_typo"));
        assert!(msg.contains("merapi"));
        assert!(msg.contains("tangkuban"));
    }

    #[test]
    fn negative_hours_are_rejected() {
        let err = run(Origin::Volcano("merapi"), 10_000.0, -1, 1, None, 0).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }

    #[test]
    fn zero_particles_are_rejected() {
        let err = run(Origin::Volcano("merapi"), 10_000.0, 12, 0, None, 0).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }
}
