//! Ash dispersion grid simulation driven by current wind data.
//!
//! Drifts a spreading point cloud downwind using the 100 m wind resolved by
//! [`crate::meteo::OpenMeteoService`]. Wind resolution is masked-fallback,
//! so this endpoint keeps the same always-renders contract as the HYSPLIT
//! fetcher; the `source` tag tells real wind from the synthetic substitute.

use std::sync::Arc;

use axum::{Extension, extract::Query, response::Json};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{config::ModelConfig, errors::AppError, meteo::OpenMeteoService};

/// Jittered points emitted per simulated hour.
const POINTS_PER_HOUR: usize = 30;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DispersionQuery {
    /// Volcano name, case-insensitive. Defaults to merapi.
    pub volcano: Option<String>,
    /// Duration in simulated hours.
    pub hours: Option<i64>,
    /// Reference flight altitude, feet.
    pub alt: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispersionMeta {
    pub source: String,
    pub volcano: String,
    pub duration_hr: i64,
    pub altitude_ft: i64,
    /// Wind speed at 100 m, m/s.
    pub u_speed: f64,
    /// Wind direction at 100 m, degrees.
    pub u_dir: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispersionResponse {
    pub meta: DispersionMeta,
    /// `[lon, lat, alt_km, intensity]` per point.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub points: Vec<[f64; 4]>,
    pub levels_km: Vec<f64>,
}

/// Drift a spreading ash cloud using current Open-Meteo wind.
#[utoipa::path(
    get,
    path = "/api/ash_dispersion",
    tag = "ash",
    params(DispersionQuery),
    responses(
        (status = 200, description = "Dispersed ash point cloud", body = DispersionResponse),
        (status = 400, description = "Unknown volcano or invalid parameter")
    )
)]
pub async fn ash_dispersion(
    Extension(config): Extension<Arc<ModelConfig>>,
    Extension(meteo): Extension<OpenMeteoService>,
    Query(q): Query<DispersionQuery>,
) -> Result<Json<DispersionResponse>, AppError> {
    let volcano = q.volcano.as_deref().unwrap_or("merapi");
    let hours = q.hours.unwrap_or(config.default_duration_hr);
    if hours < 0 {
        return Err(AppError::InvalidParameter(format!(
            "hours must be non-negative (got {hours})"
        )));
    }
    let altitude_ft = q.alt.unwrap_or(20_000);
    let v = config.resolve_volcano(volcano)?;

    let (speed, dir, source) = meteo.resolve_wind(&config, v.lat, v.lon).await;

    let cloud = disperse(v.lat, v.lon, speed, dir, hours, &mut rand::thread_rng());

    let meta = DispersionMeta {
        source: source.to_string(),
        volcano: volcano.to_lowercase(),
        duration_hr: hours,
        altitude_ft,
        u_speed: (speed * 100.0).round() / 100.0,
        u_dir: (dir * 10.0).round() / 10.0,
    };

    Ok(Json(DispersionResponse {
        meta,
        points: cloud.points,
        levels_km: cloud.levels_km,
    }))
}

struct Cloud {
    points: Vec<[f64; 4]>,
    levels_km: Vec<f64>,
}

/// Drifts the cloud center downwind hour by hour, scattering jittered points
/// around it with a spread that grows over time. Intensity counts down from
/// `hours` so older puffs render fainter.
fn disperse(lat0: f64, lon0: f64, speed: f64, dir_deg: f64, hours: i64, rng: &mut impl Rng) -> Cloud {
    let rad = dir_deg.to_radians();
    let u = rad.sin() * speed / 111.0;
    let v = rad.cos() * speed / 111.0;

    let levels_km: Vec<f64> = (1..=20).map(|i| f64::from(i) * 0.5).collect();

    let mut points = Vec::with_capacity(hours as usize * POINTS_PER_HOUR);
    for t in 0..hours {
        let step = (t + 1) as f64;
        let lon = lon0 + u * step;
        let lat = lat0 + v * step;
        let spread = 0.1 + 0.02 * t as f64;
        for _ in 0..POINTS_PER_HOUR {
            let lon_j = lon + rng.gen_range(-spread..=spread);
            let lat_j = lat + rng.gen_range(-spread..=spread);
            let alt_j = levels_km[rng.gen_range(0..levels_km.len())];
            points.push([lon_j, lat_j, alt_j, (hours - t) as f64]);
        }
    }

    Cloud { points, levels_km }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn cloud_has_thirty_points_per_hour() {
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = disperse(-7.54, 110.446, 5.0, 90.0, 12, &mut rng);
        assert_eq!(cloud.points.len(), 12 * POINTS_PER_HOUR);
        assert_eq!(cloud.levels_km.len(), 20);
        assert_eq!(cloud.levels_km[0], 0.5);
        assert_eq!(cloud.levels_km[19], 10.0);
    }

    #[test]
    fn intensity_counts_down_over_time() {
        let mut rng = StdRng::seed_from_u64(2);
        let cloud = disperse(-7.54, 110.446, 5.0, 90.0, 3, &mut rng);
        assert_eq!(cloud.points[0][3], 3.0);
        assert_eq!(cloud.points[cloud.points.len() - 1][3], 1.0);
    }

    #[test]
    fn zero_hours_yields_no_points() {
        let mut rng = StdRng::seed_from_u64(3);
        let cloud = disperse(-7.54, 110.446, 5.0, 90.0, 0, &mut rng);
        assert!(cloud.points.is_empty());
    }
}
