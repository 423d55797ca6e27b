//! NOAA HYSPLIT trajectory fetcher.
//!
//! The READY API is not wired up yet, so a reachable upstream still yields
//! placeholder drift data; what matters to callers is the contract that a
//! fetch never fails. Any upstream problem is masked by a locally generated
//! trajectory and reported only through the `source` tag, so the front-end
//! always has something to draw.

use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tracing::warn;

use crate::errors::AppError;
use crate::model::Trip;

/// Upstream sink rate used by the drift placeholder, m/hour.
const DRIFT_SINK_M_PER_HR: f64 = 200.0;

/// Where a fetched trajectory actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectorySource {
    /// Upstream was reachable; placeholder data until the real API lands.
    Mock,
    /// Upstream was unreachable; locally generated substitute.
    OfflineFallback,
}

impl TrajectorySource {
    pub fn as_str(self) -> &'static str {
        match self {
            TrajectorySource::Mock => "hysplit_mock",
            TrajectorySource::OfflineFallback => "hysplit_offline_fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HysplitService {
    client: reqwest::Client,
    base_url: String,
}

impl HysplitService {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Fetches a trajectory for one release point.
    ///
    /// Infallible by design: on any upstream error the drift placeholder is
    /// returned with [`TrajectorySource::OfflineFallback`].
    pub async fn fetch_trajectory(
        &self,
        lat: f64,
        lon: f64,
        height_m: f64,
        duration_hr: i64,
        start: OffsetDateTime,
    ) -> (Trip, TrajectorySource) {
        let source = match self.probe_upstream(lat, lon, height_m, duration_hr).await {
            Ok(()) => TrajectorySource::Mock,
            Err(e) => {
                warn!("HYSPLIT fetch failed, using offline fallback: {e}");
                TrajectorySource::OfflineFallback
            }
        };
        (drift_trajectory(lat, lon, height_m, duration_hr, start), source)
    }

    async fn probe_upstream(
        &self,
        lat: f64,
        lon: f64,
        height_m: f64,
        duration_hr: i64,
    ) -> Result<(), AppError> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("height", height_m.to_string()),
                ("hours", duration_hr.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Deterministic drift path: 0.15 degrees east and 0.05 degrees south per
/// hour, sinking at 200 m/hour, altitude floored at zero.
fn drift_trajectory(
    lat: f64,
    lon: f64,
    height_m: f64,
    duration_hr: i64,
    start: OffsetDateTime,
) -> Trip {
    let steps = duration_hr.max(0);
    let mut path = Vec::with_capacity(steps as usize + 1);
    let mut timestamps = Vec::with_capacity(steps as usize + 1);
    for i in 0..=steps {
        let t = i as f64;
        timestamps.push((start + Duration::hours(i)).unix_timestamp());
        path.push([
            lon + 0.15 * t,
            lat - 0.05 * t,
            (height_m - DRIFT_SINK_M_PER_HR * t).max(0.0),
        ]);
    }
    Trip {
        path,
        timestamps,
        level: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn drift_path_has_one_point_per_hour() {
        let trip = drift_trajectory(-7.54, 110.446, 10_000.0, 12, datetime!(2026-01-01 00:00:00 UTC));
        assert_eq!(trip.path.len(), 13);
        assert_eq!(trip.timestamps.len(), 13);
        assert_eq!(trip.path[0], [110.446, -7.54, 10_000.0]);
    }

    #[test]
    fn drift_altitude_floors_at_zero() {
        let trip = drift_trajectory(0.0, 0.0, 500.0, 10, datetime!(2026-01-01 00:00:00 UTC));
        assert!(trip.path.iter().all(|p| p[2] >= 0.0));
        assert_eq!(trip.path[9][2], 0.0);
    }
}
