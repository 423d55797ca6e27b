//! Open-Meteo wind fetcher.
//!
//! Supplies the 100 m wind that drives the dispersion endpoint. Like the
//! HYSPLIT fetcher, the resolving call never fails: when the upstream is
//! unreachable the wind is taken from the default profile instead and the
//! substitution is reported through the returned source tag.

use std::time::Duration as StdDuration;

use anyhow::anyhow;
use serde::Deserialize;
use tracing::warn;

use crate::config::ModelConfig;

/// Production GFS endpoint.
pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/gfs";

/// Altitude of the fetched wind level, meters.
const WIND_LEVEL_M: f64 = 100.0;

#[derive(Debug, Deserialize)]
struct MeteoResponse {
    hourly: MeteoHourly,
}

#[derive(Debug, Deserialize)]
struct MeteoHourly {
    windspeed_100m: Vec<f64>,
    winddirection_100m: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoService {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoService {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Wind `(speed m/s, direction degrees, source tag)` at a point.
    ///
    /// Infallible by design: on any upstream error the wind comes from the
    /// config's default profile at 100 m and the result is tagged
    /// `synthetic_fallback`.
    pub async fn resolve_wind(
        &self,
        config: &ModelConfig,
        lat: f64,
        lon: f64,
    ) -> (f64, f64, &'static str) {
        match self.fetch_surface_wind(lat, lon).await {
            Ok((speed, dir)) => (speed, dir, "open-meteo gfs"),
            Err(e) => {
                warn!("Open-Meteo fetch failed, using default profile wind: {e}");
                let (u, v) = config.default_wind.lookup(WIND_LEVEL_M);
                let speed = u.hypot(v);
                let dir = u.atan2(v).to_degrees().rem_euclid(360.0);
                (speed, dir, "synthetic_fallback")
            }
        }
    }

    async fn fetch_surface_wind(&self, lat: f64, lon: f64) -> anyhow::Result<(f64, f64)> {
        let meteo: MeteoResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("hourly", "windspeed_100m,winddirection_100m".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let speed = *meteo
            .hourly
            .windspeed_100m
            .first()
            .ok_or_else(|| anyhow!("empty windspeed series"))?;
        let dir = *meteo
            .hourly
            .winddirection_100m
            .first()
            .ok_or_else(|| anyhow!("empty winddirection series"))?;
        Ok((speed, dir))
    }
}
