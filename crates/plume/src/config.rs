//! Model configuration: the volcano registry and advection parameters.
//!
//! Everything the advection engine reads is carried in [`ModelConfig`] and
//! passed in explicitly, so tests can substitute deterministic profiles and
//! parameters instead of patching globals.

use std::collections::HashMap;
use std::env;

use serde::Serialize;

use crate::errors::AppError;
use crate::wind::WindProfile;

/// A registered eruption source.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Volcano {
    pub lat: f64,
    pub lon: f64,
    pub elev_m: f64,
}

impl Volcano {
    pub const fn new(lat: f64, lon: f64, elev_m: f64) -> Self {
        Self { lat, lon, elev_m }
    }
}

/// The main volcanoes of Java.
pub const VOLCANOES: &[(&str, Volcano)] = &[
    ("merapi", Volcano::new(-7.540, 110.446, 2930.0)),
    ("semeru", Volcano::new(-8.108, 112.922, 3676.0)),
    ("bromo", Volcano::new(-7.942, 112.953, 2329.0)),
    ("kelud", Volcano::new(-7.934, 112.308, 1731.0)),
    ("ijen", Volcano::new(-8.058, 114.242, 2799.0)),
    ("slamet", Volcano::new(-7.242, 109.208, 3428.0)),
    ("tangkuban", Volcano::new(-6.759, 107.606, 2084.0)),
];

/// Parameters of the advection model plus the volcano registry.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    volcanoes: HashMap<String, Volcano>,
    /// Label attached to result metadata.
    pub region: String,
    pub default_wind: WindProfile,
    /// Nominal particle sink rate, before the per-particle factor.
    pub sink_rate_m_per_hr: f64,
    /// Half-width of the per-particle angular deviation, degrees.
    pub angle_spread_deg: f64,
    /// Uniform range for the per-particle speed factor.
    pub speed_factor_range: (f64, f64),
    /// Uniform range for the per-particle sink factor.
    pub sink_factor_range: (f64, f64),
    pub default_duration_hr: i64,
    pub default_plume_top_m: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let volcanoes = VOLCANOES
            .iter()
            .map(|(name, v)| (name.to_string(), *v))
            .collect();
        Self {
            volcanoes,
            region: "Java Island".to_string(),
            default_wind: WindProfile::default_java(),
            sink_rate_m_per_hr: 150.0,
            angle_spread_deg: 15.0,
            speed_factor_range: (0.8, 1.2),
            sink_factor_range: (0.8, 1.2),
            default_duration_hr: 12,
            default_plume_top_m: 10_000.0,
        }
    }
}

impl ModelConfig {
    /// Defaults overridden by `DEFAULT_MODEL_DURATION` and
    /// `DEFAULT_PLUME_HEIGHT_M`, when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(hours) = read_env_parse("DEFAULT_MODEL_DURATION") {
            config.default_duration_hr = hours;
        }
        if let Some(height) = read_env_parse("DEFAULT_PLUME_HEIGHT_M") {
            config.default_plume_top_m = height;
        }
        config
    }

    /// Case-insensitive registry lookup; the error lists the known names.
    pub fn resolve_volcano(&self, name: &str) -> Result<&Volcano, AppError> {
        let key = name.to_lowercase();
        self.volcanoes.get(&key).ok_or_else(|| {
            AppError::InvalidParameter(format!(
                "Unknown volcano '{name}'. Pick one of: {}",
                self.known_names().join(", ")
            ))
        })
    }

    /// Registered names, sorted for stable error messages.
    pub fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.volcanoes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn read_env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.parse().ok())
}
