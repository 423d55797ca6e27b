//! Vertical wind profiles and interpolation.
//!
//! A profile is an ordered stack of altitude samples with horizontal wind
//! components. Lookups interpolate linearly between samples and clamp to the
//! edge values outside the sampled range, so a lookup is total over any
//! finite altitude.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One altitude level of a wind profile.
///
/// `u` is the eastward component, `v` the northward component, both in m/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct WindSample {
    pub altitude_m: f64,
    pub u: f64,
    pub v: f64,
}

impl WindSample {
    pub const fn new(altitude_m: f64, u: f64, v: f64) -> Self {
        Self { altitude_m, u, v }
    }
}

/// Discretized vertical wind profile.
///
/// Invariant: samples are non-empty and strictly increasing in altitude.
/// Deserialization goes through the same validation as [`WindProfile::try_new`],
/// so a caller-supplied profile can never violate the invariant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "ProfileSamples")]
pub struct WindProfile {
    samples: Vec<WindSample>,
}

#[derive(Deserialize)]
struct ProfileSamples {
    samples: Vec<WindSample>,
}

impl TryFrom<ProfileSamples> for WindProfile {
    type Error = String;

    fn try_from(raw: ProfileSamples) -> Result<Self, String> {
        Self::try_new(raw.samples)
    }
}

impl WindProfile {
    pub fn try_new(samples: Vec<WindSample>) -> Result<Self, String> {
        if samples.is_empty() {
            return Err("wind profile needs at least one sample".to_string());
        }
        if !samples
            .windows(2)
            .all(|w| w[0].altitude_m < w[1].altitude_m)
        {
            return Err("wind profile altitudes must be strictly increasing".to_string());
        }
        Ok(Self { samples })
    }

    /// Panicking constructor for profiles known to be well-formed.
    pub fn new(samples: Vec<WindSample>) -> Self {
        match Self::try_new(samples) {
            Ok(profile) => profile,
            Err(msg) => panic!("{msg}"),
        }
    }

    /// Idealized profile over Java: low-level easterlies, mid-level
    /// westerlies, upper-level northerlies.
    pub fn default_java() -> Self {
        Self::new(vec![
            WindSample::new(0.0, -4.0, 1.0),
            WindSample::new(2000.0, -2.0, 1.0),
            WindSample::new(5000.0, 2.0, 2.0),
            WindSample::new(8000.0, 6.0, 1.0),
            WindSample::new(12000.0, 10.0, 0.0),
            WindSample::new(15000.0, 8.0, -2.0),
        ])
    }

    /// Horizontal wind `(u, v)` at the given altitude, in m/s.
    ///
    /// Linear interpolation between the bracketing samples; outside the
    /// sampled range the nearest edge value is returned.
    pub fn lookup(&self, altitude_m: f64) -> (f64, f64) {
        let first = self.samples[0];
        if altitude_m <= first.altitude_m {
            return (first.u, first.v);
        }
        let last = self.samples[self.samples.len() - 1];
        if altitude_m >= last.altitude_m {
            return (last.u, last.v);
        }

        for pair in self.samples.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if altitude_m <= hi.altitude_m {
                let t = (altitude_m - lo.altitude_m) / (hi.altitude_m - lo.altitude_m);
                return (lo.u + t * (hi.u - lo.u), lo.v + t * (hi.v - lo.v));
            }
        }

        // Unreachable: altitude is strictly between the first and last sample.
        (last.u, last.v)
    }
}
