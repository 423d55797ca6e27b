//! HTTP request handlers for the plume API.
//!
//! This module re-exports handlers from focused submodules organized by
//! endpoint family.

pub mod ash;
pub mod dispersion;
pub mod hysplit;
pub mod info;

// Re-export handlers from submodules (including utoipa __path types for OpenAPI)
pub use ash::{
    __path_ash_trajectory, __path_ash_trajectory_multi, AshTrajectoryQuery,
    MULTI_LEVEL_ANGLE_SPREAD_DEG, MultiTrajectoryMeta, MultiTrajectoryResponse, RELEASE_LEVELS_M,
    ash_trajectory, ash_trajectory_multi, sweep_levels,
};
pub use dispersion::{
    __path_ash_dispersion, DispersionMeta, DispersionQuery, DispersionResponse, ash_dispersion,
};
pub use hysplit::{
    __path_hysplit_trajectory, __path_hysplit_trajectory_multi, HysplitMultiMeta,
    HysplitMultiResponse, HysplitTrajectoryMeta, HysplitTrajectoryQuery,
    HysplitTrajectoryResponse, hysplit_trajectory, hysplit_trajectory_multi,
};
pub use info::{__path_about, __path_health_check, AboutResponse, about, health_check};
