//! Integration tests for the trajectory service layer.
//!
//! These tests exercise the public library surface the handlers are built
//! on: the advection engine with the default configuration, the wire shape
//! of serialized simulations, and the HYSPLIT fetcher's masked-fallback
//! contract (pointed at an unreachable upstream, so no network is needed).

use std::sync::Arc;

use plume::config::ModelConfig;
use plume::handlers::sweep_levels;
use plume::hysplit::{HysplitService, TrajectorySource};
use plume::meteo::OpenMeteoService;
use plume::model::{Origin, advect};
use rand::SeedableRng;
use rand::rngs::StdRng;
use time::macros::datetime;

fn fixed_start() -> time::OffsetDateTime {
    datetime!(2026-01-01 00:00:00 UTC)
}

#[test]
fn full_simulation_matches_wire_format() {
    let config = ModelConfig::default();
    let mut rng = StdRng::seed_from_u64(11);
    let sim = advect(
        Origin::Volcano("merapi"),
        10_000.0,
        12,
        3,
        None,
        fixed_start(),
        &config,
        &mut rng,
    )
    .expect("simulation should succeed");

    let value = serde_json::to_value(&sim).expect("simulation serializes");

    let meta = &value["meta"];
    assert_eq!(meta["source"], "custom_model");
    assert_eq!(meta["region"], "Java Island");
    assert_eq!(meta["volcano"], "merapi");
    assert_eq!(meta["duration_hr"], 12);
    assert_eq!(meta["particles"], 3);

    let trips = value["trips"].as_array().expect("trips array");
    assert_eq!(trips.len(), 3);
    for trip in trips {
        let path = trip["path"].as_array().expect("path array");
        let timestamps = trip["timestamps"].as_array().expect("timestamps array");
        assert_eq!(path.len(), 13);
        assert_eq!(timestamps.len(), 13);
        for point in path {
            assert_eq!(point.as_array().map(Vec::len), Some(3));
        }
        // The level tag only appears on multi-level responses.
        assert!(trip.get("level").is_none());
    }
}

#[test]
fn particles_diverge_but_share_timestamps() {
    let config = ModelConfig::default();
    let mut rng = StdRng::seed_from_u64(23);
    let sim = advect(
        Origin::Volcano("semeru"),
        12_000.0,
        8,
        5,
        None,
        fixed_start(),
        &config,
        &mut rng,
    )
    .expect("simulation should succeed");

    let reference = &sim.trips[0];
    assert!(
        sim.trips[1..].iter().any(|trip| trip.path != reference.path),
        "perturbed particles should not all follow the same path"
    );
    for trip in &sim.trips {
        assert_eq!(trip.timestamps, reference.timestamps);
    }
}

#[test]
fn multi_level_sweep_serializes_level_tags() {
    let config = ModelConfig::default();
    let mut rng = StdRng::seed_from_u64(17);
    let (levels, trips) =
        sweep_levels(&config, "bromo", 6, 5000.0, 2, fixed_start(), &mut rng)
            .expect("sweep should succeed");

    // Cutoff at 7000 m leaves the two lowest release levels.
    assert_eq!(levels, vec![3000.0, 5000.0]);
    assert_eq!(trips.len(), 4);

    let value = serde_json::to_value(&trips).expect("trips serialize");
    let serialized = value.as_array().expect("trips array");
    for (i, trip) in serialized.iter().enumerate() {
        assert_eq!(trip["level"], levels[i / 2]);
        assert_eq!(trip["path"].as_array().map(Vec::len), Some(7));
    }
}

#[tokio::test]
async fn unreachable_open_meteo_wind_is_masked_by_profile_fallback() {
    // Nothing listens here, so the fetch fails fast.
    let service = OpenMeteoService::new("http://127.0.0.1:9/v1/gfs".to_string())
        .expect("client builds");
    let config = ModelConfig::default();

    let (speed, dir, source) = service.resolve_wind(&config, -7.54, 110.446).await;

    assert_eq!(source, "synthetic_fallback");

    // The substitute wind must be the default profile's 100 m level.
    let (u, v) = config.default_wind.lookup(100.0);
    assert!((speed - u.hypot(v)).abs() < 1e-12);
    assert!((dir - u.atan2(v).to_degrees().rem_euclid(360.0)).abs() < 1e-12);
}

#[tokio::test]
async fn unreachable_upstream_is_masked_by_fallback() {
    // Nothing listens here, so the fetch fails fast.
    let service = Arc::new(
        HysplitService::new("http://127.0.0.1:9/trajectory".to_string())
            .expect("client builds"),
    );

    let (trip, source) = service
        .fetch_trajectory(-7.54, 110.446, 10_000.0, 12, fixed_start())
        .await;

    assert_eq!(source, TrajectorySource::OfflineFallback);
    assert_eq!(source.as_str(), "hysplit_offline_fallback");
    assert_eq!(trip.path.len(), 13);
    assert_eq!(trip.timestamps.len(), 13);
    assert_eq!(trip.path[0], [110.446, -7.54, 10_000.0]);
    for pair in trip.timestamps.windows(2) {
        assert_eq!(pair[1] - pair[0], 3600);
    }
    for pair in trip.path.windows(2) {
        assert!(pair[1][2] <= pair[0][2]);
        assert!(pair[1][2] >= 0.0);
    }
}
