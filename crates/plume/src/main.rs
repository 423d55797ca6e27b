use std::env;
use std::sync::Arc;

use plume::config::ModelConfig;
use plume::hysplit::HysplitService;
use plume::meteo::{DEFAULT_OPEN_METEO_URL, OpenMeteoService};
use plume::run_server;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let noaa_base_url = env::var("NOAA_BASE_URL")
        .unwrap_or_else(|_| "https://apps.arl.noaa.gov/ready2/api/v1/trajectory".to_string());

    let port = env::var("PORT")
        .unwrap_or_else(|_| "5000".to_string())
        .parse::<u16>()
        .unwrap_or(5000);

    let open_meteo_url = env::var("OPEN_METEO_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_OPEN_METEO_URL.to_string());

    let config = Arc::new(ModelConfig::from_env());
    let hysplit = HysplitService::new(noaa_base_url)?;
    let meteo = OpenMeteoService::new(open_meteo_url)?;

    run_server(config, hysplit, meteo, port).await
}
