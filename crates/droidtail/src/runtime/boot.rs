//! Boot — logging init, config load, adb client creation.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::adb::AdbClient;
use crate::config::AppConfig;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "droidtail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load and validate the configuration and build the adb client.
pub fn boot() -> Result<(AdbClient, AppConfig), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    info!(
        "Pipeline: batch_size={}, batch_interval={}ms, coalesce_interval={}ms, view_capacity={}",
        config.pipeline.batch_size,
        config.pipeline.batch_interval_ms,
        config.pipeline.coalesce_interval_ms,
        config.pipeline.view_capacity
    );

    let client = AdbClient::new(&config.adb_path)?;
    Ok((client, config))
}
