//! # FreeStays Server
//!
//! Runs the SunHotels static data sync on its schedule, with the provider
//! cache and booking services wired to the configured MySQL and Redis.

use freestays_config::{ConfigLoader, ObservabilityConfig};
use freestays_core::FreestaysResult;
use freestays_server::app::App;
use freestays_server::startup::{init_logging, init_metrics, print_banner, shutdown_signal};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let loader = match ConfigLoader::from_default_location() {
        Ok(loader) => loader,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    let config = loader.get().await;
    init_logging(&config.observability);

    print_banner();
    info!("Starting FreeStays Server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: freestays_config::AppConfig) -> FreestaysResult<()> {
    init_metrics(&config.observability)?;

    let app = App::build(config).await?;
    for job in app.scheduler.list() {
        info!(job = %job.name, cron = %job.cron, next_run = ?job.next_run, "Scheduled");
    }

    app.run(shutdown_signal()).await
}
