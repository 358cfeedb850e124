//! Process startup utilities.

use freestays_config::ObservabilityConfig;
use freestays_core::{FreestaysError, FreestaysResult};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. `log_format = "json"` selects
/// structured output; anything else is human-readable.
pub fn init_logging(config: &ObservabilityConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {}", e);
    }
}

/// Installs the Prometheus exporter and describes every metric.
pub fn init_metrics(config: &ObservabilityConfig) -> FreestaysResult<()> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr: SocketAddr = config.metrics_addr.parse().map_err(|e| {
        FreestaysError::Configuration(format!(
            "Invalid metrics address '{}': {}",
            config.metrics_addr, e
        ))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| FreestaysError::Internal(format!("Failed to install Prometheus exporter: {}", e)))?;

    freestays_service::cache::metrics::register_metrics();
    freestays_service::sync::metrics::register_metrics();
    freestays_jobs::metrics::register_metrics();

    info!("Prometheus metrics on http://{}/metrics", addr);
    Ok(())
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
    ______              _____ __
   / ____/_______  ___ / ___// /_____ ___  _______
  / /_  / ___/ _ \/ _ \\__ \/ __/ __ `/ / / / ___/
 / __/ / /  /  __/  __/__/ / /_/ /_/ / /_/ (__  )
/_/   /_/   \___/\___/____/\__/\__,_/\__, /____/
                                    /____/
              SunHotels cache and sync
    "#);
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
