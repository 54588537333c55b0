//! Connstat Exporter: reports local TCP connection counts by address family and
//! state as Prometheus gauges.
//!
//! The library provides the connection table enumeration, the `tcp_local`
//! collector, a registry of named collectors and the HTTP exposition endpoint
//! that runs them on every scrape.
use std::sync::Arc;

use error::ResultLogExt;

pub mod api;
pub mod collector;
pub mod config;
pub mod connections;
pub mod error;
pub mod exporter;
pub mod fsutil;
pub mod metrics;

/// Runs the exporter.
///
/// Reads the configuration from the environment, builds the enabled collectors
/// and serves `/metrics` until Ctrl-C or `SIGTERM`.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid environment variables (e.g., a malformed `LISTEN_ADDR`).
/// - Unknown collector names in `ENABLED_COLLECTORS`.
/// - A `METRICS_NAMESPACE` that yields invalid metric names.
/// - Failure to bind the listen address.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Configuration: {:?}", config);

    let registry = collector::CollectorRegistry::builtin();
    let collectors = registry.build(&config.collectors, &config.collector_settings())?;
    log::info!("Enabled collectors: {}", config.collectors.join(", "));

    let exporter = Arc::new(exporter::Exporter::new(
        &config.namespace,
        config.scrape_timeout,
        collectors,
    )?);

    api::APIServer::new(exporter)
        .listen(config.listen_addr, shutdown_signal())
        .await?;
    log::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c()
            .await
            .log_err("failed to listen for Ctrl-C")
            .is_none()
        {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()).log_err("failed to listen for SIGTERM") {
            Some(mut sigterm) => {
                sigterm.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
