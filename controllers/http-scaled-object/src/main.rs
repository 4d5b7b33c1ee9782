//! HTTPScaledObject Controller
//!
//! Keeps a KEDA `ScaledObject` in line with every `HTTPScaledObject`:
//! creates or patches the `<name>` ScaledObject, removes the `<name>-app`
//! object left by older releases and reports the outcome as status
//! conditions on the HTTPScaledObject.

mod backoff;
mod conditions;
mod config;
mod controller;
mod error;
mod metrics;
mod probes;
mod reconciler;
mod status;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    info!("Starting HTTPScaledObject Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  External scaler: {}", config.external_scaler_address());
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Reconcile timeout: {:?}", config.reconcile_timeout);
    info!("  Reconcile concurrency: {}", config.reconcile_concurrency);
    info!("  Resync interval: {:?}", config.resync_interval);
    info!("  Probe port: {}", config.probe_port);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
