//! Main controller implementation.
//!
//! Wires the kube client, the ScaledObject store, the reconciler, the
//! watcher and the probe server together.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::probes::{self, ProbeState};
use crate::reconciler::Reconciler;
use crate::status::KubeStatusWriter;
use crate::watcher::Watcher;
use crds::{HTTPScaledObject, ScaledObject};
use keda_client::{CallContext, KedaClient};
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Main controller for HTTPScaledObject reconciliation.
pub struct Controller {
    shutdown: CancellationToken,
    http_scaled_object_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing HTTPScaledObject Controller");

        let kube_client = Client::try_default().await?;
        let keda_client = KedaClient::new(kube_client.clone());

        let (http_scaled_object_api, scaled_object_api): (Api<HTTPScaledObject>, Api<ScaledObject>) =
            match config.watch_namespace.as_deref() {
                Some(ns) => (
                    Api::namespaced(kube_client.clone(), ns),
                    Api::namespaced(kube_client.clone(), ns),
                ),
                None => (Api::all(kube_client.clone()), Api::all(kube_client.clone())),
            };

        let shutdown = CancellationToken::new();
        let metrics = Metrics::new()?;
        let probe_state = ProbeState::new(metrics.clone());

        let reconciler = Arc::new(Reconciler::new(
            Box::new(keda_client),
            Box::new(KubeStatusWriter::new(kube_client)),
            config.clone(),
            CallContext::new(shutdown.clone(), None),
            metrics,
        ));

        let watcher = Watcher::new(
            reconciler,
            http_scaled_object_api,
            scaled_object_api,
            config.reconcile_concurrency,
            probe_state.clone(),
        );

        let probe_server = {
            let shutdown = shutdown.clone();
            let port = config.probe_port;
            tokio::spawn(async move { probes::serve(port, probe_state, shutdown).await })
        };

        let http_scaled_object_watcher =
            tokio::spawn(async move { watcher.watch_http_scaled_objects().await });

        Ok(Self {
            shutdown,
            http_scaled_object_watcher,
            probe_server,
        })
    }

    /// Runs until the watcher stops or the probe server fails.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("HTTPScaledObject Controller running");

        let Self {
            shutdown,
            mut http_scaled_object_watcher,
            mut probe_server,
        } = self;

        let result = tokio::select! {
            result = &mut http_scaled_object_watcher => {
                result
                    .map_err(|e| ControllerError::Watch(format!("HTTPScaledObject watcher panicked: {}", e)))
                    .and_then(|r| r)
            }
            result = &mut probe_server => {
                error!("Probe server exited");
                result
                    .map_err(|e| ControllerError::Watch(format!("Probe server panicked: {}", e)))
                    .and_then(|r| r)
            }
        };

        // Aborts in-flight store calls and stops the probe server.
        shutdown.cancel();
        if !probe_server.is_finished() {
            let _ = probe_server.await;
        }
        info!("HTTPScaledObject Controller stopped");
        result
    }
}
