//! Kubernetes resource watcher.
//!
//! Drives reconciliation with `kube_runtime::Controller`, which handles
//! reconnection, per-object serialization and requeues. ScaledObjects owned
//! by an HTTPScaledObject are watched too, so edits to a derived object
//! retrigger its owner.

use crate::error::ControllerError;
use crate::probes::ProbeState;
use crate::reconciler::{resource_key, Reconciler};
use crds::{HTTPScaledObject, ScaledObject};
use futures::StreamExt;
use kube::Api;
use kube_runtime::{
    controller::{Action, Config as ControllerConfig},
    watcher, Controller,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEBOUNCE: Duration = Duration::from_secs(1);

async fn reconcile(httpso: Arc<HTTPScaledObject>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let key = resource_key(&httpso);
    debug!("Reconciling HTTPScaledObject {}", key);

    reconciler.reconcile_http_scaled_object(&httpso).await?;
    reconciler.reset_error(&key);
    Ok(Action::requeue(reconciler.resync_interval()))
}

fn error_policy(httpso: Arc<HTTPScaledObject>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    let key = resource_key(&httpso);
    let (delay, error_count) = reconciler.record_failure(&key);
    error!(
        "Reconciliation error for HTTPScaledObject {} (attempt {}): {}, retrying in {:?}",
        key, error_count, error, delay
    );
    Action::requeue(delay)
}

/// Watches HTTPScaledObjects and the ScaledObjects they own.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    http_scaled_object_api: Api<HTTPScaledObject>,
    scaled_object_api: Api<ScaledObject>,
    concurrency: u16,
    probes: ProbeState,
}

impl Watcher {
    pub fn new(
        reconciler: Arc<Reconciler>,
        http_scaled_object_api: Api<HTTPScaledObject>,
        scaled_object_api: Api<ScaledObject>,
        concurrency: u16,
        probes: ProbeState,
    ) -> Self {
        Self {
            reconciler,
            http_scaled_object_api,
            scaled_object_api,
            concurrency,
            probes,
        }
    }

    /// Runs until the controller stream ends (on SIGTERM/ctrl-c).
    pub async fn watch_http_scaled_objects(&self) -> Result<(), ControllerError> {
        info!("Starting HTTPScaledObject watcher");

        let controller_config = ControllerConfig::default()
            .debounce(DEBOUNCE)
            .concurrency(self.concurrency);

        self.probes.set_ready(true);

        Controller::new(self.http_scaled_object_api.clone(), watcher::Config::default())
            .owns(self.scaled_object_api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!(
                        "Reconciled {}/{}",
                        obj.namespace.as_deref().unwrap_or("default"),
                        obj.name
                    ),
                    Err(e) => warn!("Controller error: {}", e),
                }
            })
            .await;

        self.probes.set_ready(false);
        info!("HTTPScaledObject watcher stopped");
        Ok(())
    }
}
