//! Reconciliation logic for HTTPScaledObjects.
//!
//! - `scaled_object`: create-or-patch of the derived ScaledObject
//! - `legacy`: removal of the `<name>-app` ScaledObject left by older releases

pub mod legacy;
pub mod scaled_object;

#[cfg(test)]
mod scaled_object_test;

use crate::backoff::BackoffTable;
use crate::conditions::{add_condition, create_condition, ConditionExt};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::metrics::Metrics;
use crate::status::StatusWriter;
use crds::{ConditionReason, ConditionStatus, ConditionType, HTTPScaledObject};
use keda_client::{CallContext, KedaClientTrait};
use kube::ResourceExt;
use legacy::LegacyPurge;
use scaled_object::create_or_update_scaled_object;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// `namespace/name` key used for backoff bookkeeping and logs
pub fn resource_key(httpso: &HTTPScaledObject) -> String {
    format!(
        "{}/{}",
        httpso.namespace().unwrap_or_else(|| "default".to_string()),
        httpso.name_any()
    )
}

/// Runs one pass of the protocol against `httpso`, recording its conditions.
///
/// A first sighting (no conditions yet) is marked `Pending`; a successful
/// upsert and purge is marked `Ready`.
pub async fn apply_http_scaled_object(
    keda_client: &dyn KedaClientTrait,
    ctx: &CallContext,
    external_scaler_address: &str,
    httpso: &mut HTTPScaledObject,
) -> Result<LegacyPurge, ControllerError> {
    if httpso.conditions().is_empty() {
        add_condition(
            httpso,
            create_condition(
                ConditionType::Pending,
                ConditionStatus::Unknown,
                ConditionReason::PendingCreation,
            )
            .with_message("Identified HTTPScaledObject creation signal"),
        );
    }

    let result = create_or_update_scaled_object(keda_client, ctx, external_scaler_address, httpso).await;

    if result.is_ok() {
        add_condition(
            httpso,
            create_condition(
                ConditionType::Ready,
                ConditionStatus::True,
                ConditionReason::HTTPScaledObjectIsReady,
            )
            .with_message("Finished object creation"),
        );
    }

    result
}

/// Reconciles HTTPScaledObjects.
pub struct Reconciler {
    pub(crate) keda_client: Box<dyn KedaClientTrait>,
    status_writer: Box<dyn StatusWriter>,
    config: ControllerConfig,
    /// Parent of every per-reconcile context; cancelled on shutdown
    root: CallContext,
    backoff: BackoffTable,
    metrics: Metrics,
}

impl Reconciler {
    pub fn new(
        keda_client: Box<dyn KedaClientTrait>,
        status_writer: Box<dyn StatusWriter>,
        config: ControllerConfig,
        root: CallContext,
        metrics: Metrics,
    ) -> Self {
        Self {
            keda_client,
            status_writer,
            config,
            root,
            backoff: BackoffTable::new(),
            metrics,
        }
    }

    /// Reconcile an HTTPScaledObject
    ///
    /// Status is written only when the pass changed the conditions. A failed
    /// status write fails the reconcile unless the pass already failed.
    pub async fn reconcile_http_scaled_object(&self, httpso: &HTTPScaledObject) -> Result<(), ControllerError> {
        let name = httpso.metadata.name.as_deref().ok_or_else(|| {
            ControllerError::InvalidConfig("HTTPScaledObject missing name".to_string())
        })?;
        let namespace = httpso.namespace().unwrap_or_else(|| "default".to_string());

        if httpso.metadata.deletion_timestamp.is_some() {
            info!("HTTPScaledObject {}/{} is being deleted, skipping", namespace, name);
            return Ok(());
        }

        info!("Reconciling HTTPScaledObject {}/{}", namespace, name);
        let started = Instant::now();
        let ctx = self.root.child(self.config.reconcile_timeout);
        let scaler_address = self.config.external_scaler_address();

        let mut desired = httpso.clone();
        let mut result =
            apply_http_scaled_object(self.keda_client.as_ref(), &ctx, &scaler_address, &mut desired).await;

        if desired.conditions() != httpso.conditions() {
            let persisted = self
                .status_writer
                .patch_conditions(&ctx, &namespace, name, desired.conditions())
                .await
                .into_result();
            if let Err(e) = persisted {
                error!("Failed to update status of HTTPScaledObject {}/{}: {}", namespace, name, e);
                if result.is_ok() {
                    result = Err(e.into());
                }
            }
        }

        if let Ok(LegacyPurge::Deleted) = result {
            self.metrics.inc_legacy_purged();
        }
        self.metrics.observe_reconcile(result.is_ok(), started.elapsed());

        result.map(|_| ())
    }

    pub fn resync_interval(&self) -> Duration {
        self.config.resync_interval
    }

    /// Records a failure of `key` and returns (delay before retry, consecutive failures)
    pub fn record_failure(&self, key: &str) -> (Duration, u32) {
        self.backoff.record_failure(key)
    }

    /// Reset error count for a resource (on successful reconciliation)
    pub fn reset_error(&self, key: &str) {
        self.backoff.record_success(key);
    }
}
