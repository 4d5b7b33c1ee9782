//! Create-or-patch of the ScaledObject derived from an HTTPScaledObject.

use crate::conditions::{add_condition, create_condition, ConditionExt};
use crate::error::ControllerError;
use crate::reconciler::legacy::{purge_legacy_scaled_object, LegacyPurge};
use crds::{new_scaled_object, ConditionReason, ConditionStatus, ConditionType, HTTPScaledObject, ScaledObject};
use keda_client::{CallContext, KedaClientTrait, KedaError, StoreOutcome};
use kube::{Resource, ResourceExt};
use tracing::{debug, error, info};

/// Builds the ScaledObject an HTTPScaledObject should own.
///
/// Path prefixes are not forwarded: the trigger always carries an empty list.
pub fn desired_scaled_object(httpso: &HTTPScaledObject, external_scaler_address: &str) -> ScaledObject {
    let namespace = httpso.namespace().unwrap_or_else(|| "default".to_string());
    let name = httpso.name_any();
    let (min_replicas, max_replicas) = match &httpso.spec.replicas {
        Some(replicas) => (replicas.min, replicas.max),
        None => (None, None),
    };

    let mut scaled_object = new_scaled_object(
        &namespace,
        &name,
        &httpso.spec.scale_target_ref.deployment,
        external_scaler_address,
        &httpso.spec.hosts,
        &[],
        min_replicas,
        max_replicas,
        httpso.spec.scaledown_period,
    );
    if let Some(owner) = httpso.controller_owner_ref(&()) {
        scaled_object.metadata.owner_references = Some(vec![owner]);
    }
    scaled_object
}

/// Ensures the ScaledObject named after `httpso` exists and matches it.
///
/// Creates the object, or on `Conflict` fetches and merge-patches the
/// existing one. A successful upsert records a `Created` condition and then
/// purges the legacy `<name>-app` object; the purge result is returned.
/// Only a failed create records an `Error` condition, whatever the cause,
/// including cancellation. Store errors are returned unchanged.
pub async fn create_or_update_scaled_object(
    keda_client: &dyn KedaClientTrait,
    ctx: &CallContext,
    external_scaler_address: &str,
    httpso: &mut HTTPScaledObject,
) -> Result<LegacyPurge, ControllerError> {
    let namespace = httpso.namespace().unwrap_or_else(|| "default".to_string());
    let name = httpso.name_any();
    info!(
        "Reconciling ScaledObject {}/{} (external scaler: {})",
        namespace, name, external_scaler_address
    );

    let app_scaled_object = desired_scaled_object(httpso, external_scaler_address);
    debug!("Desired ScaledObject {}/{}: {:?}", namespace, name, app_scaled_object.spec);

    match keda_client.create(ctx, &app_scaled_object).await {
        StoreOutcome::Success(_) => {
            info!("Created ScaledObject {}/{}", namespace, name);
        }
        StoreOutcome::Conflict => {
            info!("ScaledObject {}/{} already exists, patching", namespace, name);

            if let Err(e) = keda_client.get(ctx, &namespace, &name).await.into_result() {
                error!("Failed to fetch existing ScaledObject {}/{}: {}", namespace, name, e);
                return Err(e.into());
            }

            if let Err(e) = keda_client.patch(ctx, &app_scaled_object).await.into_result() {
                error!("Failed to patch ScaledObject {}/{}: {}", namespace, name, e);
                return Err(e.into());
            }
            info!("Patched ScaledObject {}/{}", namespace, name);
        }
        StoreOutcome::NotFound => {
            let e = KedaError::Api(format!("namespace {} not found", namespace));
            return Err(record_create_error(httpso, &namespace, &name, e));
        }
        StoreOutcome::Failure(e) => {
            return Err(record_create_error(httpso, &namespace, &name, e));
        }
    }

    add_condition(
        httpso,
        create_condition(
            ConditionType::Created,
            ConditionStatus::True,
            ConditionReason::AppScaledObjectCreated,
        )
        .with_message("App ScaledObject created"),
    );

    purge_legacy_scaled_object(keda_client, ctx, httpso).await
}

fn record_create_error(
    httpso: &mut HTTPScaledObject,
    namespace: &str,
    name: &str,
    e: KedaError,
) -> ControllerError {
    error!("Failed to create ScaledObject {}/{}: {}", namespace, name, e);
    add_condition(
        httpso,
        create_condition(
            ConditionType::Error,
            ConditionStatus::False,
            ConditionReason::ErrorCreatingAppScaledObject,
        )
        .with_message(e.to_string()),
    );
    e.into()
}
