//! Removal of the ScaledObject naming scheme used by earlier releases.
//!
//! Older operators named the derived ScaledObject `<name>-app`. Current
//! releases use `<name>`, so the old object is deleted once the new one is
//! in place.

use crate::error::ControllerError;
use crds::HTTPScaledObject;
use keda_client::{CallContext, KedaClientTrait, StoreOutcome};
use kube::ResourceExt;
use tracing::{error, info};

const LEGACY_SUFFIX: &str = "-app";

/// What the purge found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyPurge {
    /// No legacy object existed
    Absent,
    /// A legacy object existed and was deleted
    Deleted,
}

/// Name of the legacy ScaledObject for an HTTPScaledObject named `name`
pub fn legacy_scaled_object_name(name: &str) -> String {
    format!("{}{}", name, LEGACY_SUFFIX)
}

/// Deletes the legacy `<name>-app` ScaledObject if it exists.
///
/// Absence at either step counts as success; any other failure is returned.
pub async fn purge_legacy_scaled_object(
    keda_client: &dyn KedaClientTrait,
    ctx: &CallContext,
    httpso: &HTTPScaledObject,
) -> Result<LegacyPurge, ControllerError> {
    let namespace = httpso.namespace().unwrap_or_else(|| "default".to_string());
    let legacy_name = legacy_scaled_object_name(&httpso.name_any());

    let legacy = match keda_client.get(ctx, &namespace, &legacy_name).await {
        StoreOutcome::NotFound => {
            info!("Legacy ScaledObject {}/{} not found, nothing to purge", namespace, legacy_name);
            return Ok(LegacyPurge::Absent);
        }
        outcome => match outcome.into_result() {
            Ok(legacy) => {
                info!("Found legacy ScaledObject {}/{}, deleting", namespace, legacy_name);
                legacy
            }
            Err(e) => {
                error!("Failed to fetch legacy ScaledObject {}/{}: {}", namespace, legacy_name, e);
                return Err(e.into());
            }
        },
    };

    match keda_client.delete(ctx, &legacy).await {
        StoreOutcome::NotFound => {
            info!("Legacy ScaledObject {}/{} already deleted", namespace, legacy_name);
            Ok(LegacyPurge::Absent)
        }
        outcome => match outcome.into_result() {
            Ok(()) => {
                info!("Deleted legacy ScaledObject {}/{}", namespace, legacy_name);
                Ok(LegacyPurge::Deleted)
            }
            Err(e) => {
                error!("Failed to delete legacy ScaledObject {}/{}: {}", namespace, legacy_name, e);
                Err(e.into())
            }
        },
    }
}
