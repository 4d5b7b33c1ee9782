//! KEDA ScaledObject CRD
//!
//! Only the subset of the `keda.sh/v1alpha1` ScaledObject schema that the
//! operator writes is modelled. Optional fields are omitted when unset so a
//! merge patch built from this type never clears fields it does not own.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trigger type understood by the HTTP add-on external scaler
pub const EXTERNAL_PUSH_TRIGGER: &str = "external-push";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[kube(
    group = "keda.sh",
    version = "v1alpha1",
    kind = "ScaledObject",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ScaledObjectSpec {
    /// Workload KEDA scales
    pub scale_target_ref: ScaleTarget,

    /// Seconds between trigger polls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_interval: Option<i32>,

    /// Seconds to wait after the last active trigger before scaling down
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_period: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replica_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replica_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedConfig>,

    /// Scale triggers
    #[serde(default)]
    pub triggers: Vec<ScaleTriggers>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTarget {
    /// Name of the target workload
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedConfig {
    /// Scale the target back to its original replica count when the
    /// ScaledObject is deleted
    #[serde(default)]
    pub restore_to_original_replica_count: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTriggers {
    /// Trigger type (scaler name)
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Scaler-specific settings
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Labels stamped on every ScaledObject owned by an HTTPScaledObject
pub fn scaled_object_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), format!("kedahttp-{}-app", name)),
        ("name".to_string(), name.to_string()),
    ])
}

/// Builds the desired ScaledObject for an HTTP workload.
///
/// The result depends only on its arguments, so two calls with equal input
/// produce equal objects (and equal merge patches).
#[allow(clippy::too_many_arguments)]
pub fn new_scaled_object(
    namespace: &str,
    name: &str,
    deployment_name: &str,
    scaler_address: &str,
    hosts: &[String],
    path_prefixes: &[String],
    min_replicas: Option<i32>,
    max_replicas: Option<i32>,
    cooldown_period: Option<i32>,
) -> ScaledObject {
    let metadata = BTreeMap::from([
        ("scalerAddress".to_string(), scaler_address.to_string()),
        ("hosts".to_string(), hosts.join(",")),
        ("pathPrefixes".to_string(), path_prefixes.join(",")),
    ]);

    let mut scaled_object = ScaledObject::new(
        name,
        ScaledObjectSpec {
            scale_target_ref: ScaleTarget {
                name: deployment_name.to_string(),
                kind: Some("Deployment".to_string()),
                api_version: Some("apps/v1".to_string()),
            },
            polling_interval: Some(1),
            cooldown_period,
            min_replica_count: min_replicas,
            max_replica_count: max_replicas,
            advanced: Some(AdvancedConfig {
                restore_to_original_replica_count: true,
            }),
            triggers: vec![ScaleTriggers {
                type_: EXTERNAL_PUSH_TRIGGER.to_string(),
                name: None,
                metadata,
            }],
        },
    );
    scaled_object.metadata.namespace = Some(namespace.to_string());
    scaled_object.metadata.labels = Some(scaled_object_labels(name));
    scaled_object
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        vec!["a.example.com".to_string(), "b.example.com".to_string()]
    }

    #[test]
    fn test_new_scaled_object_fields() {
        let so = new_scaled_object(
            "ns",
            "foo",
            "foo-deploy",
            "scaler.keda:9090",
            &hosts(),
            &[],
            Some(1),
            Some(5),
            Some(300),
        );

        assert_eq!(so.metadata.name.as_deref(), Some("foo"));
        assert_eq!(so.metadata.namespace.as_deref(), Some("ns"));
        assert_eq!(so.spec.scale_target_ref.name, "foo-deploy");
        assert_eq!(so.spec.scale_target_ref.kind.as_deref(), Some("Deployment"));
        assert_eq!(so.spec.min_replica_count, Some(1));
        assert_eq!(so.spec.max_replica_count, Some(5));
        assert_eq!(so.spec.cooldown_period, Some(300));
        assert_eq!(so.spec.polling_interval, Some(1));

        let trigger = &so.spec.triggers[0];
        assert_eq!(trigger.type_, EXTERNAL_PUSH_TRIGGER);
        assert_eq!(trigger.metadata["scalerAddress"], "scaler.keda:9090");
        assert_eq!(trigger.metadata["hosts"], "a.example.com,b.example.com");
        assert_eq!(trigger.metadata["pathPrefixes"], "");

        let labels = so.metadata.labels.unwrap();
        assert_eq!(labels["app"], "kedahttp-foo-app");
        assert_eq!(labels["name"], "foo");
    }

    #[test]
    fn test_new_scaled_object_is_deterministic() {
        let build = || {
            new_scaled_object("ns", "foo", "d", "s:1", &hosts(), &[], None, None, None)
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_unset_bounds_are_omitted_from_json() {
        let so = new_scaled_object("ns", "foo", "d", "s:1", &hosts(), &[], None, None, None);
        let value = serde_json::to_value(&so).unwrap();

        assert_eq!(value["apiVersion"], "keda.sh/v1alpha1");
        assert_eq!(value["kind"], "ScaledObject");
        assert!(value["spec"].get("minReplicaCount").is_none());
        assert!(value["spec"].get("maxReplicaCount").is_none());
        assert!(value["spec"].get("cooldownPeriod").is_none());
        assert_eq!(value["spec"]["advanced"]["restoreToOriginalReplicaCount"], true);
    }
}
