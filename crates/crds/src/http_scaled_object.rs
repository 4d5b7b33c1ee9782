//! HTTPScaledObject CRD
//!
//! Declares how an HTTP workload should be scaled: which Deployment to
//! target, which hosts route to it, and the replica bounds to respect.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "http.keda.sh",
    version = "v1alpha1",
    kind = "HTTPScaledObject",
    shortname = "httpso",
    namespaced,
    status = "HTTPScaledObjectStatus",
    printcolumn = r#"{"name":"ScaleTargetDeploymentName","type":"string","jsonPath":".spec.scaleTargetRef.deployment"}"#,
    printcolumn = r#"{"name":"MinReplicas","type":"integer","jsonPath":".spec.replicas.min"}"#,
    printcolumn = r#"{"name":"MaxReplicas","type":"integer","jsonPath":".spec.replicas.max"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HTTPScaledObjectSpec {
    /// Hosts that route to the scale target
    pub hosts: Vec<String>,

    /// Path prefixes that route to the scale target
    ///
    /// Accepted by the schema but not forwarded to the ScaledObject yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefixes: Option<Vec<String>>,

    /// Workload to scale
    pub scale_target_ref: ScaleTargetRef,

    /// Replica bounds (defaults left to KEDA when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<ReplicaStruct>,

    /// Number of pending requests that triggers a scale-up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_pending_requests: Option<i32>,

    /// Seconds to wait before scaling down (ScaledObject cooldownPeriod)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaledown_period: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTargetRef {
    /// Name of the Deployment to scale
    pub deployment: String,

    /// Service that fronts the Deployment
    pub service: String,

    /// Port of the Service
    pub port: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaStruct {
    /// Minimum replica count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,

    /// Maximum replica count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HTTPScaledObjectStatus {
    /// Latest observations of the HTTPScaledObject, one entry per type
    #[serde(default)]
    pub conditions: Vec<HTTPScaledObjectCondition>,
}

/// A single status condition on an HTTPScaledObject
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HTTPScaledObjectCondition {
    /// Condition type
    #[serde(rename = "type")]
    pub type_: ConditionType,

    /// True, False or Unknown
    pub status: ConditionStatus,

    /// Machine-readable reason for the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConditionReason>,

    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC3339 time of the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Kind of an HTTPScaledObject condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionType {
    Created,
    Error,
    Pending,
    Terminating,
    Terminated,
    Ready,
}

/// Tri-state condition status, as used by Kubernetes conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// Reason codes recorded with a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    ErrorCreatingAppScaledObject,
    AppScaledObjectCreated,
    TerminatingResources,
    AppScaledObjectTerminated,
    AppScaledObjectTerminationError,
    PendingCreation,
    HTTPScaledObjectIsReady,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "Created",
            Self::Error => "Error",
            Self::Pending => "Pending",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Ready => "Ready",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl HTTPScaledObject {
    /// Conditions currently recorded in status (empty when status is unset)
    pub fn conditions(&self) -> &[HTTPScaledObjectCondition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    /// Looks up the condition of the given type
    pub fn condition(&self, type_: ConditionType) -> Option<&HTTPScaledObjectCondition> {
        self.conditions().iter().find(|c| c.type_ == type_)
    }
}
