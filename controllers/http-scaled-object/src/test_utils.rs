//! Test utilities for unit testing reconcilers
//!
//! Helpers for building HTTPScaledObjects and seeding the mock store.

use crate::config::ControllerConfig;
use crate::metrics::Metrics;
use crate::reconciler::Reconciler;
use crate::status::StatusWriter;
use crds::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use keda_client::{CallContext, KedaError, MockKedaClient, StoreOutcome};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scaler address used by reconciler tests
pub const TEST_SCALER_ADDRESS: &str = "keda-add-ons-http-external-scaler.keda:9090";

/// Helper to create a test HTTPScaledObject
pub fn create_test_http_scaled_object(namespace: &str, name: &str) -> HTTPScaledObject {
    HTTPScaledObject {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("uid-{}", name)),
            ..Default::default()
        },
        spec: HTTPScaledObjectSpec {
            hosts: vec![format!("{}.example.com", name)],
            path_prefixes: None,
            scale_target_ref: ScaleTargetRef {
                deployment: name.to_string(),
                service: name.to_string(),
                port: 8080,
            },
            replicas: Some(ReplicaStruct {
                min: Some(0),
                max: Some(10),
            }),
            target_pending_requests: None,
            scaledown_period: None,
        },
        status: None,
    }
}

/// Helper to create the ScaledObject a previous release left behind
pub fn create_test_legacy_scaled_object(namespace: &str, name: &str) -> ScaledObject {
    new_scaled_object(
        namespace,
        &format!("{}-app", name),
        name,
        TEST_SCALER_ADDRESS,
        &[format!("{}.example.com", name)],
        &[],
        None,
        None,
        None,
    )
}

/// One status write seen by `RecordingStatusWriter`
#[derive(Debug, Clone)]
pub struct StatusPatch {
    pub namespace: String,
    pub name: String,
    pub conditions: Vec<HTTPScaledObjectCondition>,
}

/// In-memory status writer that records patches and can fail the next one
#[derive(Clone, Default)]
pub struct RecordingStatusWriter {
    patches: Arc<Mutex<Vec<StatusPatch>>>,
    next_failure: Arc<Mutex<Option<KedaError>>>,
}

impl RecordingStatusWriter {
    pub fn patches(&self) -> Vec<StatusPatch> {
        self.patches.lock().unwrap().clone()
    }

    pub fn fail_next(&self, error: KedaError) {
        *self.next_failure.lock().unwrap() = Some(error);
    }
}

#[async_trait::async_trait]
impl StatusWriter for RecordingStatusWriter {
    async fn patch_conditions(
        &self,
        ctx: &CallContext,
        namespace: &str,
        name: &str,
        conditions: &[HTTPScaledObjectCondition],
    ) -> StoreOutcome<()> {
        ctx.run(async {
            if let Some(e) = self.next_failure.lock().unwrap().take() {
                return StoreOutcome::Failure(e);
            }
            self.patches.lock().unwrap().push(StatusPatch {
                namespace: namespace.to_string(),
                name: name.to_string(),
                conditions: conditions.to_vec(),
            });
            StoreOutcome::Success(())
        })
        .await
    }
}

/// Helper to create a test configuration
pub fn create_test_config() -> ControllerConfig {
    ControllerConfig {
        external_scaler_service: "keda-add-ons-http-external-scaler".to_string(),
        external_scaler_port: 9090,
        operator_namespace: "keda".to_string(),
        watch_namespace: None,
        reconcile_timeout: Duration::from_secs(30),
        reconcile_concurrency: 4,
        resync_interval: Duration::from_secs(300),
        probe_port: 8081,
    }
}

/// Helper to create a Reconciler over the mock store and a recording status writer
pub fn create_test_reconciler(mock: &MockKedaClient, status: &RecordingStatusWriter) -> Reconciler {
    Reconciler::new(
        Box::new(mock.clone()),
        Box::new(status.clone()),
        create_test_config(),
        CallContext::background(),
        Metrics::new().unwrap(),
    )
}
