//! Status subresource writes for HTTPScaledObjects.

use crds::{HTTPScaledObject, HTTPScaledObjectCondition};
use keda_client::{CallContext, StoreOutcome};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use tracing::debug;

/// Persists the condition list of an HTTPScaledObject
#[async_trait::async_trait]
pub trait StatusWriter: Send + Sync {
    /// Replaces `status.conditions` of `namespace/name` with `conditions`.
    async fn patch_conditions(
        &self,
        ctx: &CallContext,
        namespace: &str,
        name: &str,
        conditions: &[HTTPScaledObjectCondition],
    ) -> StoreOutcome<()>;
}

/// Writes status through the Kubernetes API with a JSON merge patch
pub struct KubeStatusWriter {
    client: Client,
}

impl KubeStatusWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StatusWriter for KubeStatusWriter {
    async fn patch_conditions(
        &self,
        ctx: &CallContext,
        namespace: &str,
        name: &str,
        conditions: &[HTTPScaledObjectCondition],
    ) -> StoreOutcome<()> {
        debug!("PATCH status HTTPScaledObject {}/{}", namespace, name);

        let api: Api<HTTPScaledObject> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "status": { "conditions": conditions } });
        ctx.run(async {
            StoreOutcome::from_kube(
                api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await,
            )
            .map(|_| ())
        })
        .await
    }
}
