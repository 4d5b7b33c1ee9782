//! Kubernetes-backed ScaledObject store

use crate::context::CallContext;
use crate::error::KedaError;
use crate::keda_trait::KedaClientTrait;
use crate::outcome::StoreOutcome;
use crds::ScaledObject;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// ScaledObject store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KedaClient {
    client: Client,
}

impl KedaClient {
    /// Creates a store on top of an existing kube client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ScaledObject> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Extracts (namespace, name) from an object about to be sent to the store
pub(crate) fn object_key(scaled_object: &ScaledObject) -> Result<(&str, &str), KedaError> {
    let namespace = scaled_object
        .metadata
        .namespace
        .as_deref()
        .ok_or(KedaError::MissingMetadata("namespace"))?;
    let name = scaled_object
        .metadata
        .name
        .as_deref()
        .ok_or(KedaError::MissingMetadata("name"))?;
    Ok((namespace, name))
}

#[async_trait::async_trait]
impl KedaClientTrait for KedaClient {
    async fn create(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        debug!("POST ScaledObject {}/{}", namespace, name);

        let api = self.api(namespace);
        ctx.run(async {
            StoreOutcome::from_kube(api.create(&PostParams::default(), scaled_object).await)
        })
        .await
    }

    async fn get(&self, ctx: &CallContext, namespace: &str, name: &str) -> StoreOutcome<ScaledObject> {
        debug!("GET ScaledObject {}/{}", namespace, name);

        let api = self.api(namespace);
        ctx.run(async { StoreOutcome::from_kube(api.get(name).await) }).await
    }

    async fn patch(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        debug!("PATCH (merge) ScaledObject {}/{}", namespace, name);

        let api = self.api(namespace);
        ctx.run(async {
            StoreOutcome::from_kube(
                api.patch(name, &PatchParams::default(), &Patch::Merge(scaled_object))
                    .await,
            )
        })
        .await
    }

    async fn delete(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<()> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        debug!("DELETE ScaledObject {}/{}", namespace, name);

        let api = self.api(namespace);
        ctx.run(async {
            StoreOutcome::from_kube(api.delete(name, &DeleteParams::default()).await).map(|_| ())
        })
        .await
    }
}
