//! KedaClient trait for mocking
//!
//! This trait abstracts the ScaledObject store so the reconciliation
//! protocol can be unit tested against an in-memory implementation.
//! The concrete `KedaClient` implements it on top of the Kubernetes API.

use crate::context::CallContext;
use crate::outcome::StoreOutcome;
use crds::ScaledObject;

/// Store operations the reconciler needs on ScaledObjects
///
/// Every call takes the reconciliation's `CallContext`; implementations must
/// run the request through `CallContext::run` so cancellation and deadlines
/// apply to it.
#[async_trait::async_trait]
pub trait KedaClientTrait: Send + Sync {
    /// Creates the object. `Conflict` when an object with its name exists.
    async fn create(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject>;

    /// Fetches an object by key. `NotFound` when absent.
    async fn get(&self, ctx: &CallContext, namespace: &str, name: &str) -> StoreOutcome<ScaledObject>;

    /// Applies `scaled_object` as a JSON merge patch onto the stored object.
    async fn patch(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject>;

    /// Deletes the object. `NotFound` when it is already gone.
    async fn delete(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<()>;
}
