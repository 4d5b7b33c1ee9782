//! Integration tests for the kube-backed ScaledObject store
//!
//! These tests require a cluster with the KEDA CRDs installed and a
//! kubeconfig pointing at it. Set TEST_NAMESPACE to choose the namespace.

use crds::new_scaled_object;
use keda_client::{CallContext, KedaClient, KedaClientTrait, StoreOutcome};

fn namespace() -> String {
    std::env::var("TEST_NAMESPACE").unwrap_or_else(|_| "default".to_string())
}

#[tokio::test]
#[ignore] // Requires running cluster with KEDA CRDs
async fn test_create_get_patch_delete() {
    let client = kube::Client::try_default().await.expect("Failed to create kube client");
    let store = KedaClient::new(client);
    let ctx = CallContext::background();
    let ns = namespace();

    let so = new_scaled_object(&ns, "keda-client-it", "nginx", "scaler:9090", &[], &[], None, Some(2), None);

    match store.create(&ctx, &so).await {
        StoreOutcome::Success(_) | StoreOutcome::Conflict => {}
        other => panic!("create failed: {:?}", other),
    }

    let fetched = store.get(&ctx, &ns, "keda-client-it").await.into_result().expect("get failed");
    assert_eq!(fetched.spec.scale_target_ref.name, "nginx");

    let patched = store.patch(&ctx, &so).await.into_result().expect("patch failed");
    assert_eq!(patched.spec.max_replica_count, Some(2));

    assert!(matches!(store.delete(&ctx, &so).await, StoreOutcome::Success(())));
    assert!(matches!(store.get(&ctx, &ns, "keda-client-it").await, StoreOutcome::NotFound));
}
