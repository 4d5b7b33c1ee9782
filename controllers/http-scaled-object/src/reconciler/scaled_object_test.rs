//! Unit tests for the ScaledObject create-or-patch protocol

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::reconciler::legacy::LegacyPurge;
    use crate::reconciler::scaled_object::{create_or_update_scaled_object, desired_scaled_object};
    use crate::test_utils::*;
    use crds::{ConditionReason, ConditionStatus, ConditionType, ReplicaStruct};
    use keda_client::{CallContext, KedaError, MockKedaClient, Operation, RecordedCall};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn call(operation: Operation, namespace: &str, name: &str) -> RecordedCall {
        RecordedCall {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_when_absent() {
        let mock = MockKedaClient::new();
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let result = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso).await;

        assert_eq!(result.unwrap(), LegacyPurge::Absent);
        assert!(mock.scaled_object("ns", "foo").is_some());
        assert_eq!(
            mock.calls(),
            vec![call(Operation::Create, "ns", "foo"), call(Operation::Get, "ns", "foo-app")]
        );

        let created = httpso.condition(ConditionType::Created).unwrap();
        assert_eq!(created.status, ConditionStatus::True);
        assert_eq!(created.message.as_deref(), Some("App ScaledObject created"));
        assert!(httpso.condition(ConditionType::Error).is_none());
    }

    #[tokio::test]
    async fn test_creates_and_purges_legacy_object() {
        let mock = MockKedaClient::new();
        mock.add_scaled_object(create_test_legacy_scaled_object("ns", "foo"));
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let result = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso).await;

        assert_eq!(result.unwrap(), LegacyPurge::Deleted);
        assert_eq!(
            mock.calls(),
            vec![
                call(Operation::Create, "ns", "foo"),
                call(Operation::Get, "ns", "foo-app"),
                call(Operation::Delete, "ns", "foo-app"),
            ]
        );
        assert!(mock.scaled_object("ns", "foo").is_some());
        assert!(mock.scaled_object("ns", "foo-app").is_none());
        assert!(httpso.condition(ConditionType::Created).is_some());
    }

    #[tokio::test]
    async fn test_patches_existing_object() {
        let mock = MockKedaClient::new();
        let mut stale = desired_scaled_object(&create_test_http_scaled_object("ns", "bar"), "old-scaler.keda:9090");
        stale.spec.max_replica_count = Some(3);
        mock.add_scaled_object(stale);
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "bar");

        let result = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso).await;

        assert_eq!(result.unwrap(), LegacyPurge::Absent);
        assert_eq!(
            mock.calls(),
            vec![
                call(Operation::Create, "ns", "bar"),
                call(Operation::Get, "ns", "bar"),
                call(Operation::Patch, "ns", "bar"),
                call(Operation::Get, "ns", "bar-app"),
            ]
        );
        assert_eq!(mock.call_count(Operation::Delete), 0);

        let stored = mock.scaled_object("ns", "bar").unwrap();
        assert_eq!(stored.spec.max_replica_count, Some(10));
        assert_eq!(stored.spec.triggers[0].metadata["scalerAddress"], TEST_SCALER_ADDRESS);
        assert!(httpso.condition(ConditionType::Created).is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let mock = MockKedaClient::new();
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap();
        let after_first = mock.scaled_object("ns", "foo").unwrap();

        create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap();
        let after_second = mock.scaled_object("ns", "foo").unwrap();

        assert_eq!(after_first.spec, after_second.spec);
        assert_eq!(mock.len(), 1);
        assert_eq!(httpso.conditions().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_patch_and_purge() {
        let mock = MockKedaClient::new();
        mock.add_scaled_object(desired_scaled_object(
            &create_test_http_scaled_object("ns", "bar"),
            TEST_SCALER_ADDRESS,
        ));
        mock.fail_next(Operation::Get, KedaError::Api("etcd unavailable".to_string()));
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "bar");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::Api(msg)) if msg == "etcd unavailable"));
        assert_eq!(
            mock.calls(),
            vec![call(Operation::Create, "ns", "bar"), call(Operation::Get, "ns", "bar")]
        );
        assert_eq!(mock.call_count(Operation::Patch), 0);
        assert!(httpso.conditions().is_empty());
    }

    #[tokio::test]
    async fn test_patch_failure_skips_purge() {
        let mock = MockKedaClient::new();
        mock.add_scaled_object(desired_scaled_object(
            &create_test_http_scaled_object("ns", "bar"),
            TEST_SCALER_ADDRESS,
        ));
        mock.fail_next(Operation::Patch, KedaError::Api("admission denied".to_string()));
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "bar");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::Api(_))));
        assert_eq!(mock.call_count(Operation::Get), 1);
        assert!(httpso.conditions().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_records_error_condition() {
        let mock = MockKedaClient::new();
        mock.fail_next(Operation::Create, KedaError::Api("exceeded quota".to_string()));
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::Api(_))));
        assert_eq!(mock.calls(), vec![call(Operation::Create, "ns", "foo")]);

        let error = httpso.condition(ConditionType::Error).unwrap();
        assert_eq!(error.status, ConditionStatus::False);
        assert!(error.message.as_deref().unwrap().contains("exceeded quota"));
        assert!(httpso.condition(ConditionType::Created).is_none());
    }

    #[tokio::test]
    async fn test_purge_failure_fails_reconciliation() {
        let mock = MockKedaClient::new();
        mock.add_scaled_object(create_test_legacy_scaled_object("ns", "foo"));
        mock.fail_next(Operation::Delete, KedaError::Api("forbidden".to_string()));
        let ctx = CallContext::background();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::Api(_))));
        assert!(mock.scaled_object("ns", "foo").is_some());
        assert!(mock.scaled_object("ns", "foo-app").is_some());
        assert!(httpso.condition(ConditionType::Created).is_some());
        assert!(httpso.condition(ConditionType::Error).is_none());
    }

    #[tokio::test]
    async fn test_cancelled_create_records_error_condition() {
        let mock = MockKedaClient::new();
        let ctx = CallContext::background().child(Duration::from_secs(30));
        ctx.cancel();
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::Cancelled)));
        assert!(mock.calls().is_empty());
        assert!(mock.is_empty());

        let error = httpso.condition(ConditionType::Error).unwrap();
        assert_eq!(error.status, ConditionStatus::False);
        assert_eq!(error.reason, Some(ConditionReason::ErrorCreatingAppScaledObject));
        assert_eq!(error.message.as_deref(), Some("Request cancelled"));
        assert!(httpso.condition(ConditionType::Created).is_none());
    }

    #[tokio::test]
    async fn test_expired_deadline_sends_nothing() {
        let mock = MockKedaClient::new();
        let ctx = CallContext::new(CancellationToken::new(), Some(Duration::ZERO));
        let mut httpso = create_test_http_scaled_object("ns", "foo");

        let err = create_or_update_scaled_object(&mock, &ctx, TEST_SCALER_ADDRESS, &mut httpso)
            .await
            .unwrap_err();

        assert!(matches!(err, ControllerError::Keda(KedaError::DeadlineExceeded(_))));
        assert!(mock.calls().is_empty());
        assert!(mock.is_empty());
        assert_eq!(
            httpso.condition(ConditionType::Error).unwrap().status,
            ConditionStatus::False
        );
    }

    #[test]
    fn test_desired_object_carries_owner_reference() {
        let httpso = create_test_http_scaled_object("ns", "foo");
        let desired = desired_scaled_object(&httpso, TEST_SCALER_ADDRESS);

        let owners = desired.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "HTTPScaledObject");
        assert_eq!(owners[0].name, "foo");
        assert_eq!(owners[0].uid, "uid-foo");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[test]
    fn test_desired_object_without_uid_has_no_owner() {
        let mut httpso = create_test_http_scaled_object("ns", "foo");
        httpso.metadata.uid = None;

        let desired = desired_scaled_object(&httpso, TEST_SCALER_ADDRESS);

        assert!(desired.metadata.owner_references.is_none());
    }

    #[test]
    fn test_desired_object_ignores_path_prefixes() {
        let mut httpso = create_test_http_scaled_object("ns", "foo");
        httpso.spec.path_prefixes = Some(vec!["/api".to_string()]);

        let desired = desired_scaled_object(&httpso, TEST_SCALER_ADDRESS);

        assert_eq!(desired.spec.triggers[0].metadata["pathPrefixes"], "");
        assert_eq!(desired.spec.triggers[0].metadata["hosts"], "foo.example.com");
    }

    #[test]
    fn test_desired_object_replica_bounds() {
        let mut httpso = create_test_http_scaled_object("ns", "foo");
        httpso.spec.replicas = None;
        let desired = desired_scaled_object(&httpso, TEST_SCALER_ADDRESS);
        assert_eq!(desired.spec.min_replica_count, None);
        assert_eq!(desired.spec.max_replica_count, None);

        httpso.spec.replicas = Some(ReplicaStruct { min: Some(2), max: None });
        httpso.spec.scaledown_period = Some(120);
        let desired = desired_scaled_object(&httpso, TEST_SCALER_ADDRESS);
        assert_eq!(desired.spec.min_replica_count, Some(2));
        assert_eq!(desired.spec.max_replica_count, None);
        assert_eq!(desired.spec.cooldown_period, Some(120));
        assert_eq!(desired.spec.scale_target_ref.name, "foo");
    }
}
