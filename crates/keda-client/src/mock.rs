//! Mock KedaClient for unit testing
//!
//! Stores ScaledObjects in memory, records every call that reaches the store
//! and can be told to fail the next call of a given kind.

use crate::client::object_key;
use crate::context::CallContext;
use crate::error::KedaError;
use crate::keda_trait::KedaClientTrait;
use crate::outcome::StoreOutcome;
use crds::ScaledObject;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Store operation kinds, used to script failures and inspect calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Patch,
    Delete,
}

/// One call that reached the mock store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub namespace: String,
    pub name: String,
}

impl RecordedCall {
    fn new(operation: Operation, namespace: &str, name: &str) -> Self {
        Self {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Mock ScaledObject store for testing
#[derive(Clone, Default)]
pub struct MockKedaClient {
    objects: Arc<Mutex<BTreeMap<(String, String), ScaledObject>>>,
    failures: Arc<Mutex<HashMap<Operation, VecDeque<KedaError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockKedaClient {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ScaledObject to the mock store (for test setup)
    pub fn add_scaled_object(&self, scaled_object: ScaledObject) {
        let (namespace, name) = object_key(&scaled_object).expect("test object needs namespace and name");
        let key = (namespace.to_string(), name.to_string());
        self.objects.lock().unwrap().insert(key, scaled_object);
    }

    /// Current stored copy of a ScaledObject
    pub fn scaled_object(&self, namespace: &str, name: &str) -> Option<ScaledObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of stored ScaledObjects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next call of `operation` fail with `error`
    ///
    /// Failures queue up: scripting two makes the next two calls fail.
    pub fn fail_next(&self, operation: Operation, error: KedaError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Every call that reached the store, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls of one kind
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn record(&self, operation: Operation, namespace: &str, name: &str) -> Option<KedaError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::new(operation, namespace, name));
        self.failures
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
    }
}

/// Applies an RFC 7386 JSON merge patch in place
fn merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    use serde_json::Value;

    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

#[async_trait::async_trait]
impl KedaClientTrait for MockKedaClient {
    async fn create(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        ctx.run(async {
            if let Some(e) = self.record(Operation::Create, namespace, name) {
                return StoreOutcome::Failure(e);
            }
            let key = (namespace.to_string(), name.to_string());
            let mut objects = self.objects.lock().unwrap();
            if objects.contains_key(&key) {
                return StoreOutcome::Conflict;
            }
            objects.insert(key, scaled_object.clone());
            StoreOutcome::Success(scaled_object.clone())
        })
        .await
    }

    async fn get(&self, ctx: &CallContext, namespace: &str, name: &str) -> StoreOutcome<ScaledObject> {
        ctx.run(async {
            if let Some(e) = self.record(Operation::Get, namespace, name) {
                return StoreOutcome::Failure(e);
            }
            match self.scaled_object(namespace, name) {
                Some(found) => StoreOutcome::Success(found),
                None => StoreOutcome::NotFound,
            }
        })
        .await
    }

    async fn patch(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<ScaledObject> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        ctx.run(async {
            if let Some(e) = self.record(Operation::Patch, namespace, name) {
                return StoreOutcome::Failure(e);
            }
            let key = (namespace.to_string(), name.to_string());
            let mut objects = self.objects.lock().unwrap();
            let Some(existing) = objects.get(&key) else {
                return StoreOutcome::NotFound;
            };

            let merged = serde_json::to_value(existing).and_then(|mut current| {
                let patch = serde_json::to_value(scaled_object)?;
                merge_patch(&mut current, &patch);
                serde_json::from_value::<ScaledObject>(current)
            });
            match merged {
                Ok(updated) => {
                    objects.insert(key, updated.clone());
                    StoreOutcome::Success(updated)
                }
                Err(e) => StoreOutcome::Failure(KedaError::Api(format!("invalid merge patch: {}", e))),
            }
        })
        .await
    }

    async fn delete(&self, ctx: &CallContext, scaled_object: &ScaledObject) -> StoreOutcome<()> {
        let (namespace, name) = match object_key(scaled_object) {
            Ok(key) => key,
            Err(e) => return StoreOutcome::Failure(e),
        };
        ctx.run(async {
            if let Some(e) = self.record(Operation::Delete, namespace, name) {
                return StoreOutcome::Failure(e);
            }
            let key = (namespace.to_string(), name.to_string());
            match self.objects.lock().unwrap().remove(&key) {
                Some(_) => StoreOutcome::Success(()),
                None => StoreOutcome::NotFound,
            }
        })
        .await
    }
}
