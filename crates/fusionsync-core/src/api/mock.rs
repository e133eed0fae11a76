//! In-memory [`ResourceApi`] that records every call.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{ApiError, ApiErrors, ApiResult, ErrorMessage, ResourceApi};
use crate::models::{ResourceId, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Retrieve(ResourceKind, ResourceId),
    RetrieveAll(ResourceKind),
    Create(ResourceKind, ResourceId, Value),
    Update(ResourceKind, ResourceId, Value),
    Patch(ResourceKind, ResourceId, Value),
}

#[derive(Default)]
pub struct MockApi {
    resources: Mutex<Vec<(ResourceKind, Value)>>,
    failing: Mutex<BTreeSet<ResourceId>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a remote resource. `value` must carry an `id`.
    pub fn with_resource(self, kind: ResourceKind, value: Value) -> Self {
        self.resources.lock().unwrap().push((kind, value));
        self
    }

    /// Reject every write and read for `id` with a validation error.
    pub fn failing_for(self, id: ResourceId) -> Self {
        self.failing.lock().unwrap().insert(id);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored(&self, kind: ResourceKind, id: &ResourceId) -> Option<Value> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .find(|(stored_kind, value)| *stored_kind == kind && has_id(value, id))
            .map(|(_, value)| value.clone())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, id: &ResourceId) -> ApiResult<()> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(ApiError::Remote {
                status: StatusCode::BAD_REQUEST,
                errors: ApiErrors {
                    general_errors: vec![ErrorMessage {
                        code: "[rejected]".to_string(),
                        message: format!("rejected {id}"),
                    }],
                    ..ApiErrors::default()
                },
                body: None,
            });
        }
        Ok(())
    }

    fn store(&self, kind: ResourceKind, id: &ResourceId, value: Value) -> Value {
        let mut resources = self.resources.lock().unwrap();
        resources.retain(|(stored_kind, stored)| !(*stored_kind == kind && has_id(stored, id)));
        resources.push((kind, value.clone()));
        value
    }
}

fn has_id(value: &Value, id: &ResourceId) -> bool {
    value.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

fn not_found() -> ApiError {
    ApiError::Remote {
        status: StatusCode::NOT_FOUND,
        errors: ApiErrors::default(),
        body: None,
    }
}

/// Shallow merge, descending one level into nested objects.
fn merge(target: &mut Value, partial: &Value) {
    let (Some(target), Some(partial)) = (target.as_object_mut(), partial.as_object()) else {
        return;
    };
    for (key, value) in partial {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (inner_key, inner_value) in incoming {
                    existing.insert(inner_key.clone(), inner_value.clone());
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[async_trait]
impl ResourceApi for MockApi {
    async fn retrieve(&self, kind: ResourceKind, id: &ResourceId) -> ApiResult<Value> {
        self.record(Call::Retrieve(kind, *id));
        self.check(id)?;
        self.stored(kind, id).ok_or_else(not_found)
    }

    async fn retrieve_all(&self, kind: ResourceKind) -> ApiResult<Vec<Value>> {
        self.record(Call::RetrieveAll(kind));
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|(stored_kind, _)| *stored_kind == kind)
            .map(|(_, value)| value.clone())
            .collect())
    }

    async fn create(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.record(Call::Create(kind, *id, resource.clone()));
        self.check(id)?;
        let mut value = resource.clone();
        merge(&mut value, &json!({ "id": id.to_string() }));
        Ok(self.store(kind, id, value))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.record(Call::Update(kind, *id, resource.clone()));
        self.check(id)?;
        self.stored(kind, id).ok_or_else(not_found)?;
        let mut value = resource.clone();
        merge(&mut value, &json!({ "id": id.to_string() }));
        Ok(self.store(kind, id, value))
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.record(Call::Patch(kind, *id, resource.clone()));
        self.check(id)?;
        let mut value = self.stored(kind, id).ok_or_else(not_found)?;
        merge(&mut value, resource);
        Ok(self.store(kind, id, value))
    }
}
