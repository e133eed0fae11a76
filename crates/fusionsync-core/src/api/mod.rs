//! Remote API boundary.
//!
//! Everything that talks to the server goes through [`ResourceApi`], so the
//! sync engine can be exercised against an in-memory double.

mod client;
#[cfg(test)]
pub(crate) mod mock;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{ResourceId, ResourceKind};

pub(crate) use client::normalize_host;
pub use client::FusionAuthClient;
pub use reqwest::StatusCode;

/// One error message returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Structured validation errors as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrors {
    #[serde(default)]
    pub field_errors: BTreeMap<String, Vec<ErrorMessage>>,
    #[serde(default)]
    pub general_errors: Vec<ErrorMessage>,
}

impl ApiErrors {
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty() && self.general_errors.is_empty()
    }

    /// Field errors as `(field, "message, message")` pairs.
    pub fn field_lines(&self) -> Vec<(String, String)> {
        self.field_errors
            .iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|error| error.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                (field.clone(), messages)
            })
            .collect()
    }

    pub fn general_lines(&self) -> Vec<String> {
        self.general_errors
            .iter()
            .map(|error| error.message.clone())
            .collect()
    }
}

impl fmt::Display for ApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self
            .field_lines()
            .into_iter()
            .map(|(field, messages)| format!("{field}: {messages}"))
            .collect();
        lines.extend(self.general_lines());
        f.write_str(&lines.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API client configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}", describe_remote(.status, .errors, .body))]
    Remote {
        status: StatusCode,
        errors: ApiErrors,
        body: Option<String>,
    },
}

fn describe_remote(status: &StatusCode, errors: &ApiErrors, body: &Option<String>) -> String {
    if !errors.is_empty() {
        return format!("{errors} ({})", status.as_u16());
    }
    match body.as_deref() {
        Some(body) if !body.trim().is_empty() => {
            format!("{} ({})", crate::util::compact_text(body), status.as_u16())
        }
        _ => format!("HTTP {}", status.as_u16()),
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the sync engine needs from the server.
///
/// Payloads are the bare resource objects; wrapping them in the kind's JSON
/// envelope is the implementation's job.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Fetch a single resource.
    async fn retrieve(&self, kind: ResourceKind, id: &ResourceId) -> ApiResult<Value>;

    /// Fetch every resource of a kind.
    async fn retrieve_all(&self, kind: ResourceKind) -> ApiResult<Vec<Value>>;

    /// Create a resource with a client-chosen id.
    async fn create(&self, kind: ResourceKind, id: &ResourceId, resource: &Value)
        -> ApiResult<Value>;

    /// Replace a resource entirely.
    async fn update(&self, kind: ResourceKind, id: &ResourceId, resource: &Value)
        -> ApiResult<Value>;

    /// Merge the supplied fields into a resource.
    async fn patch(&self, kind: ResourceKind, id: &ResourceId, resource: &Value)
        -> ApiResult<Value>;
}

/// Identifiers of every existing resource of a kind.
pub async fn existing_ids<C: ResourceApi + ?Sized>(
    client: &C,
    kind: ResourceKind,
) -> ApiResult<Vec<ResourceId>> {
    let resources = client.retrieve_all(kind).await?;
    Ok(resources
        .iter()
        .filter_map(|resource| resource.get("id").and_then(Value::as_str))
        .filter_map(|id| id.parse().ok())
        .collect())
}
