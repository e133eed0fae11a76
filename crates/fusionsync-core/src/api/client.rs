//! reqwest implementation of [`ResourceApi`] against the FusionAuth REST API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Map, Value};

use super::{ApiError, ApiErrors, ApiResult, ResourceApi};
use crate::models::{ResourceId, ResourceKind};
use crate::util::{is_http_url, normalize_text_option};

#[derive(Clone)]
pub struct FusionAuthClient {
    host: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for FusionAuthClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FusionAuthClient")
            .field("host", &self.host)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl FusionAuthClient {
    pub fn new(host: impl AsRef<str>, api_key: impl Into<String>) -> ApiResult<Self> {
        let host = normalize_host(host.as_ref())?;
        let api_key = normalize_text_option(Some(api_key.into())).ok_or_else(|| {
            ApiError::InvalidConfiguration("API key must not be empty".to_string())
        })?;

        Ok(Self {
            host,
            api_key,
            client: Client::builder().build()?,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, kind: ResourceKind, id: Option<&ResourceId>) -> String {
        let path = kind.endpoint().path;
        match id {
            Some(id) => format!("{}{path}/{id}", self.host),
            None => format!("{}{path}", self.host),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(remote_error(status, body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn write(
        &self,
        method: Method,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        let url = self.url(kind, Some(id));
        tracing::debug!(%method, %url, "sending {}", kind.label());
        let body = envelope(kind, resource);
        let response = self.send(self.request(method, &url).json(&body)).await?;
        Ok(unwrap_single(kind, response))
    }
}

#[async_trait]
impl ResourceApi for FusionAuthClient {
    async fn retrieve(&self, kind: ResourceKind, id: &ResourceId) -> ApiResult<Value> {
        let url = self.url(kind, Some(id));
        tracing::debug!(%url, "retrieving {}", kind.label());
        let response = self.send(self.request(Method::GET, &url)).await?;
        Ok(unwrap_single(kind, response))
    }

    async fn retrieve_all(&self, kind: ResourceKind) -> ApiResult<Vec<Value>> {
        let url = self.url(kind, None);
        tracing::debug!(%url, "retrieving all {}s", kind.label());
        let response = self.send(self.request(Method::GET, &url)).await?;
        Ok(unwrap_collection(kind, response))
    }

    async fn create(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.write(Method::POST, kind, id, resource).await
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.write(Method::PUT, kind, id, resource).await
    }

    async fn patch(
        &self,
        kind: ResourceKind,
        id: &ResourceId,
        resource: &Value,
    ) -> ApiResult<Value> {
        self.write(Method::PATCH, kind, id, resource).await
    }
}

/// Wrap a bare resource in its kind's request envelope.
pub(crate) fn envelope(kind: ResourceKind, resource: &Value) -> Value {
    let mut body = Map::new();
    body.insert(kind.endpoint().singular.to_string(), resource.clone());
    Value::Object(body)
}

fn unwrap_single(kind: ResourceKind, mut response: Value) -> Value {
    response
        .get_mut(kind.endpoint().singular)
        .map(Value::take)
        .unwrap_or(Value::Null)
}

fn unwrap_collection(kind: ResourceKind, mut response: Value) -> Vec<Value> {
    match response.get_mut(kind.endpoint().plural).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn remote_error(status: reqwest::StatusCode, body: String) -> ApiError {
    let errors = serde_json::from_str::<ApiErrors>(&body).unwrap_or_default();
    ApiError::Remote {
        status,
        errors,
        body: normalize_text_option(Some(body)),
    }
}

pub(crate) fn normalize_host(raw: &str) -> ApiResult<String> {
    let host = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        ApiError::InvalidConfiguration("host must not be empty".to_string())
    })?;
    if is_http_url(&host) {
        Ok(host.trim_end_matches('/').to_string())
    } else {
        Err(ApiError::InvalidConfiguration(
            "host must include http:// or https://".to_string(),
        ))
    }
}
