//! Lambda files and application lambda links.
//!
//! Lambdas are kept as one YAML document per lambda, `<dir>/<id>.yaml`, whose
//! content is the lambda object the server expects.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::api::ResourceApi;
use crate::error::{Error, Result};
use crate::models::{ResourceId, ResourceKind};

const ACCESS_TOKEN_POPULATE_ID: &str = "accessTokenPopulateId";
const ID_TOKEN_POPULATE_ID: &str = "idTokenPopulateId";

pub fn lambda_path(dir: &Path, id: &ResourceId) -> PathBuf {
    dir.join(format!("{id}.yaml"))
}

/// Read `<dir>/<id>.yaml` as a JSON object.
pub async fn load_lambda(dir: &Path, id: &ResourceId) -> Result<Value> {
    let path = lambda_path(dir, id);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|error| Error::at_path(&path, error))?;
    let value: Value = serde_yaml::from_str(&raw)?;
    if !value.is_object() {
        return Err(Error::InvalidInput(format!(
            "{} must contain a YAML mapping",
            path.display()
        )));
    }
    Ok(value)
}

pub fn lambda_to_yaml(lambda: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(lambda)?)
}

pub async fn create_lambda<C>(client: &C, dir: &Path, id: &ResourceId) -> Result<Value>
where
    C: ResourceApi + ?Sized,
{
    let lambda = load_lambda(dir, id).await?;
    tracing::info!(%id, "creating lambda");
    Ok(client.create(ResourceKind::Lambda, id, &lambda).await?)
}

pub async fn update_lambda<C>(client: &C, dir: &Path, id: &ResourceId) -> Result<Value>
where
    C: ResourceApi + ?Sized,
{
    let lambda = load_lambda(dir, id).await?;
    tracing::info!(%id, "updating lambda");
    Ok(client.update(ResourceKind::Lambda, id, &lambda).await?)
}

/// Fetch a lambda as YAML, optionally saving it as `<output>/<id>.yaml`.
pub async fn retrieve_lambda<C>(
    client: &C,
    id: &ResourceId,
    output: Option<&Path>,
) -> Result<String>
where
    C: ResourceApi + ?Sized,
{
    let lambda = client.retrieve(ResourceKind::Lambda, id).await?;
    let yaml = lambda_to_yaml(&lambda)?;

    if let Some(dir) = output {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|error| Error::at_path(dir, error))?;
        let path = lambda_path(dir, id);
        tokio::fs::write(&path, &yaml)
            .await
            .map_err(|error| Error::at_path(&path, error))?;
        tracing::debug!(path = %path.display(), "wrote lambda");
    }

    Ok(yaml)
}

/// Patch body installing `lambda_id` as both token populate lambdas.
pub fn link_request(lambda_id: &ResourceId) -> Value {
    json!({
        "lambdaConfiguration": {
            ACCESS_TOKEN_POPULATE_ID: lambda_id.to_string(),
            ID_TOKEN_POPULATE_ID: lambda_id.to_string(),
        }
    })
}

/// Patch body clearing every populate slot that points at `lambda_id`.
///
/// Returns `None` when the application has no populate lambda at all.
pub fn unlink_request(application: &Value, lambda_id: &ResourceId) -> Option<Value> {
    let configuration = application.get("lambdaConfiguration");
    let slot = |key: &str| {
        configuration
            .and_then(|configuration| configuration.get(key))
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let access = slot(ACCESS_TOKEN_POPULATE_ID);
    let id_token = slot(ID_TOKEN_POPULATE_ID);
    if access.is_none() && id_token.is_none() {
        return None;
    }

    let target = lambda_id.to_string();
    let keep = |current: Option<String>| match current {
        Some(value) if value == target => String::new(),
        Some(value) => value,
        None => String::new(),
    };

    Some(json!({
        "lambdaConfiguration": {
            ACCESS_TOKEN_POPULATE_ID: keep(access),
            ID_TOKEN_POPULATE_ID: keep(id_token),
        }
    }))
}

pub async fn link_to_application<C>(
    client: &C,
    application_id: &ResourceId,
    lambda_id: &ResourceId,
) -> Result<Value>
where
    C: ResourceApi + ?Sized,
{
    tracing::info!(%application_id, %lambda_id, "linking lambda");
    Ok(client
        .patch(ResourceKind::Application, application_id, &link_request(lambda_id))
        .await?)
}

/// Unlink a lambda. `Ok(false)` means the application had nothing linked and
/// no request was sent.
pub async fn unlink_from_application<C>(
    client: &C,
    application_id: &ResourceId,
    lambda_id: &ResourceId,
) -> Result<bool>
where
    C: ResourceApi + ?Sized,
{
    let application = client
        .retrieve(ResourceKind::Application, application_id)
        .await?;
    let Some(request) = unlink_request(&application, lambda_id) else {
        return Ok(false);
    };

    tracing::info!(%application_id, %lambda_id, "unlinking lambda");
    client
        .patch(ResourceKind::Application, application_id, &request)
        .await?;
    Ok(true)
}
