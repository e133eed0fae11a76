use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use super::{local_ids, Target};
use crate::api::{existing_ids, ResourceApi};
use crate::error::{Error, Result};
use crate::mapping::{from_files, MappingTable};
use crate::models::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Replace existing resources instead of patching them
    pub overwrite: bool,
    /// Create resources the server does not know yet
    pub create: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            create: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadAction {
    Create,
    Replace,
    Patch,
}

/// What to do with one local resource, or `None` to skip it.
///
/// A `partial` body (built from a restricted table) is always patched onto an
/// existing resource, so the parts left out are kept on the server.
pub const fn plan_action(
    exists: bool,
    partial: bool,
    options: UploadOptions,
) -> Option<UploadAction> {
    match (exists, options.overwrite && !partial, options.create) {
        (false, _, true) => Some(UploadAction::Create),
        (false, _, false) => None,
        (true, true, _) => Some(UploadAction::Replace),
        (true, false, _) => Some(UploadAction::Patch),
    }
}

#[derive(Debug)]
pub enum UploadOutcome {
    Created,
    Replaced,
    Patched,
    Skipped(String),
    Failed(Error),
}

impl UploadOutcome {
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<UploadAction> for UploadOutcome {
    fn from(action: UploadAction) -> Self {
        match action {
            UploadAction::Create => Self::Created,
            UploadAction::Replace => Self::Replaced,
            UploadAction::Patch => Self::Patched,
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Replaced => f.write_str("replaced"),
            Self::Patched => f.write_str("patched"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

#[derive(Debug)]
pub struct ResourceReport {
    pub id: ResourceId,
    pub outcome: UploadOutcome,
}

/// Push local trees to the server.
///
/// The existing ids are listed once up front; a failure there aborts the
/// whole run. After that every resource gets its own outcome and a failure
/// never stops the remaining ones.
pub async fn upload<C>(
    client: &C,
    table: &MappingTable,
    target: Target,
    root: &Path,
    options: UploadOptions,
) -> Result<Vec<ResourceReport>>
where
    C: ResourceApi + ?Sized,
{
    let kind = table.kind();
    if options.overwrite && table.is_restricted() {
        tracing::warn!(
            "only some {} parts are selected; patching instead of replacing",
            kind.label()
        );
    }
    let existing: BTreeSet<ResourceId> = existing_ids(client, kind).await?.into_iter().collect();

    let ids = match target {
        Target::One(id) => vec![id],
        Target::All => local_ids(root).await?,
    };

    let mut reports = Vec::with_capacity(ids.len());
    for id in ids {
        let outcome = upload_one(client, table, root, id, existing.contains(&id), options).await;
        match &outcome {
            UploadOutcome::Failed(error) => {
                tracing::warn!(%id, "failed to upload {}: {error}", kind.label());
            }
            other => tracing::info!(%id, "{} {other}", kind.label()),
        }
        reports.push(ResourceReport { id, outcome });
    }

    Ok(reports)
}

async fn upload_one<C>(
    client: &C,
    table: &MappingTable,
    root: &Path,
    id: ResourceId,
    exists: bool,
    options: UploadOptions,
) -> UploadOutcome
where
    C: ResourceApi + ?Sized,
{
    let Some(action) = plan_action(exists, table.is_restricted(), options) else {
        return UploadOutcome::Skipped(format!(
            "{} does not exist and creation is disabled",
            table.kind().label()
        ));
    };

    let resource = match from_files(table, &root.join(id.to_string())).await {
        Ok(resource) => resource,
        Err(error) => return UploadOutcome::Failed(error),
    };
    let body = table.resource_to_json(&resource);
    let kind = table.kind();

    let sent = match action {
        UploadAction::Create => client.create(kind, &id, &body).await,
        UploadAction::Replace => client.update(kind, &id, &body).await,
        UploadAction::Patch => client.patch(kind, &id, &body).await,
    };

    match sent {
        Ok(_) => action.into(),
        Err(error) => UploadOutcome::Failed(error.into()),
    }
}
