use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;

use super::Target;
use crate::api::ResourceApi;
use crate::error::{Error, Result};
use crate::mapping::{to_files, write_tree, MappingTable};
use crate::models::ResourceId;

/// Ids written by a download, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: Vec<ResourceId>,
}

/// Fetch resources and write each one to `root/<id>/`.
///
/// With `clean`, the target directory is emptied first: `root/<id>` for a
/// single resource, the whole of `root` otherwise.
pub async fn download<C>(
    client: &C,
    table: &MappingTable,
    target: Target,
    root: &Path,
    clean: bool,
) -> Result<DownloadReport>
where
    C: ResourceApi + ?Sized,
{
    let kind = table.kind();

    if clean {
        match target {
            Target::One(id) => clean_dir(&root.join(id.to_string())).await?,
            Target::All => clean_dir(root).await?,
        }
    }

    let payloads: Vec<Value> = match target {
        Target::One(id) => vec![client.retrieve(kind, &id).await?],
        Target::All => client.retrieve_all(kind).await?,
    };

    let mut report = DownloadReport::default();
    for payload in &payloads {
        let resource = table.resource_from_json(payload)?;
        let Some(id) = resource.id else {
            tracing::warn!("skipping {} without an id", kind.label());
            continue;
        };

        let dir = root.join(id.to_string());
        write_tree(&dir, &to_files(table, &resource)?).await?;
        tracing::info!(%id, dir = %dir.display(), "downloaded {}", kind.label());
        report.downloaded.push(id);
    }

    Ok(report)
}

/// Remove everything inside `dir`, keeping `dir` itself. Missing is fine.
pub async fn clean_dir(dir: &Path) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(Error::at_path(dir, error)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::at_path(dir, error))?
    {
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .await
            .map_err(|error| Error::at_path(&path, error))?
            .is_dir();
        let removed = if is_dir {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        removed.map_err(|error| Error::at_path(&path, error))?;
    }

    tracing::debug!(dir = %dir.display(), "cleaned directory");
    Ok(())
}
