//! Download, upload and scaffolding of resource trees, plus email text
//! body rendering.
//!
//! Tree operations are generic over [`MappingTable`](crate::mapping::MappingTable)
//! and process resources one at a time.

mod download;
mod scaffold;
mod text_body;
mod upload;

use std::path::Path;

use crate::error::{Error, Result};
use crate::models::ResourceId;

pub use download::{clean_dir, download, DownloadReport};
pub use scaffold::{duplicate, scaffold};
pub use text_body::{fill_text_bodies, html_to_text, FilledBody};
pub use upload::{plan_action, upload, ResourceReport, UploadAction, UploadOptions, UploadOutcome};

/// Which resources an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One(ResourceId),
    All,
}

impl From<Option<ResourceId>> for Target {
    fn from(id: Option<ResourceId>) -> Self {
        id.map_or(Self::All, Self::One)
    }
}

/// Subdirectories of `root` named by a valid id, sorted.
pub async fn local_ids(root: &Path) -> Result<Vec<ResourceId>> {
    let mut ids = Vec::new();
    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|error| Error::at_path(root, error))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::at_path(root, error))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map_err(|error| Error::at_path(entry.path(), error))?
            .is_dir();
        if !is_dir {
            continue;
        }
        match entry.file_name().to_str().map(str::parse::<ResourceId>) {
            Some(Ok(id)) => ids.push(id),
            _ => tracing::debug!(path = %entry.path().display(), "skipping non-id directory"),
        }
    }
    ids.sort();
    Ok(ids)
}
