//! Fill missing plain-text email bodies from their HTML counterparts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{local_ids, Target};
use crate::error::{Error, Result};
use crate::models::ResourceId;

const HTML_FILE: &str = "body.html";
const TEXT_FILE: &str = "body.txt";
/// Wide enough that paragraphs are never wrapped.
const RENDER_WIDTH: usize = 10_000;

/// One `body.txt` written from its sibling `body.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledBody {
    pub id: ResourceId,
    /// `None` for the default locale
    pub locale: Option<String>,
    pub path: PathBuf,
}

/// Render `body.txt` wherever `body.html` has content and the text is empty.
///
/// Looks at the default level of each email directory and at every
/// non-hidden subdirectory of it. Text bodies that already have content are
/// never touched.
pub async fn fill_text_bodies(root: &Path, target: Target) -> Result<Vec<FilledBody>> {
    let ids = match target {
        Target::One(id) => vec![id],
        Target::All => local_ids(root).await?,
    };

    let mut filled = Vec::new();
    for id in ids {
        let dir = root.join(id.to_string());
        if fill_dir(&dir).await? {
            filled.push(FilledBody {
                id,
                locale: None,
                path: dir.join(TEXT_FILE),
            });
        }

        for locale in locale_dirs(&dir).await? {
            let locale_dir = dir.join(&locale);
            if fill_dir(&locale_dir).await? {
                filled.push(FilledBody {
                    id,
                    path: locale_dir.join(TEXT_FILE),
                    locale: Some(locale),
                });
            }
        }
    }

    Ok(filled)
}

/// Plain text for an HTML email body.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), RENDER_WIDTH)
}

async fn fill_dir(dir: &Path) -> Result<bool> {
    let html = read_or_empty(&dir.join(HTML_FILE)).await?;
    let text_path = dir.join(TEXT_FILE);
    let text = read_or_empty(&text_path).await?;
    if html.is_empty() || !text.is_empty() {
        return Ok(false);
    }

    tokio::fs::write(&text_path, html_to_text(&html))
        .await
        .map_err(|error| Error::at_path(&text_path, error))?;
    tracing::info!(path = %text_path.display(), "rendered text body");
    Ok(true)
}

async fn read_or_empty(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(error) => Err(Error::at_path(path, error)),
    }
}

async fn locale_dirs(dir: &Path) -> Result<Vec<String>> {
    let mut locales = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|error| Error::at_path(dir, error))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::at_path(dir, error))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map_err(|error| Error::at_path(entry.path(), error))?
            .is_dir();
        if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
            if !name.starts_with('.') {
                locales.push(name.to_string());
            }
        }
    }
    locales.sort();
    Ok(locales)
}
