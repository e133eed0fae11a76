//! Resource <-> directory tree translation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{Resource, ResourceId};
use crate::util::non_empty;

use super::{entry_name, parse_metadata, MappingTable};

/// One file to write, relative to the resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub path: PathBuf,
    pub content: String,
}

impl TreeFile {
    fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Lay a resource out as files.
///
/// Default files come first, then one directory per locale found in any
/// localized map, then named entries, then the metadata file. A field the
/// resource does not carry is written as an empty file.
pub fn to_files(table: &MappingTable, resource: &Resource) -> Result<Vec<TreeFile>> {
    let mut files: Vec<TreeFile> = table
        .files()
        .iter()
        .map(|entry| {
            TreeFile::new(
                entry.file_name,
                resource.field(entry.field).unwrap_or_default(),
            )
        })
        .collect();

    let locales = resource.locales();
    for locale in &locales {
        for (entry, field) in table.localized_files() {
            files.push(TreeFile::new(
                Path::new(locale).join(entry.file_name),
                resource.localized_value(field, locale).unwrap_or_default(),
            ));
        }
    }

    for dir in table.named_dirs() {
        if let Some(values) = resource.entries.get(dir.field) {
            for (name, content) in values {
                files.push(TreeFile::new(
                    Path::new(dir.dir_name).join(format!("{name}.{}", dir.extension)),
                    content.as_str(),
                ));
            }
        }
    }

    if let (Some(metadata), Some(data)) = (table.metadata(), &resource.data) {
        if !data.is_empty() {
            files.push(TreeFile::new(
                metadata.file_name,
                serde_json::to_string_pretty(data)?,
            ));
        }
    }

    Ok(files)
}

/// Write files below `dir`, creating intermediate directories.
///
/// Not atomic: a failure leaves the files written so far in place.
pub async fn write_tree(dir: &Path, files: &[TreeFile]) -> Result<()> {
    for file in files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| Error::at_path(parent, error))?;
        }
        tokio::fs::write(&path, &file.content)
            .await
            .map_err(|error| Error::at_path(&path, error))?;
        tracing::debug!(path = %path.display(), "wrote file");
    }
    Ok(())
}

/// Read a resource directory back into a partial resource.
///
/// Only files that exist with non-empty content contribute; everything else
/// is left out of the result so a patch never clears remote values.
pub async fn from_files(table: &MappingTable, dir: &Path) -> Result<Resource> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .map_err(|error| Error::at_path(dir, error))?;
    if !metadata.is_dir() {
        return Err(Error::NotFound(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let id = dir
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.parse::<ResourceId>().ok());
    let mut resource = Resource::new(id);

    for entry in table.files() {
        if let Some(content) = read_if_present(&dir.join(entry.file_name)).await? {
            resource.set_field(entry.field, content);
        }
    }

    if let Some(metadata) = table.metadata() {
        let path = dir.join(metadata.file_name);
        if let Some(content) = read_if_present(&path).await? {
            match parse_metadata(&content) {
                Ok(data) => resource.data = Some(data),
                Err(error) => {
                    tracing::warn!(path = %path.display(), "ignoring invalid metadata: {error}");
                }
            }
        }
    }

    for sub_dir in sub_directories(dir).await? {
        if let Some(named) = table.named_dir(&sub_dir) {
            read_named_entries(named, &dir.join(&sub_dir), &mut resource).await?;
            continue;
        }
        if table.is_reserved_dir(&sub_dir) {
            continue;
        }

        let locale_dir = dir.join(&sub_dir);
        for (entry, field) in table.localized_files() {
            if let Some(content) = read_if_present(&locale_dir.join(entry.file_name)).await? {
                resource.set_localized(field, &sub_dir, content);
            }
        }
    }

    Ok(resource)
}

async fn read_named_entries(
    named: &super::NamedDir,
    dir: &Path,
    resource: &mut Resource,
) -> Result<()> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|error| Error::at_path(dir, error))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::at_path(dir, error))?
    {
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(name) = entry_name(named, &file_name) else {
            continue;
        };
        if let Some(content) = read_if_present(&entry.path()).await? {
            resource.set_entry(named.field, name, content);
        }
    }
    Ok(())
}

/// Names of immediate, non-hidden subdirectories.
async fn sub_directories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|error| Error::at_path(dir, error))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::at_path(dir, error))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|error| Error::at_path(entry.path(), error))?;
        if !file_type.is_dir() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            if !name.starts_with('.') {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) async fn read_if_present(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(non_empty(content)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(Error::at_path(path, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_email() -> Resource {
        Resource::default()
            .with_field("name", "Welcome")
            .with_field("fromEmail", "noreply@example.com")
            .with_field("defaultSubject", "Hello ${user.firstName}")
            .with_field("defaultHtmlTemplate", "<p>Hello</p>")
            .with_localized("localizedSubjects", "fr", "Bonjour")
            .with_localized("localizedHtmlTemplates", "de", "<p>Hallo</p>")
    }

    #[test]
    fn to_files_emits_defaults_then_locale_union() {
        let files = to_files(&MappingTable::email(), &sample_email()).unwrap();
        let paths: Vec<String> = files
            .iter()
            .map(|file| file.path.to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(
            paths,
            vec![
                "name.txt",
                "from_email.txt",
                "body.html",
                "body.txt",
                "subject.txt",
                "from_name.txt",
                "de/body.html",
                "de/body.txt",
                "de/subject.txt",
                "de/from_name.txt",
                "fr/body.html",
                "fr/body.txt",
                "fr/subject.txt",
                "fr/from_name.txt",
            ]
        );

        let fr_subject = files
            .iter()
            .find(|file| file.path == Path::new("fr").join("subject.txt"))
            .unwrap();
        assert_eq!(fr_subject.content, "Bonjour");
        let fr_body = files
            .iter()
            .find(|file| file.path == Path::new("fr").join("body.html"))
            .unwrap();
        assert_eq!(fr_body.content, "");
    }

    #[test]
    fn to_files_writes_metadata_only_when_present() {
        let table = MappingTable::message();
        let plain = Resource::default().with_field("name", "SMS");
        assert!(to_files(&table, &plain)
            .unwrap()
            .iter()
            .all(|file| file.path != Path::new("data.json")));

        let mut with_data = plain;
        with_data.data = json!({ "owner": "ops" }).as_object().cloned();
        let files = to_files(&table, &with_data).unwrap();
        let data = files
            .iter()
            .find(|file| file.path == Path::new("data.json"))
            .unwrap();
        assert_eq!(data.content, "{\n  \"owner\": \"ops\"\n}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn round_trip_preserves_present_fields_and_omits_absent_ones() {
        let root = tempdir().unwrap();
        let id = ResourceId::new();
        let dir = root.path().join(id.to_string());
        let table = MappingTable::email();
        let original = sample_email();

        write_tree(&dir, &to_files(&table, &original).unwrap())
            .await
            .unwrap();
        let restored = from_files(&table, &dir).await.unwrap();

        assert_eq!(restored.id, Some(id));
        assert_eq!(restored.fields, original.fields);
        assert_eq!(restored.localized, original.localized);
        assert_eq!(restored.field("defaultTextTemplate"), None);
        assert_eq!(restored.localized_value("localizedHtmlTemplates", "fr"), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn round_trip_theme_with_templates_and_messages() {
        let root = tempdir().unwrap();
        let dir = root.path().join(ResourceId::new().to_string());
        let table = MappingTable::theme();
        let original = Resource::default()
            .with_field("name", "Brand")
            .with_field("stylesheet", "body { color: red; }")
            .with_field("defaultMessages", "login=Login")
            .with_localized("localizedMessages", "de", "login=Anmelden")
            .with_entry("templates", "oauth2Authorize", "[#ftl/]");

        write_tree(&dir, &to_files(&table, &original).unwrap())
            .await
            .unwrap();
        let restored = from_files(&table, &dir).await.unwrap();

        assert_eq!(restored.fields, original.fields);
        assert_eq!(restored.localized, original.localized);
        assert_eq!(restored.entries, original.entries);
        assert!(restored.localized_value("localizedMessages", "templates").is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn from_files_ignores_unknown_files_and_empty_locales() {
        let root = tempdir().unwrap();
        let dir = root.path().join(ResourceId::new().to_string());
        std::fs::create_dir_all(dir.join("fr")).unwrap();
        std::fs::create_dir_all(dir.join("es")).unwrap();
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        std::fs::write(dir.join("name.txt"), "Welcome").unwrap();
        std::fs::write(dir.join("subject.txt"), "").unwrap();
        std::fs::write(dir.join("notes.md"), "scratch").unwrap();
        std::fs::write(dir.join("fr").join("subject.txt"), "Bonjour").unwrap();
        std::fs::write(dir.join("fr").join("name.txt"), "ignored").unwrap();
        std::fs::write(dir.join("es").join("subject.txt"), "").unwrap();
        std::fs::write(dir.join(".git").join("subject.txt"), "hidden").unwrap();

        let resource = from_files(&MappingTable::email(), &dir).await.unwrap();

        assert_eq!(resource.field("name"), Some("Welcome"));
        assert_eq!(resource.field("defaultSubject"), None);
        assert_eq!(resource.fields.len(), 1);
        assert_eq!(resource.locales().into_iter().collect::<Vec<_>>(), vec!["fr"]);
        assert_eq!(resource.localized_value("localizedSubjects", "fr"), Some("Bonjour"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn from_files_skips_invalid_metadata() {
        let root = tempdir().unwrap();
        let dir = root.path().join(ResourceId::new().to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("name.txt"), "Codes").unwrap();
        std::fs::write(dir.join("data.json"), "{ not json").unwrap();

        let resource = from_files(&MappingTable::message(), &dir).await.unwrap();
        assert_eq!(resource.field("name"), Some("Codes"));
        assert!(resource.data.is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn from_files_fails_for_missing_directory() {
        let root = tempdir().unwrap();
        let error = from_files(&MappingTable::email(), &root.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Path { .. }));
    }
}
