use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mapping::{to_files, write_tree, MappingTable};
use crate::models::{Resource, ResourceId};

/// Create an empty resource tree under a fresh id.
///
/// Every default file is created empty, plus one directory per requested
/// locale holding every localizable file.
pub async fn scaffold(table: &MappingTable, root: &Path, locales: &[String]) -> Result<ResourceId> {
    let id = ResourceId::new();
    let mut resource = Resource::new(Some(id));

    for locale in locales {
        validate_locale(table, locale)?;
        for (_, field) in table.localized_files() {
            resource.set_localized(field, locale, "");
        }
    }

    let dir = root.join(id.to_string());
    write_tree(&dir, &to_files(table, &resource)?).await?;
    tracing::info!(%id, dir = %dir.display(), "created {}", table.kind().label());
    Ok(id)
}

fn validate_locale(table: &MappingTable, locale: &str) -> Result<()> {
    let valid = !locale.is_empty()
        && !locale.starts_with('.')
        && !locale.contains(['/', '\\'])
        && !table.is_reserved_dir(locale);
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid locale '{locale}'")))
    }
}

/// Copy `root/<id>` to `root/<new id>` and return the new id.
pub async fn duplicate(root: &Path, id: &ResourceId) -> Result<ResourceId> {
    let source = root.join(id.to_string());
    if !tokio::fs::try_exists(&source)
        .await
        .map_err(|error| Error::at_path(&source, error))?
    {
        return Err(Error::NotFound(format!("{} does not exist", source.display())));
    }

    let copy = ResourceId::new();
    copy_tree(&source, &root.join(copy.to_string())).await?;
    tracing::info!(from = %id, to = %copy, "duplicated resource");
    Ok(copy)
}

async fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), destination.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        tokio::fs::create_dir_all(&to)
            .await
            .map_err(|error| Error::at_path(&to, error))?;
        let mut entries = tokio::fs::read_dir(&from)
            .await
            .map_err(|error| Error::at_path(&from, error))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| Error::at_path(&from, error))?
        {
            let path = entry.path();
            let target = to.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|error| Error::at_path(&path, error))?;
            if file_type.is_dir() {
                pending.push((path, target));
            } else {
                tokio::fs::copy(&path, &target)
                    .await
                    .map_err(|error| Error::at_path(&path, error))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "current_thread")]
    async fn scaffold_creates_empty_defaults_and_locales() {
        let root = tempdir().unwrap();
        let id = scaffold(
            &MappingTable::email(),
            root.path(),
            &["fr".to_string(), "de".to_string()],
        )
        .await
        .unwrap();

        let dir = root.path().join(id.to_string());
        for name in ["name.txt", "from_email.txt", "body.html", "body.txt", "subject.txt", "from_name.txt"] {
            assert_eq!(std::fs::read_to_string(dir.join(name)).unwrap(), "", "{name}");
        }
        for locale in ["fr", "de"] {
            assert!(dir.join(locale).join("subject.txt").exists());
            assert!(!dir.join(locale).join("name.txt").exists());
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn scaffold_rejects_reserved_locale_names() {
        let root = tempdir().unwrap();
        let error = scaffold(&MappingTable::theme(), root.path(), &["templates".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn duplicate_copies_nested_files() {
        let root = tempdir().unwrap();
        let id = ResourceId::new();
        let dir = root.path().join(id.to_string());
        std::fs::create_dir_all(dir.join("fr")).unwrap();
        std::fs::write(dir.join("name.txt"), "Welcome").unwrap();
        std::fs::write(dir.join("fr").join("subject.txt"), "Bonjour").unwrap();

        let copy = duplicate(root.path(), &id).await.unwrap();

        assert_ne!(copy, id);
        let copied = root.path().join(copy.to_string());
        assert_eq!(std::fs::read_to_string(copied.join("name.txt")).unwrap(), "Welcome");
        assert_eq!(
            std::fs::read_to_string(copied.join("fr").join("subject.txt")).unwrap(),
            "Bonjour"
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn duplicate_of_missing_resource_fails() {
        let root = tempdir().unwrap();
        let error = duplicate(root.path(), &ResourceId::new()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }
}
