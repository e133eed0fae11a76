//! Watch a resource root and patch changed files one at a time.

mod queue;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use notify::{EventKind, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::api::ResourceApi;
use crate::error::{Error, Result};
use crate::mapping::{Location, MappingTable};
use crate::models::ResourceId;

pub use queue::{process, UploadQueue, WatchReport, QUEUE_CAPACITY};

/// A changed file resolved to the resource field it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub id: ResourceId,
    pub location: Location,
    pub file_name: String,
    /// Absolute path, re-read when the upload runs
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchRejection {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("unknown file: {0}")]
    UnknownFile(String),
}

/// Resolve `path` (below `root`) to a resource id and field location.
///
/// `<id>/<file>` is a default-locale file and `<id>/<dir>/<file>` is either a
/// reserved named directory or a locale. Anything else is an invalid path.
pub fn decompose(
    root: &Path,
    path: &Path,
    table: &MappingTable,
) -> std::result::Result<WatchTarget, WatchRejection> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let display = relative.to_string_lossy().replace('\\', "/");

    let segments: Vec<&str> = relative
        .components()
        .map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| WatchRejection::InvalidPath(display.clone()))?;

    let (id, location, file_name) = match segments.as_slice() {
        [id, file_name] => (*id, Location::Default, *file_name),
        [id, dir, file_name] if table.is_reserved_dir(dir) => {
            (*id, Location::Named((*dir).to_string()), *file_name)
        }
        [id, locale, file_name] => (*id, Location::Locale((*locale).to_string()), *file_name),
        _ => return Err(WatchRejection::InvalidPath(display)),
    };

    let id = id
        .parse::<ResourceId>()
        .map_err(|_| WatchRejection::InvalidPath(display.clone()))?;

    if !table.recognizes(&location, file_name) {
        return Err(WatchRejection::UnknownFile(display));
    }

    Ok(WatchTarget {
        id,
        location,
        file_name: file_name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Compiled watch globs for one mapping table.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    pub fn new(table: &MappingTable) -> Result<Self> {
        let patterns = table
            .watch_patterns()
            .iter()
            .map(|pattern| {
                Pattern::new(pattern)
                    .map_err(|error| Error::Watch(format!("invalid pattern '{pattern}': {error}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// True when the root-relative `path` matches any pattern.
    pub fn matches(&self, relative: &Path) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path_with(relative, Self::OPTIONS))
    }
}

/// Watch `root` until the file observer stops.
///
/// Create and modify events for mapped files are decomposed and queued;
/// every rejection and upload result is handed to `reporter`. Files that
/// already exist when the watch starts are not uploaded.
pub async fn watch<C, F>(
    client: Arc<C>,
    table: MappingTable,
    root: &Path,
    mut reporter: F,
) -> Result<()>
where
    C: ResourceApi + 'static,
    F: FnMut(WatchReport),
{
    let root = tokio::fs::canonicalize(root)
        .await
        .map_err(|error| Error::at_path(root, error))?;
    let patterns = PatternSet::new(&table)?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        let _ = event_tx.send(event);
    })
    .map_err(|error| Error::Watch(error.to_string()))?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|error| Error::Watch(error.to_string()))?;
    tracing::info!(root = %root.display(), "watching {}s", table.kind().label());

    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let queue = UploadQueue::start(client, table.clone(), report_tx);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!("watch error: {error}");
                        continue;
                    }
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    continue;
                }
                for path in event.paths {
                    let relative = path.strip_prefix(&root).unwrap_or(&path);
                    if !patterns.matches(relative) {
                        tracing::debug!(path = %path.display(), "ignoring unmapped path");
                        continue;
                    }
                    match decompose(&root, &path, &table) {
                        Ok(target) => queue.enqueue(target).await?,
                        Err(rejection) => reporter(WatchReport::Rejected { path, rejection }),
                    }
                }
            }
            Some(report) = report_rx.recv() => reporter(report),
            else => break,
        }
    }

    Err(Error::Watch("file observer stopped".to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::mock::{Call, MockApi};
    use crate::models::ResourceKind;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tokio::time::{sleep, Instant};

    fn root() -> PathBuf {
        PathBuf::from("/work/emails")
    }

    #[test]
    fn default_file_decomposes_to_default_location() {
        let id = ResourceId::new();
        let path = root().join(id.to_string()).join("subject.txt");

        let target = decompose(&root(), &path, &MappingTable::email()).unwrap();
        assert_eq!(target.id, id);
        assert_eq!(target.location, Location::Default);
        assert_eq!(target.file_name, "subject.txt");
        assert_eq!(target.path, path);
    }

    #[test]
    fn locale_and_named_dirs_are_told_apart() {
        let id = ResourceId::new();
        let table = MappingTable::theme();

        let locale = decompose(
            &root(),
            &root().join(id.to_string()).join("de").join("messages.txt"),
            &table,
        )
        .unwrap();
        assert_eq!(locale.location, Location::Locale("de".to_string()));

        let named = decompose(
            &root(),
            &root().join(id.to_string()).join("templates").join("index.ftl"),
            &table,
        )
        .unwrap();
        assert_eq!(named.location, Location::Named("templates".to_string()));
    }

    #[test]
    fn wrong_depth_or_id_is_an_invalid_path() {
        let table = MappingTable::email();
        let id = ResourceId::new().to_string();

        for path in [
            root().join("subject.txt"),
            root().join(&id).join("fr").join("extra").join("subject.txt"),
            root().join("drafts").join("subject.txt"),
        ] {
            let rejection = decompose(&root(), &path, &table).unwrap_err();
            assert!(matches!(rejection, WatchRejection::InvalidPath(_)), "{path:?}");
        }
    }

    #[test]
    fn unmapped_names_are_unknown_files() {
        let table = MappingTable::email();
        let id = ResourceId::new().to_string();

        let rejection = decompose(&root(), &root().join(&id).join("notes.md"), &table).unwrap_err();
        assert_eq!(
            rejection,
            WatchRejection::UnknownFile(format!("{id}/notes.md"))
        );

        let rejection = decompose(
            &root(),
            &root().join(&id).join("fr").join("name.txt"),
            &table,
        )
        .unwrap_err();
        assert!(matches!(rejection, WatchRejection::UnknownFile(_)));
    }

    #[test]
    fn disabled_theme_section_is_unknown() {
        let table = MappingTable::theme().restrict(&[crate::mapping::Section::Stylesheet]);
        let id = ResourceId::new().to_string();
        let rejection = decompose(
            &root(),
            &root().join(&id).join("templates").join("index.ftl"),
            &table,
        )
        .unwrap_err();
        assert!(matches!(rejection, WatchRejection::UnknownFile(_)));
    }

    #[test]
    fn pattern_set_matches_mapped_extensions_only() {
        let patterns = PatternSet::new(&MappingTable::theme()).unwrap();
        let id = ResourceId::new().to_string();

        assert!(patterns.matches(&Path::new(&id).join("stylesheet.css")));
        assert!(patterns.matches(&Path::new(&id).join("de").join("messages.txt")));
        assert!(patterns.matches(&Path::new(&id).join("templates").join("index.ftl")));
        assert!(patterns.matches(&Path::new(&id).join("notes.txt")));
        assert!(!patterns.matches(&Path::new(&id).join("notes.md")));
        assert!(!patterns.matches(&Path::new(&id).join("index.ftl")));
        assert!(!patterns.matches(&Path::new(&id).join(".notes.txt")));
        assert!(!patterns.matches(&Path::new(&id).join(".cache").join("messages.txt")));
    }

    #[test]
    fn matched_unmapped_name_is_reported_as_unknown() {
        let table = MappingTable::email();
        let patterns = PatternSet::new(&table).unwrap();
        let id = ResourceId::new().to_string();
        let relative = Path::new(&id).join("notes.txt");

        assert!(patterns.matches(&relative));
        assert_eq!(
            decompose(&root(), &root().join(&relative), &table).unwrap_err(),
            WatchRejection::UnknownFile(format!("{id}/notes.txt"))
        );
    }

    const SETTLE: Duration = Duration::from_millis(300);
    const DEADLINE: Duration = Duration::from_secs(10);

    fn patches(client: &MockApi) -> Vec<Value> {
        client
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Patch(_, _, body) => Some(body),
                _ => None,
            })
            .collect()
    }

    fn rejections(reports: &[WatchReport]) -> Vec<WatchRejection> {
        reports
            .iter()
            .filter_map(|report| match report {
                WatchReport::Rejected { rejection, .. } => Some(rejection.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn changes_are_patched_in_order_and_bad_paths_reported() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let id = ResourceId::new();
        let resource_dir = root.join(id.to_string());
        std::fs::create_dir_all(resource_dir.join("fr").join("extra")).unwrap();
        std::fs::write(resource_dir.join("name.txt"), "Existing").unwrap();

        let client = Arc::new(MockApi::new().with_resource(
            ResourceKind::Email,
            json!({ "id": id.to_string(), "name": "Remote" }),
        ));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();
        let watch_root = root.clone();
        let watch_client = client.clone();
        let handle = tokio::spawn(async move {
            watch(watch_client, MappingTable::email(), &watch_root, move |report| {
                let _ = report_tx.send(report);
            })
            .await
        });
        sleep(SETTLE).await;

        std::fs::write(resource_dir.join("subject.txt"), "Hello").unwrap();
        sleep(SETTLE).await;
        std::fs::write(resource_dir.join("body.html"), "<p>Hi</p>").unwrap();
        std::fs::write(resource_dir.join("notes.txt"), "scratch").unwrap();
        std::fs::write(resource_dir.join("notes.md"), "scratch").unwrap();
        std::fs::write(
            resource_dir.join("fr").join("extra").join("subject.txt"),
            "Salut",
        )
        .unwrap();

        let mut reports = Vec::new();
        let started = Instant::now();
        loop {
            while let Ok(report) = report_rx.try_recv() {
                reports.push(report);
            }
            let rejected = rejections(&reports);
            let done = patches(&client)
                .iter()
                .any(|body| body.get("defaultHtmlTemplate").is_some())
                && rejected
                    .iter()
                    .any(|r| matches!(r, WatchRejection::UnknownFile(_)))
                && rejected
                    .iter()
                    .any(|r| matches!(r, WatchRejection::InvalidPath(_)));
            if done || started.elapsed() > DEADLINE {
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }
        handle.abort();

        let bodies = patches(&client);
        assert_eq!(
            bodies.first(),
            Some(&json!({ "defaultSubject": "Hello" })),
            "{bodies:?}"
        );
        assert_eq!(
            bodies.last(),
            Some(&json!({ "defaultHtmlTemplate": "<p>Hi</p>" })),
            "{bodies:?}"
        );
        assert!(bodies.iter().all(|body| {
            *body == json!({ "defaultSubject": "Hello" })
                || *body == json!({ "defaultHtmlTemplate": "<p>Hi</p>" })
        }));
        assert!(client
            .calls()
            .iter()
            .all(|call| matches!(call, Call::Patch(ResourceKind::Email, patched, _) if *patched == id)));

        let rejected = rejections(&reports);
        assert!(rejected.contains(&WatchRejection::UnknownFile(format!("{id}/notes.txt"))));
        assert!(rejected.contains(&WatchRejection::InvalidPath(format!(
            "{id}/fr/extra/subject.txt"
        ))));
        assert!(rejected
            .iter()
            .all(|rejection| !rejection.to_string().contains("notes.md")));
    }
}
