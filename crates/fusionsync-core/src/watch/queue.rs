//! Single-worker upload queue.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{WatchRejection, WatchTarget};
use crate::api::ResourceApi;
use crate::error::{Error, Result};
use crate::mapping::MappingTable;
use crate::models::ResourceId;

pub const QUEUE_CAPACITY: usize = 256;

/// Outcome of one observed change.
#[derive(Debug)]
pub enum WatchReport {
    Rejected {
        path: PathBuf,
        rejection: WatchRejection,
    },
    Patched {
        id: ResourceId,
        path: PathBuf,
    },
    Skipped {
        id: ResourceId,
        path: PathBuf,
        reason: String,
    },
    Failed {
        id: ResourceId,
        path: PathBuf,
        error: Error,
    },
}

/// FIFO of pending patches drained by exactly one worker task.
pub struct UploadQueue {
    sender: mpsc::Sender<WatchTarget>,
    worker: JoinHandle<()>,
}

impl UploadQueue {
    pub fn start<C>(
        client: Arc<C>,
        table: MappingTable,
        reports: mpsc::UnboundedSender<WatchReport>,
    ) -> Self
    where
        C: ResourceApi + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<WatchTarget>(QUEUE_CAPACITY);
        let worker = tokio::spawn(async move {
            while let Some(target) = receiver.recv().await {
                let report = process(client.as_ref(), &table, target).await;
                if reports.send(report).is_err() {
                    break;
                }
            }
        });
        Self { sender, worker }
    }

    /// Append a task; waits while the queue is full.
    pub async fn enqueue(&self, target: WatchTarget) -> Result<()> {
        tracing::debug!(path = %target.path.display(), "queued change");
        self.sender
            .send(target)
            .await
            .map_err(|_| Error::Watch("upload worker stopped".to_string()))
    }

    /// Stop accepting tasks and wait for the queued ones to finish.
    pub async fn close(self) -> Result<()> {
        drop(self.sender);
        self.worker
            .await
            .map_err(|error| Error::Watch(format!("upload worker failed: {error}")))
    }
}

/// Re-read the changed file and patch its single field.
pub async fn process<C>(client: &C, table: &MappingTable, target: WatchTarget) -> WatchReport
where
    C: ResourceApi + ?Sized,
{
    let WatchTarget {
        id,
        location,
        file_name,
        path,
    } = target;

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return WatchReport::Skipped {
                id,
                path,
                reason: "file no longer exists".to_string(),
            };
        }
        Err(error) => {
            let error = Error::at_path(&path, error);
            return WatchReport::Failed { id, path, error };
        }
    };

    let partial = match table.partial_for_file(&location, &file_name, content) {
        Ok(Some(partial)) => partial,
        Ok(None) => {
            return WatchReport::Skipped {
                id,
                path,
                reason: "nothing to send".to_string(),
            };
        }
        Err(error) => return WatchReport::Failed { id, path, error },
    };

    let body = table.resource_to_json(&partial);
    match client.patch(table.kind(), &id, &body).await {
        Ok(_) => {
            tracing::info!(%id, path = %path.display(), "patched {}", table.kind().label());
            WatchReport::Patched { id, path }
        }
        Err(error) => WatchReport::Failed {
            id,
            path,
            error: error.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{Call, MockApi};
    use crate::mapping::Location;
    use crate::models::ResourceKind;
    use serde_json::json;
    use tempfile::tempdir;

    fn target(root: &std::path::Path, id: ResourceId, file_name: &str, content: &str) -> WatchTarget {
        let dir = root.join(id.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        std::fs::write(&path, content).unwrap();
        WatchTarget {
            id,
            location: Location::Default,
            file_name: file_name.to_string(),
            path,
        }
    }

    fn remote(id: ResourceId) -> serde_json::Value {
        json!({ "id": id.to_string(), "name": "Remote" })
    }

    async fn drain(queue: UploadQueue, mut reports: mpsc::UnboundedReceiver<WatchReport>) -> Vec<WatchReport> {
        queue.close().await.unwrap();
        let mut collected = Vec::new();
        while let Some(report) = reports.recv().await {
            collected.push(report);
        }
        collected
    }

    #[tokio::test(flavor = "current_thread")]
    async fn tasks_run_in_enqueue_order() {
        let root = tempdir().unwrap();
        let first = ResourceId::new();
        let second = ResourceId::new();
        let client = Arc::new(
            MockApi::new()
                .with_resource(ResourceKind::Email, remote(first))
                .with_resource(ResourceKind::Email, remote(second)),
        );
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let queue = UploadQueue::start(client.clone(), MappingTable::email(), report_tx);

        queue.enqueue(target(root.path(), second, "subject.txt", "B")).await.unwrap();
        queue.enqueue(target(root.path(), first, "name.txt", "A")).await.unwrap();
        queue.enqueue(target(root.path(), second, "name.txt", "C")).await.unwrap();
        let reports = drain(queue, report_rx).await;

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|report| matches!(report, WatchReport::Patched { .. })));
        assert_eq!(
            client.calls(),
            vec![
                Call::Patch(ResourceKind::Email, second, json!({ "defaultSubject": "B" })),
                Call::Patch(ResourceKind::Email, first, json!({ "name": "A" })),
                Call::Patch(ResourceKind::Email, second, json!({ "name": "C" })),
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failure_does_not_stop_the_worker() {
        let root = tempdir().unwrap();
        let broken = ResourceId::new();
        let healthy = ResourceId::new();
        let client = Arc::new(
            MockApi::new()
                .with_resource(ResourceKind::Email, remote(broken))
                .with_resource(ResourceKind::Email, remote(healthy))
                .failing_for(broken),
        );
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let queue = UploadQueue::start(client, MappingTable::email(), report_tx);

        queue.enqueue(target(root.path(), broken, "name.txt", "X")).await.unwrap();
        queue.enqueue(target(root.path(), healthy, "name.txt", "Y")).await.unwrap();
        let reports = drain(queue, report_rx).await;

        assert!(matches!(reports[0], WatchReport::Failed { id, .. } if id == broken));
        assert!(matches!(reports[1], WatchReport::Patched { id, .. } if id == healthy));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn content_is_read_when_the_task_runs() {
        let root = tempdir().unwrap();
        let id = ResourceId::new();
        let client = MockApi::new().with_resource(ResourceKind::Email, remote(id));
        let task = target(root.path(), id, "subject.txt", "draft");
        std::fs::write(&task.path, "final").unwrap();

        let report = process(&client, &MappingTable::email(), task).await;

        assert!(matches!(report, WatchReport::Patched { .. }));
        assert_eq!(
            client.calls(),
            vec![Call::Patch(ResourceKind::Email, id, json!({ "defaultSubject": "final" }))]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_or_deleted_files_are_skipped() {
        let root = tempdir().unwrap();
        let id = ResourceId::new();
        let client = MockApi::new().with_resource(ResourceKind::Email, remote(id));

        let empty = target(root.path(), id, "subject.txt", "");
        let report = process(&client, &MappingTable::email(), empty).await;
        assert!(matches!(report, WatchReport::Skipped { .. }));

        let deleted = target(root.path(), id, "name.txt", "gone");
        std::fs::remove_file(&deleted.path).unwrap();
        let report = process(&client, &MappingTable::email(), deleted).await;
        assert!(matches!(report, WatchReport::Skipped { .. }));

        assert!(client.calls().is_empty());
    }
}
