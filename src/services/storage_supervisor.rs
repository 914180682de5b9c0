use std::sync::Arc;

use indexmap::IndexMap;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::state::{engine::EngineSnapshot, process::ProcessState, stage::Stage};

/// Work queued for the persistence writer.
pub enum PersistRequest {
    /// Save the latest snapshot of its stage.
    Save(Arc<EngineSnapshot>),
    /// Acknowledge once everything queued before has been written.
    Flush(oneshot::Sender<()>),
}

/// Cloneable sender side of the persistence writer.
#[derive(Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistRequest>,
    degraded: watch::Receiver<bool>,
}

impl PersistHandle {
    /// Queue `snapshot` for saving; never waits on storage.
    pub fn save(&self, snapshot: Arc<EngineSnapshot>) {
        if self.tx.send(PersistRequest::Save(snapshot)).is_err() {
            warn!("persistence writer stopped; snapshot not saved");
        }
    }

    /// Wait until every queued snapshot has been handed to the store.
    ///
    /// Returns `false` when the writer is gone.
    pub async fn flush(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(PersistRequest::Flush(ack)).is_err() {
            return false;
        }
        done.await.is_ok()
    }

    /// Whether the last save attempt failed.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }
}

/// Start the persistence writer on the current runtime.
pub fn spawn(process: ProcessState) -> (PersistHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (degraded_tx, degraded_rx) = watch::channel(false);
    let task = tokio::spawn(run(process, rx, degraded_tx));
    (
        PersistHandle {
            tx,
            degraded: degraded_rx,
        },
        task,
    )
}

/// Drain the queue, keeping only the newest snapshot per stage, and save in order.
///
/// Storage failures are logged and flip the degraded flag; the engine is never blocked.
async fn run(
    process: ProcessState,
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
    degraded: watch::Sender<bool>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let mut pending: IndexMap<Stage, Arc<EngineSnapshot>> = IndexMap::new();
        for request in batch {
            match request {
                PersistRequest::Save(snapshot) => {
                    pending.insert(snapshot.stage, snapshot);
                }
                PersistRequest::Flush(ack) => {
                    write_all(&process, &mut pending, &degraded).await;
                    let _ = ack.send(());
                }
            }
        }
        write_all(&process, &mut pending, &degraded).await;
    }
    info!("persistence writer stopped");
}

async fn write_all(
    process: &ProcessState,
    pending: &mut IndexMap<Stage, Arc<EngineSnapshot>>,
    degraded: &watch::Sender<bool>,
) {
    for (stage, snapshot) in pending.drain(..) {
        match process.save(&snapshot).await {
            Ok(()) => {
                debug!(%stage, "scoreboard saved");
                degraded.send_if_modified(|flag| std::mem::replace(flag, false));
            }
            Err(err) => {
                warn!(%stage, error = %err, "failed to save scoreboard");
                degraded.send_if_modified(|flag| !std::mem::replace(flag, true));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            snapshot_store::{MemorySnapshotStore, SnapshotStore},
            storage::{StorageError, StorageResult},
        },
        state::engine::{EngineCommand, ScoreboardEngine},
    };
    use futures::future::BoxFuture;

    fn process(store: Arc<dyn SnapshotStore>) -> ProcessState {
        ProcessState::new(store, Arc::new(AppConfig::default()))
    }

    #[tokio::test]
    async fn flush_waits_for_latest_snapshot() {
        let store: Arc<dyn SnapshotStore> = Arc::new(MemorySnapshotStore::new());
        let process = process(store.clone());
        let (handle, _task) = spawn(process.clone());

        let mut engine = process.load(Stage::Final).await;
        handle.save(Arc::new(engine.snapshot()));
        engine
            .handle(EngineCommand::ApplyScore {
                team_id: 1,
                category: "wajib".into(),
                delta: 100,
            })
            .unwrap();
        handle.save(Arc::new(engine.snapshot()));
        assert!(handle.flush().await);

        let restored = process.load(Stage::Final).await;
        assert_eq!(restored.teams().get(1).unwrap().score, 100);
        assert!(!handle.is_degraded());
    }

    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self, _key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
            Box::pin(async { Ok(None) })
        }

        fn save(&self, key: &str, _blob: String) -> BoxFuture<'static, StorageResult<()>> {
            let key = key.to_string();
            Box::pin(async move {
                Err(StorageError::unavailable(
                    format!("cannot write {key}"),
                    std::io::Error::other("disk full"),
                ))
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn failed_save_marks_degraded() {
        let process = process(Arc::new(FailingStore));
        let (handle, _task) = spawn(process.clone());
        let engine = ScoreboardEngine::new(
            process.config().stage_config(Stage::Semifinal),
            process.config(),
        );

        handle.save(Arc::new(engine.snapshot()));
        assert!(handle.flush().await);
        assert!(handle.is_degraded());
    }
}
