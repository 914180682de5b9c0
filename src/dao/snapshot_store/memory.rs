use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{snapshot_store::SnapshotStore, storage::StorageResult};

/// Volatile store used when no data directory should be touched.
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshotStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySnapshotStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let blobs = self.blobs.clone();
        let key = key.to_string();
        Box::pin(async move { Ok(blobs.read().await.get(&key).cloned()) })
    }

    fn save(&self, key: &str, blob: String) -> BoxFuture<'static, StorageResult<()>> {
        let blobs = self.blobs.clone();
        let key = key.to_string();
        Box::pin(async move {
            blobs.write().await.insert(key, blob);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
