mod file;
mod memory;

pub use file::{FileSnapshotStore, FileStoreError};
pub use memory::MemorySnapshotStore;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Key/value blob store holding one serialized snapshot per stage.
pub trait SnapshotStore: Send + Sync {
    /// Read the blob stored under `key`, `None` when nothing was saved yet.
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend can still be written to.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
