use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::fs;

use crate::dao::{
    snapshot_store::SnapshotStore,
    storage::{StorageError, StorageResult},
};

type FileResult<T> = std::result::Result<T, FileStoreError>;

/// Failures of the on-disk snapshot store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory `{path}`")]
    CreateDir {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A blob file exists but could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A blob could not be written or moved into place.
    #[error("failed to write `{path}`")]
    Write {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The data directory is missing or is not a directory.
    #[error("data directory `{path}` is not usable")]
    Health {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Stores each blob as `<data_dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileSnapshotStore {
    dir: Arc<PathBuf>,
}

impl FileSnapshotStore {
    /// Open the store, creating the data directory when missing.
    pub async fn open(dir: impl Into<PathBuf>) -> FileResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read(&self, key: &str) -> FileResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileStoreError::Read { path, source }),
        }
    }

    /// Writes a staging file, then renames it over the blob.
    async fn write(&self, key: &str, blob: String) -> FileResult<()> {
        let path = self.path_for(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&staging, blob)
            .await
            .map_err(|source| FileStoreError::Write {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| FileStoreError::Write { path, source })
    }

    async fn check(&self) -> FileResult<()> {
        let path = self.dir.as_ref().clone();
        let metadata = fs::metadata(&path)
            .await
            .map_err(|source| FileStoreError::Health {
                path: path.clone(),
                source,
            })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(FileStoreError::Health {
                path,
                source: io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            })
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.read(&key).await.map_err(Into::into) })
    }

    fn save(&self, key: &str, blob: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.write(&key, blob).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load("scoreboardFinalData").await.unwrap(), None);
    }

    #[tokio::test]
    async fn saved_blob_is_read_back_and_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path().join("nested")).await.unwrap();

        store.save("key", "{\"a\":1}".into()).await.unwrap();
        store.save("key", "{\"a\":2}".into()).await.unwrap();

        assert_eq!(
            store.load("key").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert!(!store.dir().join("key.json.tmp").exists());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn health_check_fails_when_directory_vanishes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let store = FileSnapshotStore::open(&root).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        assert!(matches!(
            store.health_check().await,
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn health_error_names_directory_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let store = FileSnapshotStore::open(&root).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let err = store.check().await.unwrap_err();

        assert!(err.to_string().contains(&root.display().to_string()));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<io::Error>().is_some());
    }
}
