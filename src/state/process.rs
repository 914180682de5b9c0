use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::{
        models::ScoreboardEntity,
        snapshot_store::SnapshotStore,
        storage::{StorageError, StorageResult},
    },
    state::{
        engine::{EngineSnapshot, ScoreboardEngine},
        error::EngineError,
        stage::Stage,
    },
};

#[derive(Debug, Error)]
enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] EngineError),
}

/// Process-wide collaborators handed to the engine: the blob store and configuration.
#[derive(Clone)]
pub struct ProcessState {
    store: Arc<dyn SnapshotStore>,
    config: Arc<AppConfig>,
}

impl ProcessState {
    /// Bundle the store and configuration.
    pub fn new(store: Arc<dyn SnapshotStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Shared configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Blob store.
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        self.store.clone()
    }

    /// Engine for `stage`, restored from its blob or built from defaults.
    ///
    /// Missing, unreadable, or inconsistent blobs never fail the load.
    pub async fn load(&self, stage: Stage) -> ScoreboardEngine {
        match self.try_load(stage).await {
            Ok(Some(engine)) => {
                info!(%stage, teams = engine.teams().len(), "restored saved scoreboard");
                engine
            }
            Ok(None) => {
                info!(%stage, "no saved scoreboard; starting from defaults");
                self.fresh(stage)
            }
            Err(err) => {
                warn!(%stage, error = %err, "saved scoreboard unusable; starting from defaults");
                self.fresh(stage)
            }
        }
    }

    /// Persist a snapshot under its stage key.
    pub async fn save(&self, snapshot: &EngineSnapshot) -> StorageResult<()> {
        let key = snapshot.stage.storage_key();
        let blob = serde_json::to_string(&ScoreboardEntity::from(snapshot))
            .map_err(|err| StorageError::malformed(key, err))?;
        self.store.save(key, blob).await
    }

    fn fresh(&self, stage: Stage) -> ScoreboardEngine {
        ScoreboardEngine::new(self.config.stage_config(stage), &self.config)
    }

    async fn try_load(&self, stage: Stage) -> Result<Option<ScoreboardEngine>, LoadError> {
        let key = stage.storage_key();
        let Some(blob) = self.store.load(key).await? else {
            return Ok(None);
        };
        let entity: ScoreboardEntity =
            serde_json::from_str(&blob).map_err(|err| StorageError::malformed(key, err))?;
        let snapshot = EngineSnapshot::try_from(entity)?;
        let engine = ScoreboardEngine::restore(self.config.stage_config(stage), snapshot)?;
        Ok(Some(engine))
    }
}
