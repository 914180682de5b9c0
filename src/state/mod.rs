pub mod cards;
pub mod engine;
pub mod error;
pub mod history;
pub mod ledger;
pub mod process;
pub mod questions;
pub mod round;
mod sse;
pub mod stage;
pub mod tabular;
pub mod team;
pub mod timer;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::services::{engine_service::EngineHandle, storage_supervisor::PersistHandle};

pub use self::sse::SseHub;
use self::{
    engine::EngineSnapshot, process::ProcessState, questions::QuestionRow, stage::StageConfig,
};

pub type SharedState = Arc<AppState>;

/// Capacity of the public SSE broadcast channel.
pub const SSE_CAPACITY: usize = 64;

/// Central application state: the engine actor handle, its latest snapshot, and the
/// collaborators shared by every route.
pub struct AppState {
    engine: EngineHandle,
    snapshots: watch::Receiver<Arc<EngineSnapshot>>,
    sse: SseHub,
    process: ProcessState,
    persist: PersistHandle,
    questions: RwLock<Vec<QuestionRow>>,
}

impl AppState {
    /// Bundle already running collaborators into a shared state.
    pub fn new(
        engine: EngineHandle,
        snapshots: watch::Receiver<Arc<EngineSnapshot>>,
        sse: SseHub,
        process: ProcessState,
        persist: PersistHandle,
    ) -> SharedState {
        Arc::new(Self {
            engine,
            snapshots,
            sse,
            process,
            persist,
            questions: RwLock::new(Vec::new()),
        })
    }

    /// Handle used to send commands to the engine actor.
    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stage configuration matching the latest snapshot.
    pub fn stage_config(&self) -> StageConfig {
        let stage = self.snapshots.borrow().stage;
        self.process.config().stage_config(stage)
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Store and configuration.
    pub fn process(&self) -> &ProcessState {
        &self.process
    }

    /// Persistence writer handle.
    pub fn persist(&self) -> &PersistHandle {
        &self.persist
    }

    /// Question bank uploaded by the operator.
    pub fn questions(&self) -> &RwLock<Vec<QuestionRow>> {
        &self.questions
    }
}
