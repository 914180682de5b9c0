use thiserror::Error;

use crate::state::{
    round::{AbortError, ApplyError, PlanError},
    stage::Stage,
};

/// Reasons the scoreboard engine rejects a command.
///
/// Every variant is recoverable: the engine leaves its previous snapshot untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Unknown team id on an edit or score operation.
    #[error("team `{team_id}` not found")]
    NotFound {
        /// Identifier supplied by the operator.
        team_id: u32,
    },
    /// Score operation against a category the active stage does not define.
    #[error("category `{category}` is not defined for the {stage} stage")]
    InvalidCategory {
        /// Raw category name supplied by the operator.
        category: String,
        /// Stage that rejected it.
        stage: Stage,
    },
    /// Out-of-bounds round change, re-flipped card, or similar illegal move.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// Score delta would push a total past the representable range.
    #[error("adding {delta} to team `{team_id}` overflows its score")]
    ScoreOverflow {
        /// Team being scored.
        team_id: u32,
        /// Rejected delta.
        delta: i64,
    },
    /// Tabular import produced zero usable rows.
    #[error("import produced no usable team rows")]
    ImportEmpty,
    /// Question bank does not hold enough rows for the requested round.
    #[error("round {round} needs {needed} questions, found {found}")]
    InsufficientQuestions {
        /// Round being prepared.
        round: u8,
        /// Rows required.
        needed: usize,
        /// Rows matching the filter.
        found: usize,
    },
    /// Persisted blob could not be turned back into an engine.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
    /// A round change could not be planned.
    #[error("round change rejected: {0:?}")]
    Plan(PlanError),
    /// A pending round change could not be confirmed.
    #[error("round change confirmation failed: {0:?}")]
    Apply(ApplyError),
    /// A pending round change could not be cancelled.
    #[error("round change cancellation failed: {0:?}")]
    Abort(AbortError),
}

impl From<PlanError> for EngineError {
    fn from(err: PlanError) -> Self {
        EngineError::Plan(err)
    }
}

impl From<ApplyError> for EngineError {
    fn from(err: ApplyError) -> Self {
        EngineError::Apply(err)
    }
}

impl From<AbortError> for EngineError {
    fn from(err: AbortError) -> Self {
        EngineError::Abort(err)
    }
}
