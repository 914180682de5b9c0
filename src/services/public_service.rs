use crate::{
    dto::{
        common::{DeckView, LedgerEntryView, RoundView, ScoreboardView, TimerView},
        public::HistoryResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// Ranked scoreboard of the active stage.
pub fn scoreboard(state: &SharedState) -> ScoreboardView {
    let snapshot = state.snapshot();
    ScoreboardView::new(&snapshot, &state.stage_config())
}

/// Countdown values.
pub fn timer(state: &SharedState) -> TimerView {
    TimerView::from(&state.snapshot().timer)
}

/// Round progression of the active stage.
pub fn round(state: &SharedState) -> RoundView {
    let snapshot = state.snapshot();
    RoundView::new(&snapshot, &state.stage_config())
}

/// Card deck of the current final round.
pub fn cards(state: &SharedState) -> Result<DeckView, ServiceError> {
    state
        .snapshot()
        .cards
        .as_ref()
        .map(DeckView::from)
        .ok_or_else(|| ServiceError::NotFound("the semifinal stage has no card deck".into()))
}

/// Chronological score history.
pub fn history(state: &SharedState) -> HistoryResponse {
    let snapshot = state.snapshot();
    HistoryResponse {
        stage: snapshot.stage,
        entries: snapshot
            .ledger
            .entries()
            .iter()
            .map(|entry| LedgerEntryView::new(entry, &snapshot.teams))
            .collect(),
    }
}
