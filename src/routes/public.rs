use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        common::{DeckView, RoundView, ScoreboardView, TimerView},
        public::HistoryResponse,
    },
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Read-only endpoints for the audience views.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/scoreboard", get(scoreboard))
        .route("/public/timer", get(timer))
        .route("/public/round", get(round))
        .route("/public/cards", get(cards))
        .route("/public/history", get(history))
}

/// Ranked scoreboard of the active stage.
#[utoipa::path(
    get,
    path = "/public/scoreboard",
    tag = "public",
    responses((status = 200, description = "Current scoreboard", body = ScoreboardView))
)]
pub async fn scoreboard(State(state): State<SharedState>) -> Json<ScoreboardView> {
    Json(public_service::scoreboard(&state))
}

#[utoipa::path(
    get,
    path = "/public/timer",
    tag = "public",
    responses((status = 200, description = "Countdown values", body = TimerView))
)]
pub async fn timer(State(state): State<SharedState>) -> Json<TimerView> {
    Json(public_service::timer(&state))
}

#[utoipa::path(
    get,
    path = "/public/round",
    tag = "public",
    responses((status = 200, description = "Round progression", body = RoundView))
)]
pub async fn round(State(state): State<SharedState>) -> Json<RoundView> {
    Json(public_service::round(&state))
}

/// Card deck of the current final round.
#[utoipa::path(
    get,
    path = "/public/cards",
    tag = "public",
    responses(
        (status = 200, description = "Card deck", body = DeckView),
        (status = 404, description = "Semifinal stage has no deck")
    )
)]
pub async fn cards(State(state): State<SharedState>) -> Result<Json<DeckView>, AppError> {
    Ok(Json(public_service::cards(&state)?))
}

/// Chronological score history.
#[utoipa::path(
    get,
    path = "/public/history",
    tag = "public",
    responses((status = 200, description = "Score history", body = HistoryResponse))
)]
pub async fn history(State(state): State<SharedState>) -> Json<HistoryResponse> {
    Json(public_service::history(&state))
}
