use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ImportRowsRequest, KeyPressRequest, QuestionBankResponse, ResetTimerRequest,
            RoundPlanResponse, ScoreRequest, StageRequest, TimerDurationRequest,
            UpdateTeamRequest,
        },
        common::ScoreboardView,
        public::QuestionsResponse,
    },
    error::AppError,
    services::{admin_service, export_service},
    state::{SharedState, engine::EngineCommand, round::RoundEvent},
};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Operator console endpoints driving the scoreboard engine.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/score", post(apply_score))
        .route("/admin/teams/{id}", put(update_team))
        .route("/admin/teams/import", post(import_teams_csv))
        .route("/admin/teams/import/rows", post(import_teams_rows))
        .route("/admin/undo", post(undo))
        .route("/admin/redo", post(redo))
        .route("/admin/reset", post(reset_scores))
        .route("/admin/round/advance", post(advance_round))
        .route("/admin/round/retreat", post(retreat_round))
        .route("/admin/round/confirm/{plan_id}", post(confirm_round))
        .route("/admin/round/cancel/{plan_id}", post(cancel_round))
        .route("/admin/timer/start", post(start_timer))
        .route("/admin/timer/pause", post(pause_timer))
        .route("/admin/timer/toggle", post(toggle_timer))
        .route("/admin/timer/reset", post(reset_timer))
        .route("/admin/timer/duration", put(set_timer_duration))
        .route("/admin/cards/{id}/flip", post(flip_card))
        .route("/admin/cards/shuffle", post(shuffle_cards))
        .route("/admin/cards/close", post(close_question))
        .route("/admin/keys", post(key_press))
        .route("/admin/stage", post(switch_stage))
        .route(
            "/admin/questions",
            get(current_questions).post(upload_questions),
        )
        .route("/admin/export/xlsx", get(export_xlsx))
        .route("/admin/export/teams.csv", get(export_teams_csv))
        .route("/admin/export/history.csv", get(export_history_csv))
}

/// Add a signed delta to one category of a team.
#[utoipa::path(
    post,
    path = "/admin/score",
    tag = "admin",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score applied", body = ScoreboardView),
        (status = 400, description = "Unknown category"),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn apply_score(
    State(state): State<SharedState>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::apply_score(&state, payload).await?))
}

/// Edit a team's name, school, or color.
#[utoipa::path(
    put,
    path = "/admin/teams/{id}",
    tag = "admin",
    params(("id" = u32, Path, description = "Team identifier")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = ScoreboardView),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::update_team(&state, id, payload).await?))
}

/// Replace the roster from a CSV body with a header row.
#[utoipa::path(
    post,
    path = "/admin/teams/import",
    tag = "admin",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Roster replaced", body = ScoreboardView),
        (status = 400, description = "Unreadable CSV or no rows")
    )
)]
pub async fn import_teams_csv(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::import_teams_csv(&state, &body).await?))
}

/// Replace the roster from JSON rows keyed by column header.
#[utoipa::path(
    post,
    path = "/admin/teams/import/rows",
    tag = "admin",
    request_body = ImportRowsRequest,
    responses(
        (status = 200, description = "Roster replaced", body = ScoreboardView),
        (status = 400, description = "No rows")
    )
)]
pub async fn import_teams_rows(
    State(state): State<SharedState>,
    Json(payload): Json<ImportRowsRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::import_teams_rows(&state, payload).await?))
}

/// Step back to the previous score snapshot.
#[utoipa::path(
    post,
    path = "/admin/undo",
    tag = "admin",
    responses((status = 200, description = "Scoreboard after undo", body = ScoreboardView))
)]
pub async fn undo(State(state): State<SharedState>) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::undo(&state).await?))
}

/// Re-apply the last undone score snapshot.
#[utoipa::path(
    post,
    path = "/admin/redo",
    tag = "admin",
    responses((status = 200, description = "Scoreboard after redo", body = ScoreboardView))
)]
pub async fn redo(State(state): State<SharedState>) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::redo(&state).await?))
}

/// Zero every score of the active stage; undoable.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    responses((status = 200, description = "Scores reset", body = ScoreboardView))
)]
pub async fn reset_scores(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::reset_scores(&state).await?))
}

/// Plan a move to the next session or round.
#[utoipa::path(
    post,
    path = "/admin/round/advance",
    tag = "admin",
    responses(
        (status = 200, description = "Plan awaiting confirmation", body = RoundPlanResponse),
        (status = 409, description = "Out of bounds or already pending")
    )
)]
pub async fn advance_round(
    State(state): State<SharedState>,
) -> Result<Json<RoundPlanResponse>, AppError> {
    Ok(Json(
        admin_service::plan_round(&state, RoundEvent::Advance).await?,
    ))
}

/// Plan a move back to the previous final round.
#[utoipa::path(
    post,
    path = "/admin/round/retreat",
    tag = "admin",
    responses(
        (status = 200, description = "Plan awaiting confirmation", body = RoundPlanResponse),
        (status = 409, description = "Out of bounds or already pending")
    )
)]
pub async fn retreat_round(
    State(state): State<SharedState>,
) -> Result<Json<RoundPlanResponse>, AppError> {
    Ok(Json(
        admin_service::plan_round(&state, RoundEvent::Retreat).await?,
    ))
}

/// Confirm the pending round change.
#[utoipa::path(
    post,
    path = "/admin/round/confirm/{plan_id}",
    tag = "admin",
    params(("plan_id" = Uuid, Path, description = "Plan returned by advance or retreat")),
    responses(
        (status = 200, description = "Round changed", body = ScoreboardView),
        (status = 404, description = "Plan does not match"),
        (status = 409, description = "Nothing pending")
    )
)]
pub async fn confirm_round(
    State(state): State<SharedState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::confirm_round(&state, plan_id).await?))
}

/// Drop the pending round change.
#[utoipa::path(
    post,
    path = "/admin/round/cancel/{plan_id}",
    tag = "admin",
    params(("plan_id" = Uuid, Path, description = "Plan returned by advance or retreat")),
    responses(
        (status = 200, description = "Plan dropped", body = ScoreboardView),
        (status = 404, description = "Plan does not match")
    )
)]
pub async fn cancel_round(
    State(state): State<SharedState>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::cancel_round(&state, plan_id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/timer/start",
    tag = "admin",
    responses((status = 200, description = "Countdown running", body = ScoreboardView))
)]
pub async fn start_timer(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        admin_service::timer_command(&state, EngineCommand::StartTimer).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/timer/pause",
    tag = "admin",
    responses((status = 200, description = "Countdown paused", body = ScoreboardView))
)]
pub async fn pause_timer(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        admin_service::timer_command(&state, EngineCommand::PauseTimer).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/timer/toggle",
    tag = "admin",
    responses((status = 200, description = "Countdown toggled", body = ScoreboardView))
)]
pub async fn toggle_timer(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        admin_service::timer_command(&state, EngineCommand::ToggleTimer).await?,
    ))
}

/// Stop and rewind the countdown, optionally to a new duration.
#[utoipa::path(
    post,
    path = "/admin/timer/reset",
    tag = "admin",
    request_body = ResetTimerRequest,
    responses((status = 200, description = "Countdown rewound", body = ScoreboardView))
)]
pub async fn reset_timer(
    State(state): State<SharedState>,
    Json(payload): Json<ResetTimerRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::reset_timer(&state, payload).await?))
}

/// Change the configured duration; deferred to the next reset while running.
#[utoipa::path(
    put,
    path = "/admin/timer/duration",
    tag = "admin",
    request_body = TimerDurationRequest,
    responses((status = 200, description = "Duration changed", body = ScoreboardView))
)]
pub async fn set_timer_duration(
    State(state): State<SharedState>,
    Json(payload): Json<TimerDurationRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(
        admin_service::set_timer_duration(&state, payload.seconds).await?,
    ))
}

/// Turn a card of the current final round.
#[utoipa::path(
    post,
    path = "/admin/cards/{id}/flip",
    tag = "admin",
    params(("id" = u8, Path, description = "Card identifier (1-5)")),
    responses(
        (status = 200, description = "Card flipped", body = ScoreboardView),
        (status = 409, description = "Already flipped, question open, or semifinal stage")
    )
)]
pub async fn flip_card(
    State(state): State<SharedState>,
    Path(id): Path<u8>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::flip_card(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/cards/shuffle",
    tag = "admin",
    responses(
        (status = 200, description = "Unflipped cards shuffled", body = ScoreboardView),
        (status = 409, description = "Every card already flipped")
    )
)]
pub async fn shuffle_cards(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::shuffle_cards(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/cards/close",
    tag = "admin",
    responses((status = 200, description = "Question closed", body = ScoreboardView))
)]
pub async fn close_question(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(admin_service::close_question(&state).await?))
}

/// Forward a key press to the shortcut machine.
#[utoipa::path(
    post,
    path = "/admin/keys",
    tag = "admin",
    request_body = KeyPressRequest,
    responses((status = 200, description = "Key handled", body = ScoreboardView))
)]
pub async fn key_press(
    State(state): State<SharedState>,
    Json(payload): Json<KeyPressRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::key_press(&state, payload).await?))
}

/// Save the active stage and load another one.
#[utoipa::path(
    post,
    path = "/admin/stage",
    tag = "admin",
    request_body = StageRequest,
    responses((status = 200, description = "Stage loaded", body = ScoreboardView))
)]
pub async fn switch_stage(
    State(state): State<SharedState>,
    Json(payload): Json<StageRequest>,
) -> Result<Json<ScoreboardView>, AppError> {
    Ok(Json(
        admin_service::switch_stage(&state, payload.stage).await?,
    ))
}

/// Replace the question bank from a CSV body.
#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Question bank replaced", body = QuestionBankResponse),
        (status = 400, description = "Unreadable CSV")
    )
)]
pub async fn upload_questions(
    State(state): State<SharedState>,
    body: String,
) -> Result<Json<QuestionBankResponse>, AppError> {
    Ok(Json(admin_service::upload_questions(&state, &body).await?))
}

/// Questions drawn for the current session or round.
#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "admin",
    responses(
        (status = 200, description = "Selected questions", body = QuestionsResponse),
        (status = 409, description = "Not enough questions for the round")
    )
)]
pub async fn current_questions(
    State(state): State<SharedState>,
) -> Result<Json<QuestionsResponse>, AppError> {
    Ok(Json(admin_service::current_questions(&state).await?))
}

/// Download the ranked team sheet and history as a workbook.
#[utoipa::path(
    get,
    path = "/admin/export/xlsx",
    tag = "admin",
    responses((status = 200, description = "Workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = Vec<u8>))
)]
pub async fn export_xlsx(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.snapshot();
    let bytes = export_service::export_xlsx(&snapshot, &state.stage_config())?;
    Ok(attachment(
        XLSX_CONTENT_TYPE,
        export_service::file_name(&snapshot, "lengkap.xlsx"),
        bytes,
    ))
}

/// Download the ranked team sheet as CSV.
#[utoipa::path(
    get,
    path = "/admin/export/teams.csv",
    tag = "admin",
    responses((status = 200, description = "Team sheet", content_type = "text/csv", body = String))
)]
pub async fn export_teams_csv(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.snapshot();
    let bytes = export_service::export_teams_csv(&snapshot, &state.stage_config())?;
    Ok(attachment(
        CSV_CONTENT_TYPE,
        export_service::file_name(&snapshot, "tim.csv"),
        bytes,
    ))
}

/// Download the score history as CSV.
#[utoipa::path(
    get,
    path = "/admin/export/history.csv",
    tag = "admin",
    responses((status = 200, description = "History sheet", content_type = "text/csv", body = String))
)]
pub async fn export_history_csv(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.snapshot();
    let bytes = export_service::export_history_csv(&snapshot)?;
    Ok(attachment(
        CSV_CONTENT_TYPE,
        export_service::file_name(&snapshot, "riwayat.csv"),
        bytes,
    ))
}

fn attachment(content_type: &str, file_name: String, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
}
