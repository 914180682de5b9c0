use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard console.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::public::scoreboard,
        crate::routes::public::timer,
        crate::routes::public::round,
        crate::routes::public::cards,
        crate::routes::public::history,
        crate::routes::admin::apply_score,
        crate::routes::admin::update_team,
        crate::routes::admin::import_teams_csv,
        crate::routes::admin::import_teams_rows,
        crate::routes::admin::undo,
        crate::routes::admin::redo,
        crate::routes::admin::reset_scores,
        crate::routes::admin::advance_round,
        crate::routes::admin::retreat_round,
        crate::routes::admin::confirm_round,
        crate::routes::admin::cancel_round,
        crate::routes::admin::start_timer,
        crate::routes::admin::pause_timer,
        crate::routes::admin::toggle_timer,
        crate::routes::admin::reset_timer,
        crate::routes::admin::set_timer_duration,
        crate::routes::admin::flip_card,
        crate::routes::admin::shuffle_cards,
        crate::routes::admin::close_question,
        crate::routes::admin::key_press,
        crate::routes::admin::switch_stage,
        crate::routes::admin::upload_questions,
        crate::routes::admin::current_questions,
        crate::routes::admin::export_xlsx,
        crate::routes::admin::export_teams_csv,
        crate::routes::admin::export_history_csv,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SignalEvent,
            crate::dto::common::ScoreboardView,
            crate::dto::common::TimerView,
            crate::dto::common::RoundView,
            crate::dto::common::DeckView,
            crate::dto::public::HistoryResponse,
            crate::dto::public::QuestionsResponse,
            crate::dto::admin::ScoreRequest,
            crate::dto::admin::UpdateTeamRequest,
            crate::dto::admin::ImportRowsRequest,
            crate::dto::admin::TimerDurationRequest,
            crate::dto::admin::ResetTimerRequest,
            crate::dto::admin::KeyPressRequest,
            crate::dto::admin::StageRequest,
            crate::dto::admin::RoundPlanResponse,
            crate::dto::admin::QuestionBankResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Read-only views for audience screens"),
        (name = "admin", description = "Operator console operations"),
    )
)]
pub struct ApiDoc;
