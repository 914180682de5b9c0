use tracing::info;

use crate::{
    dto::{
        admin::{
            ImportRowsRequest, KeyPressRequest, QuestionBankResponse, ResetTimerRequest,
            RoundPlanResponse, ScoreRequest, UpdateTeamRequest,
        },
        common::ScoreboardView,
        public::{QuestionView, QuestionsResponse},
    },
    error::ServiceError,
    services::{import_service, public_service},
    state::{
        SharedState,
        engine::{EngineCommand, KeyInput},
        questions::{select_round_questions, select_session_questions},
        round::{PlanId, RoundEvent},
        stage::Stage,
        team::TeamId,
    },
};

async fn run(state: &SharedState, command: EngineCommand) -> Result<ScoreboardView, ServiceError> {
    state.engine().dispatch(command).await?;
    Ok(public_service::scoreboard(state))
}

/// Add a signed delta to one category of a team.
pub async fn apply_score(
    state: &SharedState,
    request: ScoreRequest,
) -> Result<ScoreboardView, ServiceError> {
    run(
        state,
        EngineCommand::ApplyScore {
            team_id: request.team_id,
            category: request.category,
            delta: request.delta,
        },
    )
    .await
}

/// Edit a team's name, school, or color.
pub async fn update_team(
    state: &SharedState,
    team_id: TeamId,
    request: UpdateTeamRequest,
) -> Result<ScoreboardView, ServiceError> {
    run(
        state,
        EngineCommand::UpdateTeam {
            team_id,
            patch: request.into(),
        },
    )
    .await
}

/// Replace the roster from CSV text.
pub async fn import_teams_csv(
    state: &SharedState,
    text: &str,
) -> Result<ScoreboardView, ServiceError> {
    let rows = import_service::parse_team_csv(text)?;
    info!(rows = rows.len(), "importing teams from CSV");
    run(state, EngineCommand::ImportTeams(rows)).await
}

/// Replace the roster from rows parsed by the client.
pub async fn import_teams_rows(
    state: &SharedState,
    request: ImportRowsRequest,
) -> Result<ScoreboardView, ServiceError> {
    info!(rows = request.rows.len(), "importing teams from rows");
    run(state, EngineCommand::ImportTeams(request.rows)).await
}

/// Step back to the previous score snapshot.
pub async fn undo(state: &SharedState) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::Undo).await
}

/// Re-apply the last undone score snapshot.
pub async fn redo(state: &SharedState) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::Redo).await
}

/// Zero every score of the active stage.
pub async fn reset_scores(state: &SharedState) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::ResetScores).await
}

/// Plan a move to the next or previous round.
pub async fn plan_round(
    state: &SharedState,
    event: RoundEvent,
) -> Result<RoundPlanResponse, ServiceError> {
    let outcome = state
        .engine()
        .dispatch(EngineCommand::PlanRoundChange(event))
        .await?;
    outcome
        .plan
        .as_ref()
        .map(RoundPlanResponse::from)
        .ok_or_else(|| ServiceError::Internal("round change planned without a plan".into()))
}

/// Confirm the pending round change.
pub async fn confirm_round(
    state: &SharedState,
    plan_id: PlanId,
) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::ConfirmRoundChange(plan_id)).await
}

/// Drop the pending round change.
pub async fn cancel_round(
    state: &SharedState,
    plan_id: PlanId,
) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::CancelRoundChange(plan_id)).await
}

/// Start, pause, or toggle the countdown.
pub async fn timer_command(
    state: &SharedState,
    command: EngineCommand,
) -> Result<ScoreboardView, ServiceError> {
    run(state, command).await
}

/// Stop and rewind the countdown.
pub async fn reset_timer(
    state: &SharedState,
    request: ResetTimerRequest,
) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::ResetTimer(request.seconds)).await
}

/// Change the configured countdown duration.
pub async fn set_timer_duration(
    state: &SharedState,
    seconds: u32,
) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::SetTimerDuration(seconds)).await
}

/// Turn a card of the current round.
pub async fn flip_card(state: &SharedState, card_id: u8) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::FlipCard(card_id)).await
}

/// Shuffle the unflipped cards.
pub async fn shuffle_cards(state: &SharedState) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::ShuffleCards).await
}

/// Close the question of the open card.
pub async fn close_question(state: &SharedState) -> Result<ScoreboardView, ServiceError> {
    run(state, EngineCommand::CloseQuestion).await
}

/// Forward a console key press to the shortcut machine.
pub async fn key_press(
    state: &SharedState,
    request: KeyPressRequest,
) -> Result<ScoreboardView, ServiceError> {
    run(
        state,
        EngineCommand::KeyPress(KeyInput {
            key: request.key,
            ctrl: request.ctrl,
        }),
    )
    .await
}

/// Save the active stage and load `stage`.
pub async fn switch_stage(
    state: &SharedState,
    stage: Stage,
) -> Result<ScoreboardView, ServiceError> {
    let snapshot = state.engine().switch_stage(stage).await?;
    let config = state.process().config().stage_config(snapshot.stage);
    Ok(ScoreboardView::new(&snapshot, &config))
}

/// Replace the question bank with rows parsed from CSV text.
pub async fn upload_questions(
    state: &SharedState,
    text: &str,
) -> Result<QuestionBankResponse, ServiceError> {
    let rows = import_service::parse_question_csv(text)?;
    let questions = rows.len();
    *state.questions().write().await = rows;
    info!(questions, "question bank replaced");
    Ok(QuestionBankResponse { questions })
}

/// Questions selected for the current session or round.
pub async fn current_questions(state: &SharedState) -> Result<QuestionsResponse, ServiceError> {
    let snapshot = state.snapshot();
    let config = state.stage_config();
    let bank = state.questions().read().await;

    let questions = match snapshot.stage {
        Stage::Semifinal => select_session_questions(&bank, snapshot.current_round),
        Stage::Final => {
            let round = config.round(snapshot.current_round).ok_or_else(|| {
                ServiceError::NotFound(format!("round {} is not defined", snapshot.current_round))
            })?;
            select_round_questions(&bank, round)?
        }
    };

    Ok(QuestionsResponse {
        stage: snapshot.stage,
        round: snapshot.current_round,
        title: snapshot.round_title.clone(),
        questions: questions.into_iter().map(QuestionView::from).collect(),
    })
}
