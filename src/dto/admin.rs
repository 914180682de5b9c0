//! DTO definitions used by the operator console REST API and documentation layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::{validate_color, validate_not_blank},
    state::{
        round::{Plan, RoundChange},
        stage::Stage,
        team::TeamPatch,
    },
};

/// Request to add a signed delta to one category of a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScoreRequest {
    pub team_id: u32,
    /// Category name (`session1`, `Sesi 2`, `wajib`, `Penalti`, ...).
    #[validate(length(min = 1, max = 32))]
    pub category: String,
    #[validate(range(min = -10000, max = 10000))]
    pub delta: i64,
}

/// Request to edit a team's display fields; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(max = 80), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 120), custom(function = "validate_not_blank"))]
    pub school: Option<String>,
    #[validate(custom(function = "validate_color"))]
    pub color: Option<String>,
}

impl From<UpdateTeamRequest> for TeamPatch {
    fn from(request: UpdateTeamRequest) -> Self {
        Self {
            name: request.name.map(|name| name.trim().to_string()),
            school: request.school.map(|school| school.trim().to_string()),
            color: request.color.map(|color| color.to_lowercase()),
        }
    }
}

/// Team rows already parsed by the client, keyed by column header.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ImportRowsRequest {
    #[validate(length(min = 1))]
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<IndexMap<String, String>>,
}

/// Request to change the configured countdown duration.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TimerDurationRequest {
    #[validate(range(min = 1, max = 3600))]
    pub seconds: u32,
}

/// Optional body of the timer reset route.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct ResetTimerRequest {
    #[validate(range(min = 1, max = 3600))]
    pub seconds: Option<u32>,
}

/// Raw key press captured by the console.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct KeyPressRequest {
    /// Key value as reported by the browser (`"1"`, `"q"`, `" "`).
    #[validate(length(min = 1, max = 16))]
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
}

/// Request to switch the active stage.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StageRequest {
    pub stage: Stage,
}

/// Planned round change returned by the advance and retreat routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundPlanResponse {
    pub plan_id: Uuid,
    pub from: u8,
    pub to: u8,
    /// Confirming wipes every score and restarts at round 1.
    pub new_round: bool,
}

impl From<&Plan> for RoundPlanResponse {
    fn from(plan: &Plan) -> Self {
        Self {
            plan_id: plan.id,
            from: plan.from.number(),
            to: plan.to.number(),
            new_round: plan.change == RoundChange::NewRound,
        }
    }
}

/// Number of rows accepted by the question bank upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionBankResponse {
    pub questions: usize,
}
