//! DTO definitions for read-only audience routes and the question bank.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::common::LedgerEntryView,
    state::{questions::QuestionRow, stage::Stage},
};

/// Chronological score history of the active stage.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    pub stage: Stage,
    pub entries: Vec<LedgerEntryView>,
}

/// Question drawn from the bank.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl From<&QuestionRow> for QuestionView {
    fn from(row: &QuestionRow) -> Self {
        Self {
            category: row.category.clone(),
            question: row.question.clone(),
            answer: row.answer.clone(),
            explanation: row.explanation.clone(),
        }
    }
}

/// Questions selected for the current session or round.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsResponse {
    pub stage: Stage,
    pub round: u8,
    pub title: String,
    pub questions: Vec<QuestionView>,
}
