//! Question-bank filtering for the active session or round.

use serde::Deserialize;

use crate::state::{cards::CARDS_PER_ROUND, error::EngineError, stage::RoundConfig};

/// Questions shown for one semifinal session.
pub const SESSION_QUESTION_LIMIT: usize = 10;

/// One row of the question bank as read from a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuestionRow {
    /// Semifinal session the question belongs to.
    #[serde(default)]
    pub session: Option<String>,
    /// Final-stage round the question belongs to.
    #[serde(default)]
    pub round: Option<String>,
    /// Final-stage category.
    #[serde(default)]
    pub category: Option<String>,
    /// Question text.
    #[serde(default)]
    pub question: String,
    /// Expected answer.
    #[serde(default)]
    pub answer: String,
    /// Optional explanation shown after the answer.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Semifinal predicate: same session number and both question and answer present.
pub fn matches_session(row: &QuestionRow, session: u8) -> bool {
    let same_session = row
        .session
        .as_deref()
        .is_some_and(|value| value.trim() == session.to_string());
    same_session && !row.question.is_empty() && !row.answer.is_empty()
}

/// Final-stage predicate: same round number and case-insensitive category.
pub fn matches_round(row: &QuestionRow, round: u8, category: &str) -> bool {
    let same_round = row
        .round
        .as_deref()
        .is_some_and(|value| value.trim() == round.to_string());
    let same_category = row
        .category
        .as_deref()
        .is_some_and(|value| value.trim().to_lowercase() == category.trim().to_lowercase());
    same_round && same_category
}

/// Questions of a semifinal session, in bank order, at most [`SESSION_QUESTION_LIMIT`].
pub fn select_session_questions(rows: &[QuestionRow], session: u8) -> Vec<&QuestionRow> {
    rows.iter()
        .filter(|row| matches_session(row, session))
        .take(SESSION_QUESTION_LIMIT)
        .collect()
}

/// One question per card of a final round, honouring the round's quota table.
pub fn select_round_questions<'a>(
    rows: &'a [QuestionRow],
    round: &RoundConfig,
) -> Result<Vec<&'a QuestionRow>, EngineError> {
    let mut selected = Vec::with_capacity(CARDS_PER_ROUND);
    for (category, quota) in &round.quotas {
        selected.extend(
            rows.iter()
                .filter(|row| matches_round(row, round.number, category))
                .take(*quota),
        );
    }

    if selected.len() < CARDS_PER_ROUND {
        return Err(EngineError::InsufficientQuestions {
            round: round.number,
            needed: CARDS_PER_ROUND,
            found: selected.len(),
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::stage::StageConfig;

    fn final_row(round: &str, category: &str, question: &str) -> QuestionRow {
        QuestionRow {
            round: Some(round.into()),
            category: Some(category.into()),
            question: question.into(),
            answer: "jawaban".into(),
            ..QuestionRow::default()
        }
    }

    #[test]
    fn session_selection_stops_at_limit() {
        let bank: Vec<QuestionRow> = (1..=12)
            .map(|n| QuestionRow {
                session: Some("1".into()),
                question: format!("Soal {n}"),
                answer: "jawaban".into(),
                ..QuestionRow::default()
            })
            .collect();

        let selected = select_session_questions(&bank, 1);

        assert_eq!(selected.len(), SESSION_QUESTION_LIMIT);
        assert_eq!(selected[0].question, "Soal 1");
        assert_eq!(selected[9].question, "Soal 10");
    }

    #[test]
    fn session_predicate_trims_and_requires_answer() {
        let row = QuestionRow {
            session: Some(" 2 ".into()),
            question: "Ibu kota?".into(),
            answer: "Jakarta".into(),
            ..QuestionRow::default()
        };
        assert!(matches_session(&row, 2));
        assert!(!matches_session(&row, 1));

        let unanswered = QuestionRow {
            answer: String::new(),
            ..row
        };
        assert!(!matches_session(&unanswered, 2));
    }

    #[test]
    fn round_predicate_ignores_category_case() {
        let row = final_row("3", "  PENJASKES ", "q");
        assert!(matches_round(&row, 3, "Penjaskes"));
        assert!(!matches_round(&row, 2, "Penjaskes"));
        assert!(!matches_round(&row, 3, "IPA"));
    }

    #[test]
    fn mixed_round_uses_quotas() {
        let config = StageConfig::final_stage();
        let rows = vec![
            final_row("5", "informatika", "i1"),
            final_row("5", "informatika", "i2"),
            final_row("5", "informatika", "i3"),
            final_row("5", "ipa", "p1"),
            final_row("5", "sejarah", "s1"),
            final_row("5", "penjaskes", "o1"),
            final_row("4", "ipa", "other"),
        ];
        let selected = select_round_questions(&rows, config.round(5).unwrap()).unwrap();
        let questions: Vec<&str> = selected.iter().map(|row| row.question.as_str()).collect();
        assert_eq!(questions, vec!["i1", "i2", "p1", "s1", "o1"]);
    }

    #[test]
    fn short_bank_is_reported() {
        let config = StageConfig::final_stage();
        let rows = vec![final_row("1", "sejarah", "s1")];
        let err = select_round_questions(&rows, config.round(1).unwrap()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientQuestions {
                round: 1,
                needed: 5,
                found: 1,
            }
        );
    }
}
