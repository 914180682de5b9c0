//! Stage configuration: which scoring categories, rounds, and shortcuts a tournament stage uses.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{
    error::EngineError,
    team::{FinalFields, SemifinalFields, StageFields},
};

/// Number of sessions played in the semifinal stage.
pub const SEMIFINAL_SESSIONS: u8 = 3;
/// Upper bound applied to a single semifinal session score.
pub const SESSION_SCORE_CAP: i64 = 50;
/// Number of thematic rounds played in the final stage.
pub const FINAL_ROUNDS: u8 = 5;

/// Tournament phase with its own team count and scoring categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Eight teams, three sessions, per-session scores capped at 50.
    Semifinal,
    /// Five teams, five thematic rounds, answer counters per category.
    Final,
}

impl Stage {
    /// Key under which the stage's blob lives in the persistent store.
    pub fn storage_key(self) -> &'static str {
        match self {
            Stage::Semifinal => "scoreboardSemifinalData",
            Stage::Final => "scoreboardFinalData",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Semifinal => f.write_str("semifinal"),
            Stage::Final => f.write_str("final"),
        }
    }
}

/// Scoring dimension of the final stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalCategory {
    /// Mandatory question addressed to one team.
    Wajib,
    /// Question thrown to the other teams after a miss.
    Lemparan,
    /// Open buzzer question.
    Rebutan,
    /// Penalty applied by the jury.
    Penalti,
}

impl FinalCategory {
    const ALL: [FinalCategory; 4] = [
        FinalCategory::Wajib,
        FinalCategory::Lemparan,
        FinalCategory::Rebutan,
        FinalCategory::Penalti,
    ];

    /// Display label used in history rows and exports.
    pub fn label(self) -> &'static str {
        match self {
            FinalCategory::Wajib => "Wajib",
            FinalCategory::Lemparan => "Lemparan",
            FinalCategory::Rebutan => "Rebutan",
            FinalCategory::Penalti => "Penalti",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "wajib" => Some(FinalCategory::Wajib),
            "lemparan" => Some(FinalCategory::Lemparan),
            "rebutan" => Some(FinalCategory::Rebutan),
            "penalti" | "penalty" | "penalties" => Some(FinalCategory::Penalti),
            _ => None,
        }
    }
}

/// Score field affected by a ledger entry.
///
/// Serialized as its display label (`"Sesi 2"`, `"Rebutan"`) so persisted blobs and
/// exports stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Category {
    /// One of the semifinal sessions (1-based).
    Session(u8),
    /// One of the final-stage categories.
    Final(FinalCategory),
}

impl Category {
    /// Stage the category belongs to.
    pub fn stage(self) -> Stage {
        match self {
            Category::Session(_) => Stage::Semifinal,
            Category::Final(_) => Stage::Final,
        }
    }

    /// Human readable label (`Sesi 1`, `Wajib`, ...).
    pub fn label(self) -> String {
        match self {
            Category::Session(number) => format!("Sesi {number}"),
            Category::Final(category) => category.label().to_string(),
        }
    }

    /// Parse any accepted spelling, regardless of stage.
    fn parse_any(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if let Some(category) = FinalCategory::parse(&normalized) {
            return Some(Category::Final(category));
        }

        let digits = ["session", "sesi"]
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix))
            .unwrap_or(&normalized)
            .trim();
        match digits.parse::<u8>() {
            Ok(number) if (1..=SEMIFINAL_SESSIONS).contains(&number) => {
                Some(Category::Session(number))
            }
            _ => None,
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label()
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::parse_any(&value).ok_or_else(|| format!("unknown score category `{value}`"))
    }
}

/// Keyboard shortcut bound to a scoring action once a team has been selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    /// Lowercase key that triggers the action.
    pub key: char,
    /// Category receiving the points.
    pub category: Category,
    /// Signed delta applied.
    pub delta: i64,
}

/// Static description of one round or session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundConfig {
    /// 1-based round number.
    pub number: u8,
    /// Title shown on the audience views.
    pub title: String,
    /// Question categories drawn for the round with their count, in card order.
    pub quotas: Vec<(String, usize)>,
}

impl RoundConfig {
    fn single(number: u8, title: &str, quota: usize) -> Self {
        Self {
            number,
            title: title.to_string(),
            quotas: vec![(title.to_string(), quota)],
        }
    }

    /// Card categories in deck order, expanded from the quota table.
    pub fn card_categories(&self) -> Vec<String> {
        self.quotas
            .iter()
            .flat_map(|(category, count)| std::iter::repeat_n(category.clone(), *count))
            .collect()
    }
}

/// Full configuration of a stage: teams, timer, rounds, and shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Stage this configuration describes.
    pub stage: Stage,
    /// Number of teams generated by default.
    pub team_count: usize,
    /// Countdown duration restored on reset.
    pub timer_seconds: u32,
    /// Ordered rounds (or sessions) of the stage.
    pub rounds: Vec<RoundConfig>,
    /// Second-key bindings of the two-stage keyboard input.
    pub shortcuts: Vec<Shortcut>,
}

impl StageConfig {
    /// Default configuration for the given stage.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Semifinal => Self::semifinal(),
            Stage::Final => Self::final_stage(),
        }
    }

    /// Eight teams, 15 second countdown, three sessions.
    pub fn semifinal() -> Self {
        Self {
            stage: Stage::Semifinal,
            team_count: 8,
            timer_seconds: 15,
            rounds: (1..=SEMIFINAL_SESSIONS)
                .map(|number| RoundConfig {
                    number,
                    title: format!("Sesi {number}"),
                    quotas: Vec::new(),
                })
                .collect(),
            shortcuts: Vec::new(),
        }
    }

    /// Five teams, 10 second countdown, five thematic rounds of five cards.
    pub fn final_stage() -> Self {
        let shortcut = |key, category, delta| Shortcut {
            key,
            category: Category::Final(category),
            delta,
        };
        Self {
            stage: Stage::Final,
            team_count: 5,
            timer_seconds: 10,
            rounds: vec![
                RoundConfig::single(1, "Sejarah", 5),
                RoundConfig::single(2, "IPA", 5),
                RoundConfig::single(3, "Penjaskes", 5),
                RoundConfig::single(4, "Informatika", 5),
                RoundConfig {
                    number: FINAL_ROUNDS,
                    title: "Campuran".to_string(),
                    quotas: vec![
                        ("Informatika".to_string(), 2),
                        ("IPA".to_string(), 1),
                        ("Sejarah".to_string(), 1),
                        ("Penjaskes".to_string(), 1),
                    ],
                },
            ],
            shortcuts: vec![
                shortcut('q', FinalCategory::Wajib, 100),
                shortcut('w', FinalCategory::Lemparan, 50),
                shortcut('e', FinalCategory::Lemparan, -25),
                shortcut('a', FinalCategory::Rebutan, 100),
                shortcut('s', FinalCategory::Rebutan, -50),
                shortcut('d', FinalCategory::Penalti, -25),
            ],
        }
    }

    /// Number of rounds (sessions for the semifinal).
    pub fn round_count(&self) -> u8 {
        self.rounds.len() as u8
    }

    /// Look up a round by its 1-based number.
    pub fn round(&self, number: u8) -> Option<&RoundConfig> {
        self.rounds.iter().find(|round| round.number == number)
    }

    /// Whether the final-stage card deck is part of this stage.
    pub fn uses_cards(&self) -> bool {
        self.stage == Stage::Final
    }

    /// Categories accepted by the stage, in export column order.
    pub fn categories(&self) -> Vec<Category> {
        match self.stage {
            Stage::Semifinal => (1..=SEMIFINAL_SESSIONS).map(Category::Session).collect(),
            Stage::Final => FinalCategory::ALL.into_iter().map(Category::Final).collect(),
        }
    }

    /// Parse an operator-supplied category name for this stage.
    pub fn parse_category(&self, raw: &str) -> Result<Category, EngineError> {
        Category::parse_any(raw)
            .filter(|category| category.stage() == self.stage)
            .ok_or_else(|| EngineError::InvalidCategory {
                category: raw.to_string(),
                stage: self.stage,
            })
    }

    /// Shortcut bound to `key`, if any.
    pub fn shortcut(&self, key: char) -> Option<&Shortcut> {
        let key = key.to_ascii_lowercase();
        self.shortcuts.iter().find(|shortcut| shortcut.key == key)
    }

    /// Zeroed score fields matching the stage.
    pub fn empty_fields(&self) -> StageFields {
        match self.stage {
            Stage::Semifinal => StageFields::Semifinal(SemifinalFields::default()),
            Stage::Final => StageFields::Final(FinalFields::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_spellings() {
        let config = StageConfig::semifinal();
        for raw in ["session1", "Session 2", "sesi 3", "1", " SESI 2 "] {
            assert!(config.parse_category(raw).is_ok(), "{raw} should parse");
        }
        assert_eq!(
            config.parse_category("Session 2").unwrap(),
            Category::Session(2)
        );
    }

    #[test]
    fn rejects_categories_from_other_stage() {
        let semifinal = StageConfig::semifinal();
        let final_stage = StageConfig::final_stage();

        assert!(matches!(
            semifinal.parse_category("wajib"),
            Err(EngineError::InvalidCategory { stage: Stage::Semifinal, .. })
        ));
        assert!(matches!(
            final_stage.parse_category("session1"),
            Err(EngineError::InvalidCategory { stage: Stage::Final, .. })
        ));
        assert!(semifinal.parse_category("session4").is_err());
    }

    #[test]
    fn penalty_aliases_map_to_penalti() {
        let config = StageConfig::final_stage();
        for raw in ["Penalti", "penalty", "PENALTIES"] {
            assert_eq!(
                config.parse_category(raw).unwrap(),
                Category::Final(FinalCategory::Penalti)
            );
        }
    }

    #[test]
    fn mixed_round_expands_quota_table() {
        let config = StageConfig::final_stage();
        let mixed = config.round(5).unwrap();
        assert_eq!(
            mixed.card_categories(),
            vec!["Informatika", "Informatika", "IPA", "Sejarah", "Penjaskes"]
        );
        assert_eq!(config.round(2).unwrap().card_categories(), vec!["IPA"; 5]);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Session(2)).unwrap();
        assert_eq!(json, "\"Sesi 2\"");
        let back: Category = serde_json::from_str("\"Rebutan\"").unwrap();
        assert_eq!(back, Category::Final(FinalCategory::Rebutan));
    }
}
