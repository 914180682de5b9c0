//! Read projections of the engine snapshot shared by admin and public routes.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        cards::CardDeck,
        engine::{Awaiting, EngineSnapshot, TimerState},
        ledger::LedgerEntry,
        round::RoundChange,
        stage::{Stage, StageConfig},
        team::{StageFields, Team, TeamRegistry},
        timer::format_clock,
    },
};

/// One per-category value of a team.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryValue {
    /// Category label (`Sesi 1`, `Wajib`, ...).
    pub category: String,
    /// Session score or answer counter.
    pub value: i64,
}

/// Team as shown on the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamView {
    pub id: u32,
    pub name: String,
    pub school: String,
    pub color: String,
    pub score: i64,
    /// 1-based rank.
    pub rank: usize,
    pub categories: Vec<CategoryValue>,
}

impl From<&Team> for TeamView {
    fn from(team: &Team) -> Self {
        let categories = match team.fields {
            StageFields::Semifinal(fields) => (1..=3u8)
                .map(|session| CategoryValue {
                    category: format!("Sesi {session}"),
                    value: fields.session(session).unwrap_or_default(),
                })
                .collect(),
            StageFields::Final(fields) => [
                ("Wajib", fields.wajib),
                ("Lemparan", fields.lemparan),
                ("Rebutan", fields.rebutan),
                ("Penalti", fields.penalties),
            ]
            .into_iter()
            .map(|(category, value)| CategoryValue {
                category: category.into(),
                value: i64::from(value),
            })
            .collect(),
        };

        Self {
            id: team.id,
            name: team.name.clone(),
            school: team.school.clone(),
            color: team.color.clone(),
            score: team.score,
            rank: team.position + 1,
            categories,
        }
    }
}

/// Ledger entry as shown in the history list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerEntryView {
    pub sequence: u64,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub team_id: u32,
    /// Team name at the time of the read, empty when the team is gone.
    pub team_name: String,
    /// `Tambah Skor` or `Kurang Skor`.
    pub action: String,
    pub category: String,
    pub points: i64,
    pub new_total: i64,
}

impl LedgerEntryView {
    /// Project an entry, resolving the team name through `teams`.
    pub fn new(entry: &LedgerEntry, teams: &TeamRegistry) -> Self {
        Self {
            sequence: entry.sequence,
            timestamp: format_system_time(entry.timestamp),
            team_id: entry.team_id,
            team_name: teams
                .get(entry.team_id)
                .map(|team| team.name.clone())
                .unwrap_or_default(),
            action: entry.action.label().into(),
            category: entry.category.label(),
            points: entry.points,
            new_total: entry.resulting_total,
        }
    }
}

/// Countdown values.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimerView {
    pub remaining: u32,
    pub running: bool,
    pub configured_duration: u32,
    /// Duration applied at the next reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_duration: Option<u32>,
    pub expired: bool,
    /// `MM:SS` rendering of `remaining`.
    pub display: String,
}

impl From<&TimerState> for TimerView {
    fn from(timer: &TimerState) -> Self {
        Self {
            remaining: timer.remaining,
            running: timer.running,
            configured_duration: timer.configured_duration,
            pending_duration: timer.pending_duration,
            expired: timer.expired,
            display: format_clock(timer.remaining),
        }
    }
}

/// Round change waiting for confirmation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingRoundView {
    pub plan_id: Uuid,
    pub to: u8,
    /// Confirming wipes every score and restarts at round 1.
    pub new_round: bool,
}

/// Round progression of the active stage.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundView {
    pub stage: Stage,
    pub current_round: u8,
    pub round_count: u8,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingRoundView>,
}

impl RoundView {
    /// Project the round fields of `snapshot`.
    pub fn new(snapshot: &EngineSnapshot, config: &StageConfig) -> Self {
        Self {
            stage: snapshot.stage,
            current_round: snapshot.current_round,
            round_count: config.round_count(),
            title: snapshot.round_title.clone(),
            pending: snapshot.pending_round.map(|pending| PendingRoundView {
                plan_id: pending.plan_id,
                to: pending.to,
                new_round: pending.change == RoundChange::NewRound,
            }),
        }
    }
}

/// One card of the deck.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CardView {
    pub id: u8,
    pub category: String,
    pub flipped: bool,
}

/// Card deck of the current final round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeckView {
    pub round: u8,
    pub cards: Vec<CardView>,
    pub flip_history: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_card: Option<u8>,
}

impl From<&CardDeck> for DeckView {
    fn from(deck: &CardDeck) -> Self {
        Self {
            round: deck.round(),
            cards: deck
                .cards()
                .iter()
                .map(|card| CardView {
                    id: card.id,
                    category: card.category.clone(),
                    flipped: card.flipped,
                })
                .collect(),
            flip_history: deck.flip_history().to_vec(),
            open_card: deck.open_card(),
        }
    }
}

/// Full scoreboard as rendered by the console and the audience view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardView {
    pub stage: Stage,
    /// Teams ranked by score, leader first.
    pub teams: Vec<TeamView>,
    pub round: RoundView,
    pub timer: TimerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<DeckView>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Team picked by a digit shortcut, waiting for the action key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_team: Option<u32>,
}

impl ScoreboardView {
    /// Project `snapshot` for display.
    pub fn new(snapshot: &EngineSnapshot, config: &StageConfig) -> Self {
        Self {
            stage: snapshot.stage,
            teams: snapshot
                .teams
                .ranked()
                .into_iter()
                .map(TeamView::from)
                .collect(),
            round: RoundView::new(snapshot, config),
            timer: TimerView::from(&snapshot.timer),
            cards: snapshot.cards.as_ref().map(DeckView::from),
            can_undo: !snapshot.undo_stack.is_empty(),
            can_redo: !snapshot.redo_stack.is_empty(),
            selected_team: match snapshot.awaiting {
                Awaiting::TeamSelected(team_id) => Some(team_id),
                Awaiting::None => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        state::engine::{EngineCommand, ScoreboardEngine},
    };

    #[test]
    fn scoreboard_lists_teams_by_rank() {
        let mut engine = ScoreboardEngine::new(StageConfig::final_stage(), &AppConfig::default());
        engine
            .handle(EngineCommand::ApplyScore {
                team_id: 4,
                category: "rebutan".into(),
                delta: 100,
            })
            .unwrap();

        let view = ScoreboardView::new(&engine.snapshot(), engine.config());
        assert_eq!(view.teams[0].id, 4);
        assert_eq!(view.teams[0].rank, 1);
        assert_eq!(view.teams[0].categories[2].category, "Rebutan");
        assert_eq!(view.teams[0].categories[2].value, 1);
        assert_eq!(view.round.round_count, 5);
        assert_eq!(view.round.title, "Sejarah");
        assert_eq!(view.timer.display, "00:10");
        assert!(view.can_undo);
        assert_eq!(view.cards.unwrap().cards.len(), 5);
    }

    #[test]
    fn ledger_entry_resolves_team_name() {
        let mut engine = ScoreboardEngine::new(StageConfig::semifinal(), &AppConfig::default());
        engine
            .handle(EngineCommand::ApplyScore {
                team_id: 2,
                category: "Sesi 1".into(),
                delta: -5,
            })
            .unwrap();

        let entry = &engine.ledger().entries()[0];
        let view = LedgerEntryView::new(entry, engine.teams());
        assert_eq!(view.team_name, "Tim 2");
        assert_eq!(view.action, "Kurang Skor");
        assert_eq!(view.category, "Sesi 1");
        assert_eq!(view.new_total, 0);
    }
}
