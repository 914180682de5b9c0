use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::{
    cards::CardDeck,
    engine::{Awaiting, EngineSnapshot, ScoreSnapshot, TimerState},
    error::EngineError,
    ledger::{Ledger, LedgerEntry, ScoreAction},
    stage::{Category, Stage},
    team::{StageFields, Team, TeamRegistry},
};

/// Persisted blob of one stage, stored under [`Stage::storage_key`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntity {
    /// Stage the blob belongs to.
    pub stage: Stage,
    /// Teams in registration order.
    pub teams: Vec<TeamEntity>,
    /// 1-based session or round.
    pub current_round: u8,
    /// Seconds left on the countdown.
    pub timer: u32,
    /// Whether the countdown was running.
    pub timer_running: bool,
    /// Duration restored on reset.
    pub configured_duration: u32,
    /// Chronological score history.
    pub score_history: Vec<LedgerEntryEntity>,
    /// Undo stack, oldest first.
    #[serde(default)]
    pub undo_stack: Vec<ScoreSnapshotEntity>,
    /// Redo stack, oldest first.
    #[serde(default)]
    pub redo_stack: Vec<ScoreSnapshotEntity>,
    /// Card deck of the current final round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<CardDeck>,
}

/// Team as stored in a blob; stage fields are flattened into the object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamEntity {
    /// Stable identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// School.
    pub school: String,
    /// Accent color.
    pub color: String,
    /// Running total.
    pub score: i64,
    /// Session scores or category counters.
    #[serde(flatten)]
    pub fields: StageFields,
    /// Ledger sequence numbers of the team.
    #[serde(default)]
    pub history: Vec<u64>,
    /// Rank index at save time.
    #[serde(default)]
    pub position: usize,
}

/// Ledger entry as stored in a blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryEntity {
    /// Sequence number inside the ledger.
    pub sequence: u64,
    /// Time of the application, as an RFC3339 string.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Team that received the points.
    pub team_id: u32,
    /// Add or subtract.
    pub action: ScoreAction,
    /// Category label.
    pub category: Category,
    /// Signed delta.
    pub points: i64,
    /// Team total after the application.
    pub new_total: i64,
}

/// Undo/redo entry as stored in a blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshotEntity {
    /// Teams at that instant.
    pub teams: Vec<TeamEntity>,
    /// Score history at that instant.
    pub score_history: Vec<LedgerEntryEntity>,
}

impl From<&Team> for TeamEntity {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            school: team.school.clone(),
            color: team.color.clone(),
            score: team.score,
            fields: team.fields,
            history: team.history.clone(),
            position: team.position,
        }
    }
}

impl From<TeamEntity> for Team {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            school: entity.school,
            color: entity.color,
            score: entity.score,
            fields: entity.fields,
            history: entity.history,
            position: entity.position,
        }
    }
}

impl From<&LedgerEntry> for LedgerEntryEntity {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            sequence: entry.sequence,
            timestamp: OffsetDateTime::from(entry.timestamp),
            team_id: entry.team_id,
            action: entry.action,
            category: entry.category,
            points: entry.points,
            new_total: entry.resulting_total,
        }
    }
}

impl From<LedgerEntryEntity> for LedgerEntry {
    fn from(entity: LedgerEntryEntity) -> Self {
        Self {
            sequence: entity.sequence,
            timestamp: entity.timestamp.into(),
            team_id: entity.team_id,
            category: entity.category,
            action: entity.action,
            points: entity.points,
            resulting_total: entity.new_total,
        }
    }
}

impl From<&ScoreSnapshot> for ScoreSnapshotEntity {
    fn from(snapshot: &ScoreSnapshot) -> Self {
        Self {
            teams: snapshot.teams.iter().map(TeamEntity::from).collect(),
            score_history: snapshot
                .ledger
                .entries()
                .iter()
                .map(LedgerEntryEntity::from)
                .collect(),
        }
    }
}

impl TryFrom<ScoreSnapshotEntity> for ScoreSnapshot {
    type Error = EngineError;

    fn try_from(entity: ScoreSnapshotEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            teams: registry_from(entity.teams)?,
            ledger: Ledger::from_entries(
                entity.score_history.into_iter().map(Into::into).collect(),
            )?,
        })
    }
}

impl From<&EngineSnapshot> for ScoreboardEntity {
    fn from(snapshot: &EngineSnapshot) -> Self {
        Self {
            stage: snapshot.stage,
            teams: snapshot.teams.iter().map(TeamEntity::from).collect(),
            current_round: snapshot.current_round,
            timer: snapshot.timer.remaining,
            timer_running: snapshot.timer.running,
            configured_duration: snapshot.timer.configured_duration,
            score_history: snapshot
                .ledger
                .entries()
                .iter()
                .map(LedgerEntryEntity::from)
                .collect(),
            undo_stack: snapshot
                .undo_stack
                .iter()
                .map(ScoreSnapshotEntity::from)
                .collect(),
            redo_stack: snapshot
                .redo_stack
                .iter()
                .map(ScoreSnapshotEntity::from)
                .collect(),
            cards: snapshot.cards.clone(),
        }
    }
}

impl TryFrom<ScoreboardEntity> for EngineSnapshot {
    type Error = EngineError;

    fn try_from(entity: ScoreboardEntity) -> Result<Self, Self::Error> {
        let convert_stack = |stack: Vec<ScoreSnapshotEntity>| {
            stack
                .into_iter()
                .map(ScoreSnapshot::try_from)
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            stage: entity.stage,
            teams: registry_from(entity.teams)?,
            ledger: Ledger::from_entries(
                entity.score_history.into_iter().map(Into::into).collect(),
            )?,
            current_round: entity.current_round,
            round_title: String::new(),
            pending_round: None,
            timer: TimerState {
                remaining: entity.timer,
                running: entity.timer_running,
                configured_duration: entity.configured_duration,
                pending_duration: None,
                generation: 0,
                expired: entity.timer == 0,
            },
            undo_stack: convert_stack(entity.undo_stack)?,
            redo_stack: convert_stack(entity.redo_stack)?,
            cards: entity.cards,
            awaiting: Awaiting::None,
        })
    }
}

fn registry_from(teams: Vec<TeamEntity>) -> Result<TeamRegistry, EngineError> {
    let count = teams.len();
    let registry = TeamRegistry::from_teams(teams.into_iter().map(Team::from).collect());
    if registry.len() != count {
        return Err(EngineError::CorruptSnapshot("duplicate team ids".into()));
    }
    Ok(registry)
}
