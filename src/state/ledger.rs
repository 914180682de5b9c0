use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::state::{
    error::EngineError,
    stage::{Category, FinalCategory, SESSION_SCORE_CAP, StageConfig},
    team::{StageFields, TeamId, TeamRegistry},
};

/// Direction of a scoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAction {
    /// Positive delta.
    Add,
    /// Zero or negative delta.
    Subtract,
}

impl ScoreAction {
    fn from_points(points: i64) -> Self {
        if points > 0 {
            ScoreAction::Add
        } else {
            ScoreAction::Subtract
        }
    }

    /// Label used in exported history sheets.
    pub fn label(self) -> &'static str {
        match self {
            ScoreAction::Add => "Tambah Skor",
            ScoreAction::Subtract => "Kurang Skor",
        }
    }
}

/// Immutable record of one score application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Monotonic sequence number inside the ledger, starting at 1.
    pub sequence: u64,
    /// Wall-clock time of the application.
    pub timestamp: SystemTime,
    /// Team that received the points.
    pub team_id: TeamId,
    /// Category affected.
    pub category: Category,
    /// Add or subtract.
    pub action: ScoreAction,
    /// Signed raw delta requested by the operator.
    pub points: i64,
    /// Team total immediately after the application.
    pub resulting_total: i64,
}

/// Append-only chronological record of scoring events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries, rejecting out-of-order sequences.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Result<Self, EngineError> {
        let ordered = entries
            .windows(2)
            .all(|pair| pair[0].sequence < pair[1].sequence);
        if !ordered {
            return Err(EngineError::CorruptSnapshot(
                "ledger sequence numbers are not increasing".into(),
            ));
        }
        Ok(Self { entries })
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries of a single team, oldest first.
    pub fn for_team(&self, team_id: TeamId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.team_id == team_id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_sequence(&self) -> u64 {
        self.entries.last().map_or(1, |entry| entry.sequence + 1)
    }

    fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }
}

/// Recompute a team total from its entries, flooring at zero after each one.
pub fn replay_total<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i64 {
    entries
        .into_iter()
        .fold(0, |total: i64, entry| total.saturating_add(entry.points).max(0))
}

/// Apply a signed delta to one category of a team.
///
/// Returns the next registry and ledger; the inputs are left untouched so a rejected
/// call never changes state.
pub fn apply_score(
    config: &StageConfig,
    registry: &TeamRegistry,
    ledger: &Ledger,
    team_id: TeamId,
    category: &str,
    delta: i64,
) -> Result<(TeamRegistry, Ledger), EngineError> {
    let category = config.parse_category(category)?;
    if registry.get(team_id).is_none() {
        return Err(EngineError::NotFound { team_id });
    }

    let mut next_registry = registry.clone();
    let mut next_ledger = ledger.clone();
    let sequence = next_ledger.next_sequence();

    let team = next_registry
        .get_mut(team_id)
        .ok_or(EngineError::NotFound { team_id })?;

    match (&mut team.fields, category) {
        (StageFields::Semifinal(fields), Category::Session(session)) => {
            let slot = fields
                .session_mut(session)
                .ok_or_else(|| EngineError::InvalidCategory {
                    category: category.label(),
                    stage: config.stage,
                })?;
            *slot = slot
                .checked_add(delta)
                .ok_or(EngineError::ScoreOverflow { team_id, delta })?
                .clamp(0, SESSION_SCORE_CAP);
        }
        (StageFields::Final(fields), Category::Final(kind)) => match kind {
            FinalCategory::Penalti => fields.penalties += 1,
            _ if delta <= 0 => {}
            FinalCategory::Wajib => fields.wajib += 1,
            FinalCategory::Lemparan => fields.lemparan += 1,
            FinalCategory::Rebutan => fields.rebutan += 1,
        },
        _ => {
            return Err(EngineError::InvalidCategory {
                category: category.label(),
                stage: config.stage,
            });
        }
    }

    team.score = team
        .score
        .checked_add(delta)
        .ok_or(EngineError::ScoreOverflow { team_id, delta })?
        .max(0);
    team.history.push(sequence);
    let resulting_total = team.score;

    next_ledger.append(LedgerEntry {
        sequence,
        timestamp: SystemTime::now(),
        team_id,
        category,
        action: ScoreAction::from_points(delta),
        points: delta,
        resulting_total,
    });
    next_registry.recompute_positions();

    Ok((next_registry, next_ledger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::team::FinalFields};

    fn setup(config: &StageConfig) -> (TeamRegistry, Ledger) {
        (
            TeamRegistry::create_default(config, &AppConfig::default()),
            Ledger::new(),
        )
    }

    fn apply(
        config: &StageConfig,
        state: (TeamRegistry, Ledger),
        team_id: TeamId,
        category: &str,
        delta: i64,
    ) -> (TeamRegistry, Ledger) {
        apply_score(config, &state.0, &state.1, team_id, category, delta).unwrap()
    }

    fn session1(registry: &TeamRegistry, team_id: TeamId) -> i64 {
        match registry.get(team_id).unwrap().fields {
            StageFields::Semifinal(fields) => fields.session1,
            StageFields::Final(_) => panic!("expected semifinal fields"),
        }
    }

    #[test]
    fn overflowing_delta_is_rejected_without_changes() {
        let config = StageConfig::final_stage();
        let state = apply(&config, setup(&config), 1, "wajib", i64::MAX);

        let err = apply_score(&config, &state.0, &state.1, 1, "wajib", 1).unwrap_err();

        assert_eq!(err, EngineError::ScoreOverflow { team_id: 1, delta: 1 });
        assert_eq!(state.0.get(1).unwrap().score, i64::MAX);
        assert_eq!(state.1.len(), 1);
    }

    #[test]
    fn session_clamps_but_total_does_not() {
        let config = StageConfig::semifinal();
        let state = apply(&config, setup(&config), 1, "session1", 60);

        assert_eq!(session1(&state.0, 1), 50);
        assert_eq!(state.0.get(1).unwrap().score, 60);
        assert_eq!(state.1.entries()[0].resulting_total, 60);
    }

    #[test]
    fn semifinal_scenario_floors_total_per_call() {
        let config = StageConfig::semifinal();
        let mut state = setup(&config);
        state = apply(&config, state, 3, "session1", 10);
        state = apply(&config, state, 3, "session1", 10);
        assert_eq!(session1(&state.0, 3), 20);
        assert_eq!(state.0.get(3).unwrap().score, 20);

        for _ in 0..3 {
            state = apply(&config, state, 3, "session1", -10);
        }
        assert_eq!(session1(&state.0, 3), 0);
        assert_eq!(state.0.get(3).unwrap().score, 0);

        let totals: Vec<i64> = state
            .1
            .for_team(3)
            .map(|entry| entry.resulting_total)
            .collect();
        assert_eq!(totals, vec![10, 20, 10, 0, 0]);
    }

    #[test]
    fn score_always_matches_replayed_ledger() {
        let config = StageConfig::final_stage();
        let mut state = setup(&config);
        let moves = [
            (1, "wajib", 100),
            (2, "rebutan", -50),
            (1, "penalti", -25),
            (3, "lemparan", 50),
            (1, "lemparan", -25),
            (2, "rebutan", 100),
            (1, "wajib", -200),
            (1, "wajib", 100),
        ];
        for (team_id, category, delta) in moves {
            state = apply(&config, state, team_id, category, delta);
            for team in state.0.iter() {
                assert_eq!(team.score, replay_total(state.1.for_team(team.id)));
            }
        }
        assert_eq!(state.1.len(), moves.len());
        let history = &state.0.get(1).unwrap().history;
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn final_counters_follow_category_rules() {
        let config = StageConfig::final_stage();
        let mut state = setup(&config);
        state = apply(&config, state, 2, "wajib", 100);
        state = apply(&config, state, 2, "wajib", -50);
        state = apply(&config, state, 2, "penalti", -25);
        state = apply(&config, state, 2, "penalti", 10);
        state = apply(&config, state, 2, "rebutan", 5);

        assert_eq!(
            state.0.get(2).unwrap().fields,
            StageFields::Final(FinalFields {
                wajib: 1,
                lemparan: 0,
                rebutan: 1,
                penalties: 2,
            })
        );
        assert_eq!(state.1.entries()[1].action, ScoreAction::Subtract);
    }

    #[test]
    fn rejected_calls_leave_inputs_untouched() {
        let config = StageConfig::semifinal();
        let (registry, ledger) = setup(&config);

        let err = apply_score(&config, &registry, &ledger, 99, "session1", 10).unwrap_err();
        assert_eq!(err, EngineError::NotFound { team_id: 99 });

        let err = apply_score(&config, &registry, &ledger, 1, "wajib", 10).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCategory { .. }));

        assert!(ledger.is_empty());
        assert_eq!(registry.get(1).unwrap().score, 0);
    }

    #[test]
    fn scoring_updates_positions() {
        let config = StageConfig::final_stage();
        let state = apply(&config, setup(&config), 4, "rebutan", 100);
        assert_eq!(state.0.get(4).unwrap().position, 0);
        assert_eq!(state.0.get(1).unwrap().position, 1);
    }
}
