use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    state::{
        error::EngineError,
        stage::{SEMIFINAL_SESSIONS, SESSION_SCORE_CAP, StageConfig},
        tabular::{self, TeamRow},
    },
};

/// Identifier of a team, unique inside a registry and never reused.
pub type TeamId = u32;

/// Per-session scores of a semifinal team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemifinalFields {
    /// Session 1 score, clamped to `[0, 50]`.
    pub session1: i64,
    /// Session 2 score, clamped to `[0, 50]`.
    pub session2: i64,
    /// Session 3 score, clamped to `[0, 50]`.
    pub session3: i64,
}

impl SemifinalFields {
    /// Score of a 1-based session.
    pub fn session(&self, number: u8) -> Option<i64> {
        match number {
            1 => Some(self.session1),
            2 => Some(self.session2),
            3 => Some(self.session3),
            _ => None,
        }
    }

    pub(crate) fn session_mut(&mut self, number: u8) -> Option<&mut i64> {
        match number {
            1 => Some(&mut self.session1),
            2 => Some(&mut self.session2),
            3 => Some(&mut self.session3),
            _ => None,
        }
    }
}

/// Correct-answer counters of a final-stage team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalFields {
    /// Mandatory questions answered.
    pub wajib: u32,
    /// Thrown questions answered.
    pub lemparan: u32,
    /// Buzzer questions answered.
    pub rebutan: u32,
    /// Penalties received.
    pub penalties: u32,
}

/// Stage-specific score fields carried by a team.
///
/// Untagged so the fields flatten into the team object of the persisted blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageFields {
    /// Semifinal session scores.
    Semifinal(SemifinalFields),
    /// Final-stage category counters.
    Final(FinalFields),
}

/// A competing team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Stable identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// School the team represents.
    pub school: String,
    /// Accent color as `#RRGGBB`.
    pub color: String,
    /// Running total, floored at zero on every application.
    pub score: i64,
    /// Stage-specific score breakdown.
    pub fields: StageFields,
    /// Ledger sequence numbers belonging to this team, oldest first.
    pub history: Vec<u64>,
    /// Rank index derived from the score order (0 is the leader).
    pub position: usize,
}

impl Team {
    fn placeholder(id: TeamId, index: usize, config: &StageConfig, color: String) -> Self {
        Self {
            id,
            name: format!("Tim {}", index + 1),
            school: format!("Sekolah {}", index + 1),
            color,
            score: 0,
            fields: config.empty_fields(),
            history: Vec::new(),
            position: index,
        }
    }

    fn clear_scores(&mut self, config: &StageConfig) {
        self.score = 0;
        self.fields = config.empty_fields();
        self.history.clear();
    }
}

/// Operator edit of a team's display attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPatch {
    /// New display name.
    pub name: Option<String>,
    /// New school.
    pub school: Option<String>,
    /// New accent color.
    pub color: Option<String>,
}

/// Ordered set of teams keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRegistry {
    teams: IndexMap<TeamId, Team>,
    next_id: TeamId,
}

impl TeamRegistry {
    /// Generate the stage's default roster with distinct palette colors.
    pub fn create_default(config: &StageConfig, app_config: &AppConfig) -> Self {
        let mut used = Vec::with_capacity(config.team_count);
        let teams = (0..config.team_count)
            .map(|index| {
                let color = app_config.first_unused_color(&used);
                used.push(color.clone());
                Team::placeholder(index as TeamId + 1, index, config, color)
            })
            .collect();
        Self::from_teams(teams)
    }

    /// Build a registry from already validated teams, keeping their order.
    pub fn from_teams(teams: Vec<Team>) -> Self {
        let next_id = teams.iter().map(|team| team.id).max().unwrap_or(0) + 1;
        Self {
            teams: teams.into_iter().map(|team| (team.id, team)).collect(),
            next_id,
        }
    }

    /// Replace the roster with teams read from tabular rows.
    ///
    /// Ids restart at 1 and every score is zero. Rows without a name or school receive
    /// placeholders instead of failing the import.
    pub fn import_from(rows: &[TeamRow], config: &StageConfig) -> Result<Self, EngineError> {
        if rows.is_empty() {
            return Err(EngineError::ImportEmpty);
        }
        let teams = tabular::rows_to_teams(rows, config, &mut rand::rng());
        let mut registry = Self::from_teams(teams);
        registry.recompute_positions();
        Ok(registry)
    }

    /// Look up a team by id.
    pub fn get(&self, team_id: TeamId) -> Option<&Team> {
        self.teams.get(&team_id)
    }

    pub(crate) fn get_mut(&mut self, team_id: TeamId) -> Option<&mut Team> {
        self.teams.get_mut(&team_id)
    }

    /// Teams in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// Number of registered teams.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the registry holds no team.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Id that the next created team would receive.
    pub fn next_id(&self) -> TeamId {
        self.next_id
    }

    /// Return a new registry with the patched display attributes.
    pub fn update(&self, team_id: TeamId, patch: TeamPatch) -> Result<Self, EngineError> {
        let mut next = self.clone();
        let team = next
            .teams
            .get_mut(&team_id)
            .ok_or(EngineError::NotFound { team_id })?;

        if let Some(name) = patch.name {
            team.name = name;
        }
        if let Some(school) = patch.school {
            team.school = school;
        }
        if let Some(color) = patch.color {
            team.color = color;
        }
        Ok(next)
    }

    /// Teams sorted by score, leader first.
    ///
    /// Ties keep their previous rank order so repeated calls are stable.
    pub fn ranked(&self) -> Vec<&Team> {
        let mut by_position: Vec<&Team> = self.teams.values().collect();
        by_position.sort_by_key(|team| team.position);
        order_by_score_desc(&by_position)
    }

    /// Team currently ranked at `position` (0-based).
    pub fn at_position(&self, position: usize) -> Option<&Team> {
        self.teams.values().find(|team| team.position == position)
    }

    /// Rewrite every team's rank index from the current scores.
    pub fn recompute_positions(&mut self) {
        let order: Vec<TeamId> = self.ranked().iter().map(|team| team.id).collect();
        for (position, team_id) in order.into_iter().enumerate() {
            if let Some(team) = self.teams.get_mut(&team_id) {
                team.position = position;
            }
        }
    }

    /// Zero every score, counter, and history while keeping names and colors.
    ///
    /// Ranks fall back to registration order.
    pub fn reset_scores(&mut self, config: &StageConfig) {
        for (position, team) in self.teams.values_mut().enumerate() {
            team.clear_scores(config);
            team.position = position;
        }
    }

    /// Check the invariants a restored registry must satisfy.
    pub fn validate(&self, config: &StageConfig) -> Result<(), EngineError> {
        for team in self.teams.values() {
            let matches_stage = matches!(
                (&team.fields, config.empty_fields()),
                (StageFields::Semifinal(_), StageFields::Semifinal(_))
                    | (StageFields::Final(_), StageFields::Final(_))
            );
            if !matches_stage {
                return Err(EngineError::CorruptSnapshot(format!(
                    "team {} carries fields of another stage",
                    team.id
                )));
            }
            if let StageFields::Semifinal(fields) = team.fields {
                let out_of_range = (1..=SEMIFINAL_SESSIONS)
                    .filter_map(|session| fields.session(session))
                    .any(|value| !(0..=SESSION_SCORE_CAP).contains(&value));
                if out_of_range {
                    return Err(EngineError::CorruptSnapshot(format!(
                        "team {} has a session score out of range",
                        team.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Stable sort by score descending; equal scores keep their input order.
pub fn order_by_score_desc<'a>(teams: &[&'a Team]) -> Vec<&'a Team> {
    let mut ordered = teams.to_vec();
    ordered.sort_by(|a, b| b.score.cmp(&a.score));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semifinal_registry() -> TeamRegistry {
        TeamRegistry::create_default(&StageConfig::semifinal(), &AppConfig::default())
    }

    #[test]
    fn default_roster_has_placeholders_and_distinct_colors() {
        let registry = semifinal_registry();
        assert_eq!(registry.len(), 8);

        let first = registry.get(1).unwrap();
        assert_eq!(first.name, "Tim 1");
        assert_eq!(first.school, "Sekolah 1");
        assert_eq!(first.score, 0);
        assert_eq!(first.fields, StageFields::Semifinal(SemifinalFields::default()));

        let mut colors: Vec<&str> = registry.iter().map(|team| team.color.as_str()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 8);
        assert_eq!(registry.next_id(), 9);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let registry = semifinal_registry();
        let next = registry
            .update(
                3,
                TeamPatch {
                    name: Some("Garuda".into()),
                    ..TeamPatch::default()
                },
            )
            .unwrap();

        let before = registry.get(3).unwrap();
        let after = next.get(3).unwrap();
        assert_eq!(after.name, "Garuda");
        assert_eq!(after.school, before.school);
        assert_eq!(after.color, before.color);
        assert_eq!(after.score, before.score);
        assert_eq!(registry.get(3).unwrap().name, "Tim 3");
    }

    #[test]
    fn update_unknown_team_is_not_found() {
        let registry = semifinal_registry();
        let err = registry.update(42, TeamPatch::default()).unwrap_err();
        assert_eq!(err, EngineError::NotFound { team_id: 42 });
    }

    #[test]
    fn ordering_is_stable_for_ties() {
        let mut registry = semifinal_registry();
        registry.get_mut(5).unwrap().score = 30;
        registry.get_mut(2).unwrap().score = 10;
        registry.get_mut(7).unwrap().score = 10;
        registry.recompute_positions();

        let first: Vec<TeamId> = registry.ranked().iter().map(|team| team.id).collect();
        registry.recompute_positions();
        let second: Vec<TeamId> = registry.ranked().iter().map(|team| team.id).collect();

        assert_eq!(first, second);
        assert_eq!(&first[..3], &[5, 2, 7]);
        assert_eq!(registry.at_position(0).unwrap().id, 5);
    }

    #[test]
    fn reset_keeps_identity_but_zeroes_scores() {
        let config = StageConfig::final_stage();
        let mut registry = TeamRegistry::create_default(&config, &AppConfig::default());
        {
            let team = registry.get_mut(2).unwrap();
            team.score = 150;
            team.history.push(1);
            team.fields = StageFields::Final(FinalFields {
                wajib: 1,
                ..FinalFields::default()
            });
        }

        registry.reset_scores(&config);

        let team = registry.get(2).unwrap();
        assert_eq!(team.name, "Tim 2");
        assert_eq!(team.score, 0);
        assert!(team.history.is_empty());
        assert_eq!(team.fields, StageFields::Final(FinalFields::default()));
    }

    #[test]
    fn reset_restores_registration_order() {
        let config = StageConfig::semifinal();
        let mut registry = TeamRegistry::create_default(&config, &AppConfig::default());
        registry.get_mut(5).unwrap().score = 10;
        registry.recompute_positions();
        assert_eq!(registry.ranked()[0].id, 5);

        registry.reset_scores(&config);

        let order: Vec<TeamId> = registry.ranked().iter().map(|team| team.id).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(registry.at_position(4).unwrap().id, 5);
    }

    #[test]
    fn import_of_zero_rows_is_rejected() {
        let err = TeamRegistry::import_from(&[], &StageConfig::final_stage()).unwrap_err();
        assert_eq!(err, EngineError::ImportEmpty);
    }

    #[test]
    fn validate_rejects_fields_of_other_stage() {
        let registry =
            TeamRegistry::create_default(&StageConfig::final_stage(), &AppConfig::default());
        assert!(registry.validate(&StageConfig::final_stage()).is_ok());
        assert!(matches!(
            registry.validate(&StageConfig::semifinal()),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }
}
