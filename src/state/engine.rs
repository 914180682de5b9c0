//! Scoreboard engine: the single owner of teams, ledger, history, rounds, timer, and cards.
//!
//! Every operator action and every timer tick is an [`EngineCommand`]. A command either
//! succeeds and yields a [`CommandOutcome`], or fails with an [`EngineError`] and leaves
//! the engine exactly as it was.

use crate::{
    config::AppConfig,
    state::{
        cards::CardDeck,
        error::EngineError,
        history::UndoHistory,
        ledger::{Ledger, apply_score},
        round::{Plan, PlanId, RoundChange, RoundController, RoundEvent},
        stage::{Stage, StageConfig},
        tabular::TeamRow,
        team::{TeamId, TeamPatch, TeamRegistry},
        timer::{Countdown, TickOutcome},
    },
};

/// Unit of undo/redo: the registry together with the ledger that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSnapshot {
    /// Teams at that instant.
    pub teams: TeamRegistry,
    /// Ledger at that instant.
    pub ledger: Ledger,
}

/// Raw key press forwarded by the operator console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// Key value (`"1"`, `"q"`, `" "`, `"Space"`).
    pub key: String,
    /// Whether the control modifier was held.
    pub ctrl: bool,
}

/// State of the two-key shortcut input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Awaiting {
    /// Waiting for a team digit.
    #[default]
    None,
    /// A team is selected; the next key picks the scoring action.
    TeamSelected(TeamId),
}

/// Commands accepted by [`ScoreboardEngine::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Add a signed delta to one category of a team.
    ApplyScore {
        /// Target team.
        team_id: TeamId,
        /// Category name, parsed for the active stage.
        category: String,
        /// Signed points.
        delta: i64,
    },
    /// Edit a team's name, school, or color.
    UpdateTeam {
        /// Target team.
        team_id: TeamId,
        /// Fields to change.
        patch: TeamPatch,
    },
    /// Replace the roster from tabular rows.
    ImportTeams(Vec<TeamRow>),
    /// Step back to the previous score snapshot.
    Undo,
    /// Re-apply an undone score snapshot.
    Redo,
    /// Zero every score while keeping the roster.
    ResetScores,
    /// Plan a round change that needs confirmation.
    PlanRoundChange(RoundEvent),
    /// Confirm the pending round change.
    ConfirmRoundChange(PlanId),
    /// Drop the pending round change.
    CancelRoundChange(PlanId),
    /// Start the countdown.
    StartTimer,
    /// Pause the countdown.
    PauseTimer,
    /// Start or pause the countdown.
    ToggleTimer,
    /// Stop and rewind the countdown, optionally to a new duration.
    ResetTimer(Option<u32>),
    /// Change the configured countdown duration.
    SetTimerDuration(u32),
    /// One scheduled second elapsed for the given timer generation.
    Tick {
        /// Generation the tick was armed for.
        generation: u64,
    },
    /// Turn a card of the current round.
    FlipCard(u8),
    /// Close the question of the open card.
    CloseQuestion,
    /// Shuffle the unflipped cards.
    ShuffleCards,
    /// Keyboard shortcut input.
    KeyPress(KeyInput),
}

/// Abstract notifications for audio or view collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The countdown lost one second.
    Tick {
        /// Seconds left.
        remaining: u32,
    },
    /// The countdown reached zero.
    Timeout,
    /// A card was turned.
    Flip {
        /// Card identifier.
        card_id: u8,
    },
    /// Unflipped cards were reordered.
    Shuffle,
    /// The last session is done; confirming the plan starts a fresh round.
    StageComplete {
        /// Plan to confirm or cancel.
        plan_id: PlanId,
    },
    /// The active round changed.
    RoundChanged {
        /// New 1-based round.
        round: u8,
    },
    /// Scores were wiped.
    ScoresReset,
}

/// Result of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutcome {
    /// Whether the snapshot differs from the one before the command.
    pub changed: bool,
    /// Notifications raised by the command.
    pub signals: Vec<Signal>,
    /// Plan created by [`EngineCommand::PlanRoundChange`].
    pub plan: Option<Plan>,
}

impl CommandOutcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    fn with_signal(signal: Signal) -> Self {
        Self {
            changed: true,
            signals: vec![signal],
            plan: None,
        }
    }
}

/// Countdown values exposed in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    /// Seconds left.
    pub remaining: u32,
    /// Whether ticks decrement.
    pub running: bool,
    /// Duration restored by a reset.
    pub configured_duration: u32,
    /// Duration applied at the next reset.
    pub pending_duration: Option<u32>,
    /// Generation ticks must carry.
    pub generation: u64,
    /// Whether the last run reached zero.
    pub expired: bool,
}

impl From<&Countdown> for TimerState {
    fn from(countdown: &Countdown) -> Self {
        Self {
            remaining: countdown.remaining(),
            running: countdown.is_running(),
            configured_duration: countdown.configured(),
            pending_duration: countdown.pending_duration(),
            generation: countdown.generation(),
            expired: countdown.is_expired(),
        }
    }
}

/// Round change waiting for confirmation, as seen from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRound {
    /// Plan identifier.
    pub plan_id: PlanId,
    /// Destination round.
    pub to: u8,
    /// Whether confirming wipes the stage.
    pub change: RoundChange,
}

/// Full engine state at one instant; persisted, restored, and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Active stage.
    pub stage: Stage,
    /// Teams with derived positions.
    pub teams: TeamRegistry,
    /// Score history.
    pub ledger: Ledger,
    /// 1-based session or round.
    pub current_round: u8,
    /// Title of the current round.
    pub round_title: String,
    /// Round change awaiting confirmation.
    pub pending_round: Option<PendingRound>,
    /// Countdown values.
    pub timer: TimerState,
    /// Undo stack, oldest first.
    pub undo_stack: Vec<ScoreSnapshot>,
    /// Redo stack, oldest first.
    pub redo_stack: Vec<ScoreSnapshot>,
    /// Card deck of the current final round.
    pub cards: Option<CardDeck>,
    /// Shortcut input state.
    pub awaiting: Awaiting,
}

/// Façade composing every scoreboard component for one stage.
#[derive(Debug, Clone)]
pub struct ScoreboardEngine {
    config: StageConfig,
    teams: TeamRegistry,
    ledger: Ledger,
    history: UndoHistory<ScoreSnapshot>,
    rounds: RoundController,
    timer: Countdown,
    cards: Option<CardDeck>,
    awaiting: Awaiting,
}

impl ScoreboardEngine {
    /// Fresh engine with the stage's default roster.
    pub fn new(config: StageConfig, app_config: &AppConfig) -> Self {
        let teams = TeamRegistry::create_default(&config, app_config);
        let rounds = RoundController::new(&config);
        let cards = deck_for(&config, rounds.current());
        Self {
            timer: Countdown::new(config.timer_seconds),
            teams,
            ledger: Ledger::new(),
            history: UndoHistory::new(),
            rounds,
            cards,
            awaiting: Awaiting::None,
            config,
        }
    }

    /// Rebuild an engine from a persisted snapshot, validating it against `config`.
    pub fn restore(config: StageConfig, snapshot: EngineSnapshot) -> Result<Self, EngineError> {
        if snapshot.stage != config.stage {
            return Err(EngineError::CorruptSnapshot(format!(
                "blob belongs to the {} stage",
                snapshot.stage
            )));
        }
        snapshot.teams.validate(&config)?;
        for previous in snapshot.undo_stack.iter().chain(&snapshot.redo_stack) {
            previous.teams.validate(&config)?;
        }

        let rounds = RoundController::restore(&config, snapshot.current_round);
        let cards = match snapshot.cards {
            Some(deck) if config.uses_cards() && deck.round() == rounds.current() => {
                deck.validate()?;
                Some(deck)
            }
            _ => deck_for(&config, rounds.current()),
        };
        let timer = Countdown::restore(
            snapshot.timer.remaining,
            snapshot.timer.running,
            snapshot.timer.configured_duration,
            snapshot.timer.generation,
        );

        let mut teams = snapshot.teams;
        teams.recompute_positions();

        Ok(Self {
            teams,
            ledger: snapshot.ledger,
            history: UndoHistory::from_stacks(snapshot.undo_stack, snapshot.redo_stack),
            rounds,
            timer,
            cards,
            awaiting: Awaiting::None,
            config,
        })
    }

    /// Active stage.
    pub fn stage(&self) -> Stage {
        self.config.stage
    }

    /// Stage configuration in use.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Current teams.
    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    /// Current ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Current countdown.
    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    /// Round controller.
    pub fn rounds(&self) -> &RoundController {
        &self.rounds
    }

    /// Card deck, final stage only.
    pub fn cards(&self) -> Option<&CardDeck> {
        self.cards.as_ref()
    }

    /// Shortcut input state.
    pub fn awaiting(&self) -> Awaiting {
        self.awaiting
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let current_round = self.rounds.current();
        EngineSnapshot {
            stage: self.config.stage,
            teams: self.teams.clone(),
            ledger: self.ledger.clone(),
            current_round,
            round_title: self
                .config
                .round(current_round)
                .map(|round| round.title.clone())
                .unwrap_or_default(),
            pending_round: self.rounds.pending().map(|plan| PendingRound {
                plan_id: plan.id,
                to: plan.to.number(),
                change: plan.change,
            }),
            timer: TimerState::from(&self.timer),
            undo_stack: self.history.undo_stack().cloned().collect(),
            redo_stack: self.history.redo_stack().cloned().collect(),
            cards: self.cards.clone(),
            awaiting: self.awaiting,
        }
    }

    /// Execute one command to completion.
    pub fn handle(&mut self, command: EngineCommand) -> Result<CommandOutcome, EngineError> {
        match command {
            EngineCommand::ApplyScore {
                team_id,
                category,
                delta,
            } => {
                let (teams, ledger) = apply_score(
                    &self.config,
                    &self.teams,
                    &self.ledger,
                    team_id,
                    &category,
                    delta,
                )?;
                self.commit_scores(teams, ledger);
                Ok(CommandOutcome::changed())
            }
            EngineCommand::UpdateTeam { team_id, patch } => {
                let teams = self.teams.update(team_id, patch)?;
                let ledger = self.ledger.clone();
                self.commit_scores(teams, ledger);
                Ok(CommandOutcome::changed())
            }
            EngineCommand::ImportTeams(rows) => {
                let teams = TeamRegistry::import_from(&rows, &self.config)?;
                self.commit_scores(teams, Ledger::new());
                self.timer.reset(None);
                self.awaiting = Awaiting::None;
                Ok(CommandOutcome::changed())
            }
            EngineCommand::Undo => {
                let current = self.score_snapshot();
                Ok(match self.history.undo(current) {
                    Some(previous) => {
                        self.install(previous);
                        CommandOutcome::changed()
                    }
                    None => CommandOutcome::unchanged(),
                })
            }
            EngineCommand::Redo => {
                let current = self.score_snapshot();
                Ok(match self.history.redo(current) {
                    Some(next) => {
                        self.install(next);
                        CommandOutcome::changed()
                    }
                    None => CommandOutcome::unchanged(),
                })
            }
            EngineCommand::ResetScores => {
                let mut outcome = CommandOutcome::with_signal(Signal::ScoresReset);
                match self.config.stage {
                    Stage::Semifinal => {
                        self.history.clear();
                        if self.rounds.current() != 1 {
                            outcome.signals.push(Signal::RoundChanged { round: 1 });
                        }
                        self.rounds.rewind();
                    }
                    Stage::Final => self.history.push(self.score_snapshot()),
                }
                self.teams.reset_scores(&self.config);
                self.ledger = Ledger::new();
                self.timer.reset(None);
                self.awaiting = Awaiting::None;
                Ok(outcome)
            }
            EngineCommand::PlanRoundChange(event) => {
                let plan = self.rounds.plan(event)?;
                let mut outcome = CommandOutcome::changed();
                if plan.change == RoundChange::NewRound {
                    outcome
                        .signals
                        .push(Signal::StageComplete { plan_id: plan.id });
                }
                outcome.plan = Some(plan);
                Ok(outcome)
            }
            EngineCommand::ConfirmRoundChange(plan_id) => {
                let (phase, change) = self.rounds.apply(plan_id)?;
                let mut outcome = CommandOutcome::changed();
                if change == RoundChange::NewRound {
                    self.teams.reset_scores(&self.config);
                    self.ledger = Ledger::new();
                    self.history.clear();
                    outcome.signals.push(Signal::ScoresReset);
                }
                self.timer.reset(None);
                self.cards = deck_for(&self.config, phase.number());
                self.awaiting = Awaiting::None;
                outcome.signals.push(Signal::RoundChanged {
                    round: phase.number(),
                });
                Ok(outcome)
            }
            EngineCommand::CancelRoundChange(plan_id) => {
                self.rounds.abort(plan_id)?;
                Ok(CommandOutcome::changed())
            }
            EngineCommand::StartTimer => Ok(if self.timer.start() {
                CommandOutcome::changed()
            } else {
                CommandOutcome::unchanged()
            }),
            EngineCommand::PauseTimer => Ok(if self.timer.pause() {
                CommandOutcome::changed()
            } else {
                CommandOutcome::unchanged()
            }),
            EngineCommand::ToggleTimer => {
                self.timer.toggle();
                Ok(CommandOutcome::changed())
            }
            EngineCommand::ResetTimer(duration) => {
                if duration == Some(0) {
                    return Err(EngineError::InvalidTransition(
                        "timer duration must be positive".into(),
                    ));
                }
                self.timer.reset(duration);
                Ok(CommandOutcome::changed())
            }
            EngineCommand::SetTimerDuration(seconds) => {
                self.timer.set_duration(seconds)?;
                Ok(CommandOutcome::changed())
            }
            EngineCommand::Tick { generation } => Ok(match self.timer.tick(generation) {
                TickOutcome::Ignored => CommandOutcome::unchanged(),
                TickOutcome::Ticked { remaining } => {
                    CommandOutcome::with_signal(Signal::Tick { remaining })
                }
                TickOutcome::Expired => CommandOutcome::with_signal(Signal::Timeout),
            }),
            EngineCommand::FlipCard(card_id) => {
                let deck = self.deck_mut()?;
                deck.flip(card_id)?;
                self.timer.reset(None);
                Ok(CommandOutcome::with_signal(Signal::Flip { card_id }))
            }
            EngineCommand::CloseQuestion => {
                let closed = self.deck_mut()?.close_question();
                Ok(if closed {
                    CommandOutcome::changed()
                } else {
                    CommandOutcome::unchanged()
                })
            }
            EngineCommand::ShuffleCards => {
                self.deck_mut()?.shuffle(&mut rand::rng())?;
                Ok(CommandOutcome::with_signal(Signal::Shuffle))
            }
            EngineCommand::KeyPress(input) => self.handle_key(input),
        }
    }

    fn handle_key(&mut self, input: KeyInput) -> Result<CommandOutcome, EngineError> {
        let key = input.key.to_lowercase();
        if key == " " || key == "space" {
            self.awaiting = Awaiting::None;
            return self.handle(EngineCommand::ToggleTimer);
        }
        if input.ctrl {
            self.awaiting = Awaiting::None;
            return match key.as_str() {
                "z" => self.handle(EngineCommand::Undo),
                "y" => self.handle(EngineCommand::Redo),
                _ => Ok(CommandOutcome::unchanged()),
            };
        }

        let mut chars = key.chars();
        let single = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };

        match std::mem::take(&mut self.awaiting) {
            Awaiting::TeamSelected(team_id) => {
                let Some(shortcut) = single.and_then(|c| self.config.shortcut(c)).cloned() else {
                    return Ok(CommandOutcome::changed());
                };
                let outcome = self.handle(EngineCommand::ApplyScore {
                    team_id,
                    category: shortcut.category.label(),
                    delta: shortcut.delta,
                });
                if outcome.is_err() {
                    self.awaiting = Awaiting::None;
                }
                outcome
            }
            Awaiting::None => {
                if self.config.shortcuts.is_empty() {
                    return Ok(CommandOutcome::unchanged());
                }
                let team = single
                    .and_then(|c| c.to_digit(10))
                    .filter(|digit| *digit >= 1)
                    .and_then(|digit| self.teams.at_position(digit as usize - 1));
                Ok(match team {
                    Some(team) => {
                        self.awaiting = Awaiting::TeamSelected(team.id);
                        CommandOutcome::changed()
                    }
                    None => CommandOutcome::unchanged(),
                })
            }
        }
    }

    fn deck_mut(&mut self) -> Result<&mut CardDeck, EngineError> {
        self.cards.as_mut().ok_or_else(|| {
            EngineError::InvalidTransition("the card deck is only used in the final stage".into())
        })
    }

    fn score_snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            teams: self.teams.clone(),
            ledger: self.ledger.clone(),
        }
    }

    fn commit_scores(&mut self, teams: TeamRegistry, ledger: Ledger) {
        self.history.push(self.score_snapshot());
        self.teams = teams;
        self.ledger = ledger;
    }

    fn install(&mut self, snapshot: ScoreSnapshot) {
        self.teams = snapshot.teams;
        self.ledger = snapshot.ledger;
        self.teams.recompute_positions();
        self.awaiting = Awaiting::None;
    }
}

fn deck_for(config: &StageConfig, round: u8) -> Option<CardDeck> {
    if !config.uses_cards() {
        return None;
    }
    config.round(round).map(CardDeck::for_round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        ledger::replay_total,
        team::{SemifinalFields, StageFields},
    };

    fn semifinal() -> ScoreboardEngine {
        ScoreboardEngine::new(StageConfig::semifinal(), &AppConfig::default())
    }

    fn final_stage() -> ScoreboardEngine {
        ScoreboardEngine::new(StageConfig::final_stage(), &AppConfig::default())
    }

    fn score(engine: &mut ScoreboardEngine, team_id: TeamId, category: &str, delta: i64) {
        engine
            .handle(EngineCommand::ApplyScore {
                team_id,
                category: category.into(),
                delta,
            })
            .unwrap();
    }

    fn key(engine: &mut ScoreboardEngine, key: &str) -> CommandOutcome {
        engine
            .handle(EngineCommand::KeyPress(KeyInput {
                key: key.into(),
                ctrl: false,
            }))
            .unwrap()
    }

    fn advance(engine: &mut ScoreboardEngine) -> Plan {
        engine
            .handle(EngineCommand::PlanRoundChange(RoundEvent::Advance))
            .unwrap()
            .plan
            .unwrap()
    }

    #[test]
    fn semifinal_scenario() {
        let mut engine = semifinal();
        assert_eq!(engine.teams().len(), 8);

        score(&mut engine, 3, "session1", 10);
        score(&mut engine, 3, "session1", 10);
        for _ in 0..3 {
            score(&mut engine, 3, "session1", -10);
        }

        let team = engine.teams().get(3).unwrap();
        assert_eq!(
            team.fields,
            StageFields::Semifinal(SemifinalFields::default())
        );
        assert_eq!(team.score, 0);
        assert_eq!(team.score, replay_total(engine.ledger().for_team(3)));
    }

    #[test]
    fn undo_then_redo_restores_snapshot() {
        let mut engine = final_stage();
        score(&mut engine, 1, "wajib", 100);
        score(&mut engine, 2, "rebutan", 100);
        let before = engine.snapshot();

        engine.handle(EngineCommand::Undo).unwrap();
        assert_eq!(engine.teams().get(2).unwrap().score, 0);
        assert_eq!(engine.ledger().len(), 1);

        engine.handle(EngineCommand::Redo).unwrap();
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn undo_on_fresh_engine_is_noop() {
        let mut engine = semifinal();
        let before = engine.snapshot();
        let outcome = engine.handle(EngineCommand::Undo).unwrap();
        assert!(!outcome.changed);
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn semifinal_reset_returns_to_first_session() {
        let mut engine = semifinal();
        score(&mut engine, 5, "session1", 10);
        let plan = advance(&mut engine);
        engine
            .handle(EngineCommand::ConfirmRoundChange(plan.id))
            .unwrap();
        engine.handle(EngineCommand::StartTimer).unwrap();
        assert_eq!(engine.rounds().current(), 2);

        let outcome = engine.handle(EngineCommand::ResetScores).unwrap();

        assert_eq!(
            outcome.signals,
            vec![Signal::ScoresReset, Signal::RoundChanged { round: 1 }]
        );
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current_round, 1);
        assert!(snapshot.undo_stack.is_empty());
        assert!(snapshot.redo_stack.is_empty());
        assert!(!snapshot.timer.running);
        let order: Vec<TeamId> = engine.teams().ranked().iter().map(|team| team.id).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn final_reset_can_be_undone() {
        let mut engine = final_stage();
        score(&mut engine, 4, "wajib", 100);

        engine.handle(EngineCommand::ResetScores).unwrap();
        assert_eq!(engine.teams().get(4).unwrap().score, 0);
        assert_eq!(engine.teams().ranked()[0].id, 1);

        engine.handle(EngineCommand::Undo).unwrap();
        assert_eq!(engine.teams().get(4).unwrap().score, 100);
    }

    #[test]
    fn overflowing_score_is_rejected_and_engine_keeps_working() {
        let mut engine = final_stage();
        score(&mut engine, 1, "wajib", i64::MAX);

        let err = engine
            .handle(EngineCommand::ApplyScore {
                team_id: 1,
                category: "wajib".into(),
                delta: 1,
            })
            .unwrap_err();
        assert_eq!(err, EngineError::ScoreOverflow { team_id: 1, delta: 1 });

        score(&mut engine, 2, "rebutan", 100);
        assert_eq!(engine.teams().get(2).unwrap().score, 100);
        assert_eq!(engine.teams().get(1).unwrap().score, i64::MAX);
    }

    #[test]
    fn rejected_commands_leave_snapshot_untouched() {
        let mut engine = semifinal();
        score(&mut engine, 1, "session2", 5);
        let before = engine.snapshot();

        let rejected = [
            EngineCommand::ApplyScore {
                team_id: 99,
                category: "session1".into(),
                delta: 5,
            },
            EngineCommand::ApplyScore {
                team_id: 1,
                category: "wajib".into(),
                delta: 5,
            },
            EngineCommand::UpdateTeam {
                team_id: 99,
                patch: TeamPatch::default(),
            },
            EngineCommand::ImportTeams(Vec::new()),
            EngineCommand::PlanRoundChange(RoundEvent::Retreat),
            EngineCommand::FlipCard(0),
            EngineCommand::SetTimerDuration(0),
        ];
        for command in rejected {
            assert!(engine.handle(command).is_err());
            assert_eq!(engine.snapshot(), before);
        }
    }

    #[test]
    fn last_session_needs_confirmation_before_reset() {
        let mut engine = semifinal();
        score(&mut engine, 4, "session1", 30);
        let first = advance(&mut engine);
        engine
            .handle(EngineCommand::ConfirmRoundChange(first.id))
            .unwrap();
        let second = advance(&mut engine);
        engine
            .handle(EngineCommand::ConfirmRoundChange(second.id))
            .unwrap();
        assert_eq!(engine.rounds().current(), 3);

        let outcome = engine
            .handle(EngineCommand::PlanRoundChange(RoundEvent::Advance))
            .unwrap();
        let plan = outcome.plan.unwrap();
        assert!(
            outcome
                .signals
                .contains(&Signal::StageComplete { plan_id: plan.id })
        );
        assert_eq!(engine.teams().get(4).unwrap().score, 30);
        assert_eq!(engine.rounds().current(), 3);

        engine
            .handle(EngineCommand::CancelRoundChange(plan.id))
            .unwrap();
        assert_eq!(engine.teams().get(4).unwrap().score, 30);

        let plan = advance(&mut engine);
        let outcome = engine
            .handle(EngineCommand::ConfirmRoundChange(plan.id))
            .unwrap();
        assert!(outcome.signals.contains(&Signal::RoundChanged { round: 1 }));
        assert_eq!(engine.rounds().current(), 1);
        assert!(engine.teams().iter().all(|team| team.score == 0));
        assert!(engine.ledger().is_empty());
        assert!(engine.snapshot().undo_stack.is_empty());
    }

    #[test]
    fn final_round_change_rebuilds_deck_and_timer() {
        let mut engine = final_stage();
        engine.handle(EngineCommand::FlipCard(2)).unwrap();
        engine.handle(EngineCommand::StartTimer).unwrap();

        let plan = advance(&mut engine);
        engine
            .handle(EngineCommand::ConfirmRoundChange(plan.id))
            .unwrap();

        let deck = engine.cards().unwrap();
        assert_eq!(deck.round(), 2);
        assert!(deck.flip_history().is_empty());
        assert!(deck.cards().iter().all(|card| card.category == "IPA"));
        assert!(!engine.timer().is_running());
        assert_eq!(engine.timer().remaining(), 10);
    }

    #[test]
    fn flipping_twice_keeps_history() {
        let mut engine = final_stage();
        let outcome = engine.handle(EngineCommand::FlipCard(1)).unwrap();
        assert_eq!(outcome.signals, vec![Signal::Flip { card_id: 1 }]);
        engine.handle(EngineCommand::CloseQuestion).unwrap();

        assert!(engine.handle(EngineCommand::FlipCard(1)).is_err());
        assert_eq!(engine.cards().unwrap().flip_history(), &[1]);
    }

    #[test]
    fn timer_ticks_through_engine() {
        let mut engine = final_stage();
        engine.handle(EngineCommand::SetTimerDuration(2)).unwrap();
        engine.handle(EngineCommand::StartTimer).unwrap();
        let generation = engine.timer().generation();

        let first = engine.handle(EngineCommand::Tick { generation }).unwrap();
        assert_eq!(first.signals, vec![Signal::Tick { remaining: 1 }]);
        let second = engine.handle(EngineCommand::Tick { generation }).unwrap();
        assert_eq!(second.signals, vec![Signal::Timeout]);
        let idle = engine.handle(EngineCommand::Tick { generation }).unwrap();
        assert!(idle.signals.is_empty());
        assert!(!idle.changed);
    }

    #[test]
    fn shortcut_keys_score_selected_team() {
        let mut engine = final_stage();
        key(&mut engine, "2");
        assert_eq!(engine.awaiting(), Awaiting::TeamSelected(2));
        key(&mut engine, "q");
        assert_eq!(engine.awaiting(), Awaiting::None);
        assert_eq!(engine.teams().get(2).unwrap().score, 100);

        // team 2 now leads, so digit 1 selects it
        key(&mut engine, "1");
        key(&mut engine, "S");
        assert_eq!(engine.teams().get(2).unwrap().score, 50);

        key(&mut engine, "3");
        key(&mut engine, "x");
        assert_eq!(engine.awaiting(), Awaiting::None);
        assert_eq!(engine.ledger().len(), 2);
    }

    #[test]
    fn control_keys_drive_undo_and_timer() {
        let mut engine = final_stage();
        score(&mut engine, 1, "wajib", 100);
        engine
            .handle(EngineCommand::KeyPress(KeyInput {
                key: "z".into(),
                ctrl: true,
            }))
            .unwrap();
        assert_eq!(engine.teams().get(1).unwrap().score, 0);

        engine
            .handle(EngineCommand::KeyPress(KeyInput {
                key: "y".into(),
                ctrl: true,
            }))
            .unwrap();
        assert_eq!(engine.teams().get(1).unwrap().score, 100);

        key(&mut engine, " ");
        assert!(engine.timer().is_running());
    }

    #[test]
    fn semifinal_has_no_shortcut_selection() {
        let mut engine = semifinal();
        let outcome = key(&mut engine, "1");
        assert!(!outcome.changed);
        assert_eq!(engine.awaiting(), Awaiting::None);
    }

    #[test]
    fn import_replaces_roster_and_is_undoable() {
        let mut engine = final_stage();
        score(&mut engine, 1, "wajib", 100);
        let row: TeamRow = [("Tim".to_string(), "Garuda".to_string())]
            .into_iter()
            .collect();

        engine
            .handle(EngineCommand::ImportTeams(vec![row]))
            .unwrap();
        assert_eq!(engine.teams().len(), 1);
        assert_eq!(engine.teams().get(1).unwrap().name, "Garuda");
        assert!(engine.ledger().is_empty());

        engine.handle(EngineCommand::Undo).unwrap();
        assert_eq!(engine.teams().len(), 5);
        assert_eq!(engine.teams().get(1).unwrap().score, 100);
    }

    #[test]
    fn restore_round_trips_snapshot() {
        let mut engine = final_stage();
        score(&mut engine, 3, "lemparan", 50);
        engine.handle(EngineCommand::FlipCard(4)).unwrap();
        let snapshot = engine.snapshot();

        let restored =
            ScoreboardEngine::restore(StageConfig::final_stage(), snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn restore_rejects_other_stage() {
        let snapshot = semifinal().snapshot();
        assert!(matches!(
            ScoreboardEngine::restore(StageConfig::final_stage(), snapshot),
            Err(EngineError::CorruptSnapshot(_))
        ));
    }
}
