use thiserror::Error;
use uuid::Uuid;

use crate::state::stage::{Stage, StageConfig};

/// Position of the stage in its round progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Semifinal session (1-based).
    Session(u8),
    /// Final-stage thematic round (1-based).
    Round(u8),
}

impl RoundPhase {
    /// 1-based number of the session or round.
    pub fn number(self) -> u8 {
        match self {
            RoundPhase::Session(number) | RoundPhase::Round(number) => number,
        }
    }

    fn first(stage: Stage) -> Self {
        Self::at(stage, 1)
    }

    fn at(stage: Stage, number: u8) -> Self {
        match stage {
            Stage::Semifinal => RoundPhase::Session(number),
            Stage::Final => RoundPhase::Round(number),
        }
    }
}

/// Operator request to move through the rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Next session or round.
    Advance,
    /// Previous round (final stage only).
    Retreat,
}

/// What confirming a plan does besides moving the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundChange {
    /// Plain move to a neighbouring round.
    Step,
    /// Stage complete: restart at round 1 with every score zeroed.
    NewRound,
}

/// Error returned when a round event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the controller was in.
    pub from: RoundPhase,
    /// Rejected event.
    pub event: RoundEvent,
}

/// Errors that can occur when planning a round change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A change is already waiting for confirmation.
    AlreadyPending,
    /// The requested change is out of bounds.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when confirming a planned round change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No change is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: RoundPhase,
        /// Current phase.
        actual: RoundPhase,
    },
    /// Controller version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when cancelling a planned round change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No change is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned round change.
pub type PlanId = Uuid;

/// A validated round change waiting for operator confirmation.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the controller is currently in.
    pub from: RoundPhase,
    /// Phase the controller will move to.
    pub to: RoundPhase,
    /// Event that triggered the plan.
    pub event: RoundEvent,
    /// Whether confirming wipes the stage.
    pub change: RoundChange,
    /// Version number after applying this plan.
    pub version_next: usize,
}

/// Session/round controller with two-step (plan, confirm) transitions.
#[derive(Debug, Clone)]
pub struct RoundController {
    stage: Stage,
    last: u8,
    phase: RoundPhase,
    version: usize,
    pending: Option<Plan>,
}

impl RoundController {
    /// Controller positioned on the first round of the stage.
    pub fn new(config: &StageConfig) -> Self {
        Self {
            stage: config.stage,
            last: config.round_count().max(1),
            phase: RoundPhase::first(config.stage),
            version: 0,
            pending: None,
        }
    }

    /// Controller restored on a persisted round number, clamped into range.
    pub fn restore(config: &StageConfig, current: u8) -> Self {
        let mut controller = Self::new(config);
        controller.phase = RoundPhase::at(config.stage, current.clamp(1, controller.last));
        controller
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Current 1-based round number.
    pub fn current(&self) -> u8 {
        self.phase.number()
    }

    /// Plan currently awaiting confirmation.
    pub fn pending(&self) -> Option<&Plan> {
        self.pending.as_ref()
    }

    /// Jump back to the first round, dropping any pending plan.
    pub fn rewind(&mut self) {
        self.pending = None;
        if self.phase != RoundPhase::first(self.stage) {
            self.phase = RoundPhase::first(self.stage);
            self.version += 1;
        }
    }

    /// Validate a round change and park it until confirmed or cancelled.
    pub fn plan(&mut self, event: RoundEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let (to, change) = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to,
            event,
            change,
            version_next: self.version + 1,
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Confirm the pending plan, moving to its destination phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<(RoundPhase, RoundChange), ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok((self.phase, plan.change))
    }

    /// Drop the pending plan without changing rounds.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    fn compute_transition(
        &self,
        event: RoundEvent,
    ) -> Result<(RoundPhase, RoundChange), InvalidTransition> {
        let current = self.phase.number();
        let invalid = InvalidTransition {
            from: self.phase,
            event,
        };

        match (self.stage, event) {
            (Stage::Semifinal, RoundEvent::Advance) if current >= self.last => {
                Ok((RoundPhase::first(self.stage), RoundChange::NewRound))
            }
            (Stage::Semifinal, RoundEvent::Retreat) => Err(invalid),
            (_, RoundEvent::Advance) if current < self.last => Ok((
                RoundPhase::at(self.stage, current + 1),
                RoundChange::Step,
            )),
            (_, RoundEvent::Retreat) if current > 1 => Ok((
                RoundPhase::at(self.stage, current - 1),
                RoundChange::Step,
            )),
            _ => Err(invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(controller: &mut RoundController, event: RoundEvent) -> (RoundPhase, RoundChange) {
        let plan = controller.plan(event).unwrap();
        controller.apply(plan.id).unwrap()
    }

    #[test]
    fn semifinal_advances_through_sessions() {
        let mut controller = RoundController::new(&StageConfig::semifinal());
        assert_eq!(controller.phase(), RoundPhase::Session(1));
        assert_eq!(
            apply(&mut controller, RoundEvent::Advance),
            (RoundPhase::Session(2), RoundChange::Step)
        );
        assert_eq!(
            apply(&mut controller, RoundEvent::Advance),
            (RoundPhase::Session(3), RoundChange::Step)
        );
    }

    #[test]
    fn semifinal_last_session_plans_new_round() {
        let mut controller = RoundController::restore(&StageConfig::semifinal(), 3);
        let plan = controller.plan(RoundEvent::Advance).unwrap();
        assert_eq!(plan.change, RoundChange::NewRound);
        assert_eq!(plan.to, RoundPhase::Session(1));
        assert_eq!(controller.current(), 3);

        controller.abort(plan.id).unwrap();
        assert_eq!(controller.current(), 3);
        assert!(controller.pending().is_none());
    }

    #[test]
    fn semifinal_retreat_is_invalid() {
        let mut controller = RoundController::restore(&StageConfig::semifinal(), 2);
        let err = controller.plan(RoundEvent::Retreat).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidTransition(InvalidTransition {
                from: RoundPhase::Session(2),
                event: RoundEvent::Retreat,
            })
        );
    }

    #[test]
    fn final_rounds_are_bounded() {
        let config = StageConfig::final_stage();
        let mut controller = RoundController::new(&config);
        assert!(matches!(
            controller.plan(RoundEvent::Retreat),
            Err(PlanError::InvalidTransition(_))
        ));

        for expected in 2..=5 {
            assert_eq!(
                apply(&mut controller, RoundEvent::Advance).0,
                RoundPhase::Round(expected)
            );
        }
        assert!(matches!(
            controller.plan(RoundEvent::Advance),
            Err(PlanError::InvalidTransition(_))
        ));
        assert_eq!(
            apply(&mut controller, RoundEvent::Retreat).0,
            RoundPhase::Round(4)
        );
    }

    #[test]
    fn only_one_plan_can_be_pending() {
        let mut controller = RoundController::new(&StageConfig::final_stage());
        let plan = controller.plan(RoundEvent::Advance).unwrap();
        assert_eq!(
            controller.plan(RoundEvent::Advance).unwrap_err(),
            PlanError::AlreadyPending
        );
        assert_eq!(controller.pending().map(|pending| pending.id), Some(plan.id));
    }

    #[test]
    fn apply_with_wrong_id_keeps_plan() {
        let mut controller = RoundController::new(&StageConfig::final_stage());
        let plan = controller.plan(RoundEvent::Advance).unwrap();
        let other = Uuid::new_v4();

        assert_eq!(
            controller.apply(other).unwrap_err(),
            ApplyError::IdMismatch {
                expected: plan.id,
                got: other,
            }
        );
        assert_eq!(controller.current(), 1);
        assert!(controller.apply(plan.id).is_ok());
        assert_eq!(controller.current(), 2);
    }

    #[test]
    fn rewind_returns_to_first_session_and_drops_plan() {
        let mut controller = RoundController::new(&StageConfig::semifinal());
        apply(&mut controller, RoundEvent::Advance);
        let stale = controller.plan(RoundEvent::Advance).unwrap();

        controller.rewind();

        assert_eq!(controller.phase(), RoundPhase::Session(1));
        assert!(controller.pending().is_none());
        assert_eq!(controller.apply(stale.id).unwrap_err(), ApplyError::NoPending);
    }

    #[test]
    fn restore_clamps_out_of_range_round() {
        let controller = RoundController::restore(&StageConfig::final_stage(), 9);
        assert_eq!(controller.phase(), RoundPhase::Round(5));
        let controller = RoundController::restore(&StageConfig::semifinal(), 0);
        assert_eq!(controller.phase(), RoundPhase::Session(1));
    }
}
