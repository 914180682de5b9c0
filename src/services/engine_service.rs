//! Engine actor: the only task that touches the [`ScoreboardEngine`].
//!
//! Routes talk to it through [`EngineHandle`]. Commands are executed one at a time, in
//! arrival order, together with the one-second ticks of the running countdown.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};

use crate::{
    dto::sse::SignalEvent,
    error::ServiceError,
    services::{sse_events, storage_supervisor::PersistHandle},
    state::{
        SseHub,
        engine::{CommandOutcome, EngineCommand, EngineSnapshot, ScoreboardEngine},
        error::EngineError,
        process::ProcessState,
        stage::Stage,
    },
};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const COMMAND_QUEUE: usize = 64;

enum Request {
    Dispatch {
        command: EngineCommand,
        reply: oneshot::Sender<Result<CommandOutcome, EngineError>>,
    },
    SwitchStage {
        stage: Stage,
        reply: oneshot::Sender<Arc<EngineSnapshot>>,
    },
}

/// Cloneable handle used to send commands to the engine actor.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Request>,
}

impl EngineHandle {
    /// Run `command` on the engine and wait for its outcome.
    pub async fn dispatch(&self, command: EngineCommand) -> Result<CommandOutcome, ServiceError> {
        let (reply, outcome) = oneshot::channel();
        self.tx
            .send(Request::Dispatch { command, reply })
            .await
            .map_err(|_| ServiceError::EngineUnavailable)?;
        let outcome = outcome
            .await
            .map_err(|_| ServiceError::EngineUnavailable)??;
        Ok(outcome)
    }

    /// Save the active stage and load `stage` in its place.
    pub async fn switch_stage(&self, stage: Stage) -> Result<Arc<EngineSnapshot>, ServiceError> {
        let (reply, snapshot) = oneshot::channel();
        self.tx
            .send(Request::SwitchStage { stage, reply })
            .await
            .map_err(|_| ServiceError::EngineUnavailable)?;
        snapshot.await.map_err(|_| ServiceError::EngineUnavailable)
    }
}

/// Start the engine actor, publishing snapshots on the returned watch channel.
pub fn spawn(
    engine: ScoreboardEngine,
    process: ProcessState,
    persist: PersistHandle,
    sse: SseHub,
) -> (
    EngineHandle,
    watch::Receiver<Arc<EngineSnapshot>>,
    JoinHandle<()>,
) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(engine.snapshot()));
    let mut actor = EngineActor {
        engine,
        process,
        persist,
        sse,
        snapshots: snapshots_tx,
        tick: None,
    };
    actor.arm_timer();
    let task = tokio::spawn(actor.run(rx));
    (EngineHandle { tx }, snapshots_rx, task)
}

struct EngineActor {
    engine: ScoreboardEngine,
    process: ProcessState,
    persist: PersistHandle,
    sse: SseHub,
    snapshots: watch::Sender<Arc<EngineSnapshot>>,
    /// Generation and deadline of the next scheduled tick.
    tick: Option<(u64, Instant)>,
}

impl EngineActor {
    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        info!(stage = %self.engine.stage(), "scoreboard engine started");
        loop {
            let tick = self.tick;
            let next_tick = async move {
                match tick {
                    Some((_, deadline)) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                request = rx.recv() => match request {
                    Some(request) => self.serve(request).await,
                    None => break,
                },
                _ = next_tick => {
                    if let Some((generation, deadline)) = tick {
                        self.on_tick(generation, deadline);
                    }
                }
            }
        }
        self.persist.flush().await;
        info!("scoreboard engine stopped");
    }

    async fn serve(&mut self, request: Request) {
        match request {
            Request::Dispatch { command, reply } => {
                let label = command_label(&command);
                let result = self.engine.handle(command);
                match &result {
                    Ok(outcome) => {
                        debug!(command = label, changed = outcome.changed, "command applied");
                        self.publish(outcome, false);
                    }
                    Err(err) => warn!(command = label, error = %err, "command rejected"),
                }
                self.arm_timer();
                let _ = reply.send(result);
            }
            Request::SwitchStage { stage, reply } => {
                self.switch_stage(stage).await;
                let _ = reply.send(self.snapshots.borrow().clone());
            }
        }
    }

    fn on_tick(&mut self, generation: u64, deadline: Instant) {
        match self.engine.handle(EngineCommand::Tick { generation }) {
            Ok(outcome) => self.publish(&outcome, true),
            Err(err) => warn!(error = %err, "timer tick rejected"),
        }

        let timer = self.engine.timer();
        self.tick = if timer.is_running() && timer.generation() == generation {
            Some((generation, deadline + TICK_INTERVAL))
        } else {
            None
        };
        self.arm_timer();
    }

    /// Keep the tick schedule in line with the countdown: one pending tick per running
    /// generation, none while stopped.
    fn arm_timer(&mut self) {
        let timer = self.engine.timer();
        if !timer.is_running() {
            self.tick = None;
            return;
        }
        let generation = timer.generation();
        if !matches!(self.tick, Some((armed, _)) if armed == generation) {
            self.tick = Some((generation, Instant::now() + TICK_INTERVAL));
        }
    }

    async fn switch_stage(&mut self, stage: Stage) {
        if stage == self.engine.stage() {
            return;
        }

        let previous = self.engine.stage();
        self.persist.save(self.snapshots.borrow().clone());
        if !self.persist.flush().await {
            warn!(%previous, "persistence writer unavailable while switching stage");
        }

        self.engine = self.process.load(stage).await;
        info!(%previous, %stage, "stage switched");

        let snapshot = Arc::new(self.engine.snapshot());
        self.snapshots.send_replace(snapshot.clone());
        sse_events::broadcast_scoreboard(&self.sse, &snapshot, self.engine.config());
        sse_events::broadcast_signal(&self.sse, &SignalEvent::StageSwitched { stage });
        self.arm_timer();
    }

    fn publish(&mut self, outcome: &CommandOutcome, tick: bool) {
        if outcome.changed {
            let snapshot = Arc::new(self.engine.snapshot());
            self.snapshots.send_replace(snapshot.clone());
            self.persist.save(snapshot.clone());
            if tick {
                sse_events::broadcast_timer(&self.sse, &snapshot);
            } else {
                sse_events::broadcast_scoreboard(&self.sse, &snapshot, self.engine.config());
            }
        }
        for signal in &outcome.signals {
            sse_events::broadcast_signal(&self.sse, &SignalEvent::from(signal));
        }
    }
}

fn command_label(command: &EngineCommand) -> &'static str {
    match command {
        EngineCommand::ApplyScore { .. } => "apply_score",
        EngineCommand::UpdateTeam { .. } => "update_team",
        EngineCommand::ImportTeams(_) => "import_teams",
        EngineCommand::Undo => "undo",
        EngineCommand::Redo => "redo",
        EngineCommand::ResetScores => "reset_scores",
        EngineCommand::PlanRoundChange(_) => "plan_round_change",
        EngineCommand::ConfirmRoundChange(_) => "confirm_round_change",
        EngineCommand::CancelRoundChange(_) => "cancel_round_change",
        EngineCommand::StartTimer => "start_timer",
        EngineCommand::PauseTimer => "pause_timer",
        EngineCommand::ToggleTimer => "toggle_timer",
        EngineCommand::ResetTimer(_) => "reset_timer",
        EngineCommand::SetTimerDuration(_) => "set_timer_duration",
        EngineCommand::Tick { .. } => "tick",
        EngineCommand::FlipCard(_) => "flip_card",
        EngineCommand::CloseQuestion => "close_question",
        EngineCommand::ShuffleCards => "shuffle_cards",
        EngineCommand::KeyPress(_) => "key_press",
    }
}
