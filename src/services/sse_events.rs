use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        common::{ScoreboardView, TimerView},
        sse::{ServerEvent, SignalEvent},
    },
    state::{SseHub, engine::EngineSnapshot, stage::StageConfig},
};

pub(crate) const EVENT_SCOREBOARD: &str = "scoreboard";
pub(crate) const EVENT_TIMER: &str = "timer";
pub(crate) const EVENT_SIGNAL: &str = "signal";

/// Broadcast the full scoreboard projection of `snapshot`.
pub fn broadcast_scoreboard(hub: &SseHub, snapshot: &EngineSnapshot, config: &StageConfig) {
    let payload = ScoreboardView::new(snapshot, config);
    send_public_event(hub, EVENT_SCOREBOARD, &payload);
}

/// Broadcast only the countdown values; used for ticks.
pub fn broadcast_timer(hub: &SseHub, snapshot: &EngineSnapshot) {
    let payload = TimerView::from(&snapshot.timer);
    send_public_event(hub, EVENT_TIMER, &payload);
}

/// Broadcast one abstract notification for audio and view collaborators.
pub fn broadcast_signal(hub: &SseHub, signal: &SignalEvent) {
    send_public_event(hub, EVENT_SIGNAL, signal);
}

fn send_public_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
