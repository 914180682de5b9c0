use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{engine::Signal, stage::Stage};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Stage loaded when the client connected.
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Notification for audio and view collaborators, sent as the `signal` event.
pub enum SignalEvent {
    /// The countdown lost one second.
    Tick { remaining: u32 },
    /// The countdown reached zero.
    Timeout,
    /// A card was turned.
    Flip { card_id: u8 },
    /// Unflipped cards were reordered.
    Shuffle,
    /// The last session is done and a new round waits for confirmation.
    StageComplete { plan_id: Uuid },
    /// The active round changed.
    RoundChanged { round: u8 },
    /// Every score was wiped.
    ScoresReset,
    /// The engine switched to another stage.
    StageSwitched { stage: Stage },
}

impl From<&Signal> for SignalEvent {
    fn from(signal: &Signal) -> Self {
        match *signal {
            Signal::Tick { remaining } => SignalEvent::Tick { remaining },
            Signal::Timeout => SignalEvent::Timeout,
            Signal::Flip { card_id } => SignalEvent::Flip { card_id },
            Signal::Shuffle => SignalEvent::Shuffle,
            Signal::StageComplete { plan_id } => SignalEvent::StageComplete { plan_id },
            Signal::RoundChanged { round } => SignalEvent::RoundChanged { round },
            Signal::ScoresReset => SignalEvent::ScoresReset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_are_tagged_by_type() {
        let json = serde_json::to_value(SignalEvent::from(&Signal::Tick { remaining: 4 })).unwrap();
        assert_eq!(json, serde_json::json!({"type": "tick", "remaining": 4}));

        let json = serde_json::to_value(SignalEvent::from(&Signal::Timeout)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "timeout"}));
    }
}
