use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        common::ScoreboardView,
        sse::{Handshake, ServerEvent},
    },
    services::sse_events::EVENT_SCOREBOARD,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the public stream and build the events a new client receives first:
/// the handshake and the current scoreboard.
pub fn subscribe_public(state: &SharedState) -> (broadcast::Receiver<ServerEvent>, Vec<ServerEvent>) {
    let receiver = state.public_sse().subscribe();
    let snapshot = state.snapshot();

    let handshake = Handshake {
        stream: "public".into(),
        message: "public stream connected".into(),
        stage: snapshot.stage,
    };
    let scoreboard = ScoreboardView::new(&snapshot, &state.stage_config());

    let initial = [
        ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake),
        ServerEvent::json(Some(EVENT_SCOREBOARD.to_string()), &scoreboard),
    ]
    .into_iter()
    .filter_map(|event| match event {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize initial SSE payload");
            None
        }
    })
    .collect();

    (receiver, initial)
}

/// Convert a broadcast receiver into an SSE response, sending `initial` first and then
/// forwarding events until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // The next scoreboard event carries the full state again.
                            debug!(skipped, "public SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Public SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
