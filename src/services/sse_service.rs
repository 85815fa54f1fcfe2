//! Server-Sent Events delivery for room subscribers.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{dto::sse::ServerEvent, error::ServiceError, state::SharedState};

/// Subscribe to a room's event channel from the current version forward.
pub fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<broadcast::Receiver<ServerEvent>, ServiceError> {
    let handle = state.room(code)?;
    Ok(handle.channel.subscribe())
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects or the room's channel closes on teardown. A lagged
/// subscriber skips the missed events and stays connected; the versioned
/// snapshot is its recovery path.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    room_code: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(room = %room_code, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
