//! Per-room event fan-out. One broadcast channel per room; every published
//! event carries the room version stamped by the caller, so push subscribers
//! and polling clients observe the same total order.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub owned by a room handle. Dropping it (on room teardown)
/// closes every subscriber stream.
#[derive(Debug)]
pub struct RoomChannel {
    sender: broadcast::Sender<ServerEvent>,
}

/// Envelope adding the monotonic room version to an event payload.
#[derive(Serialize)]
struct Versioned<'a, T: Serialize> {
    room_version: u64,
    #[serde(flatten)]
    payload: &'a T,
}

impl RoomChannel {
    /// Create a hub backed by a broadcast channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber that receives events from this point forward.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Serialize `payload` under `version` and fan it out. Delivery errors
    /// (no subscribers) are ignored; serialization errors are surfaced so the
    /// caller can log them.
    pub fn publish<T: Serialize>(
        &self,
        tag: &str,
        version: u64,
        payload: &T,
    ) -> serde_json::Result<()> {
        let event = ServerEvent::json(
            Some(tag.to_string()),
            &Versioned {
                room_version: version,
                payload,
            },
        )?;
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize)]
    struct Probe {
        value: u32,
    }

    #[derive(Deserialize)]
    struct ProbeWire {
        room_version: u64,
        value: u32,
    }

    #[tokio::test]
    async fn publish_stamps_version_and_reaches_subscribers() {
        let channel = RoomChannel::new(8);
        let mut rx = channel.subscribe();

        channel.publish("probe", 7, &Probe { value: 42 }).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("probe"));
        let wire: ProbeWire = serde_json::from_str(&event.data).unwrap();
        assert_eq!(wire.room_version, 7);
        assert_eq!(wire.value, 42);
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let channel = RoomChannel::new(8);
        channel.publish("probe", 1, &Probe { value: 1 }).unwrap();
    }
}
