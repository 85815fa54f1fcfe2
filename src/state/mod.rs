//! Shared application state: the room registry and the per-room handles that
//! carry the serialization boundary for all mutations.

pub mod events;
pub mod machine;
pub mod room;

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    dao::QuestionRepository,
    error::ServiceError,
    state::{events::RoomChannel, room::Room},
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Broadcast channel capacity per room. Slow subscribers past this many
/// buffered events are lagged, not blocked.
const ROOM_CHANNEL_CAPACITY: usize = 64;

/// One live room: the lock is the per-room serialization boundary, the
/// channel is its event fan-out. All state-changing operations for the room
/// run one at a time under `room`; the channel is only ever written while the
/// lock is held, which gives events their total order.
#[derive(Debug)]
pub struct RoomHandle {
    /// Authoritative room state.
    pub room: Mutex<Room>,
    /// Versioned event hub for this room.
    pub channel: RoomChannel,
}

impl RoomHandle {
    /// Wrap a freshly created room.
    pub fn new(room: Room) -> Arc<Self> {
        Arc::new(Self {
            room: Mutex::new(room),
            channel: RoomChannel::new(ROOM_CHANNEL_CAPACITY),
        })
    }
}

/// Central application state: room registry, configuration, and the injected
/// question repository.
pub struct AppState {
    rooms: DashMap<String, Arc<RoomHandle>>,
    config: AppConfig,
    repository: Arc<dyn QuestionRepository>,
}

impl AppState {
    /// Construct the shared state around a repository implementation.
    pub fn new(config: AppConfig, repository: Arc<dyn QuestionRepository>) -> SharedState {
        Arc::new(Self {
            rooms: DashMap::new(),
            config,
            repository,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The injected question/result repository.
    pub fn repository(&self) -> &Arc<dyn QuestionRepository> {
        &self.repository
    }

    /// Registry of live rooms keyed by code.
    pub fn rooms(&self) -> &DashMap<String, Arc<RoomHandle>> {
        &self.rooms
    }

    /// Look up a room handle, cloning it out of the registry so no map guard
    /// outlives the call.
    pub fn room(&self, code: &str) -> Result<Arc<RoomHandle>, ServiceError> {
        self.rooms
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServiceError::RoomNotFound(code.to_string()))
    }

    /// Insert a new room if its code is free. Returns false on collision.
    pub fn try_insert_room(&self, code: String, handle: Arc<RoomHandle>) -> bool {
        match self.rooms.entry(code) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Drop a room from the registry, closing its event channel.
    pub fn remove_room(&self, code: &str) -> Option<Arc<RoomHandle>> {
        self.rooms.remove(code).map(|(_, handle)| handle)
    }
}
