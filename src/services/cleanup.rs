//! Background garbage collection of dead rooms: finished matches past their
//! grace period, rooms emptied of players, and waiting rooms nobody touched.

use std::time::{Duration, SystemTime};

use tokio::time::sleep;
use tracing::{debug, info};

use crate::state::{SharedState, machine::RoomStatus};

/// Periodic sweep loop, spawned once at startup.
pub async fn run(state: SharedState) {
    let interval = state.config().timing.cleanup_interval;
    loop {
        sleep(interval).await;
        let removed = sweep(&state).await;
        if removed > 0 {
            info!(removed, "cleaned up dead rooms");
        }
    }
}

/// One pass over the registry. Returns the number of rooms removed.
pub async fn sweep(state: &SharedState) -> usize {
    let timing = state.config().timing;
    let handles: Vec<_> = state
        .rooms()
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect();

    let mut removed = 0;
    for (code, handle) in handles {
        let expired = {
            let room = handle.room.lock().await;
            let idle = age_of(room.last_activity);
            match room.status {
                RoomStatus::Finished => idle > timing.finished_room_grace,
                _ if room.players.is_empty() => idle > timing.empty_room_grace,
                RoomStatus::Waiting => idle > timing.idle_room_timeout,
                _ => false,
            }
        };
        if !expired {
            continue;
        }

        if let Some(handle) = state.remove_room(&code) {
            // Disarm any pending deadline timer before the handle drops.
            let mut room = handle.room.lock().await;
            if let Some(round) = room.round.as_mut() {
                if let Some(timer) = round.timer.take() {
                    timer.abort();
                }
            }
            debug!(room = %code, status = ?room.status, "room removed");
            removed += 1;
        }
    }
    removed
}

fn age_of(last_activity: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(last_activity)
        .unwrap_or(Duration::ZERO)
}
