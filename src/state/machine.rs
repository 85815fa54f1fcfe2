//! Room lifecycle state machine: `Waiting → Starting → Playing → Finished`,
//! strictly monotonic. The `Waiting → Starting` edge doubles as the
//! exactly-once start gate: under the room lock, whichever request advances
//! it first wins and every later attempt observes a non-`Waiting` status.

use serde::Serialize;
use thiserror::Error;

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Players are joining and toggling ready.
    Waiting,
    /// Start accepted; questions are being loaded.
    Starting,
    /// Questions are running.
    Playing,
    /// Match over; room lingers for a grace period.
    Finished,
}

/// Error returned when a status change would move backwards or skip a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// Status the room was in.
    pub from: RoomStatus,
    /// Requested status.
    pub to: RoomStatus,
}

impl RoomStatus {
    /// Validate and perform a transition, returning the new status.
    ///
    /// Any non-finished status may jump straight to `Finished` (forced end,
    /// invariant breach, teardown); everything else must follow the chain.
    pub fn advance(self, to: RoomStatus) -> Result<RoomStatus, InvalidTransition> {
        use RoomStatus::*;
        match (self, to) {
            (Waiting, Starting) | (Starting, Playing) => Ok(to),
            (Waiting, Finished) | (Starting, Finished) | (Playing, Finished) => Ok(to),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_monotonic() {
        let status = RoomStatus::Waiting;
        let status = status.advance(RoomStatus::Starting).unwrap();
        let status = status.advance(RoomStatus::Playing).unwrap();
        let status = status.advance(RoomStatus::Finished).unwrap();
        assert_eq!(status, RoomStatus::Finished);
    }

    #[test]
    fn cannot_go_backwards() {
        assert!(RoomStatus::Playing.advance(RoomStatus::Waiting).is_err());
        assert!(RoomStatus::Starting.advance(RoomStatus::Waiting).is_err());
        assert!(RoomStatus::Finished.advance(RoomStatus::Playing).is_err());
    }

    #[test]
    fn cannot_skip_start() {
        assert!(RoomStatus::Waiting.advance(RoomStatus::Playing).is_err());
    }

    #[test]
    fn start_gate_rejects_second_attempt() {
        let status = RoomStatus::Waiting.advance(RoomStatus::Starting).unwrap();
        let err = status.advance(RoomStatus::Starting).unwrap_err();
        assert_eq!(err.from, RoomStatus::Starting);
    }

    #[test]
    fn any_live_status_can_finish() {
        for status in [RoomStatus::Waiting, RoomStatus::Starting, RoomStatus::Playing] {
            assert_eq!(
                status.advance(RoomStatus::Finished).unwrap(),
                RoomStatus::Finished
            );
        }
    }

    #[test]
    fn finished_is_terminal() {
        assert!(RoomStatus::Finished.advance(RoomStatus::Finished).is_err());
    }
}
