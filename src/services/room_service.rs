//! Room lifecycle and roster operations: creation, membership, readiness,
//! team assignment, and the start transition.

use rand::Rng;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::QuestionRequest,
    dto::{
        room::{
            CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, ReadyResponse,
            RoomListResponse, RoomSnapshot, RoomSummary, SwitchTeamRequest,
        },
        validation::{ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH},
    },
    error::ServiceError,
    services::{answers, game_events, sequencer},
    state::{
        RoomHandle, SharedState,
        machine::RoomStatus,
        room::{GameMode, Player, Room, RoomConfig},
    },
};

/// Collision retries before code allocation gives up. With a 32-symbol
/// alphabet and 6 positions the space is over a billion codes, so hitting
/// this limit means something is deeply wrong.
const MAX_CODE_ATTEMPTS: usize = 16;

/// Create a room and register the creator as its first player.
pub fn create_room(
    state: &SharedState,
    payload: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    payload.validate()?;
    let limits = state.config().limits;
    if payload.max_players > limits.max_players_cap {
        return Err(ServiceError::InvalidConfig(format!(
            "max_players may not exceed {}",
            limits.max_players_cap
        )));
    }
    if payload.question_count > limits.max_question_count {
        return Err(ServiceError::InvalidConfig(format!(
            "question_count may not exceed {}",
            limits.max_question_count
        )));
    }
    if payload.time_per_question_seconds > limits.max_time_per_question_secs {
        return Err(ServiceError::InvalidConfig(format!(
            "time_per_question_seconds may not exceed {}",
            limits.max_time_per_question_secs
        )));
    }

    let config = RoomConfig {
        name: payload.name,
        mode: payload.game_mode,
        max_players: payload.max_players,
        question_count: payload.question_count,
        time_per_question_secs: payload.time_per_question_seconds,
    };

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_room_code();
        let mut room = Room::new(code.clone(), config.clone(), payload.creator_id);
        room.players.insert(
            payload.creator_id,
            Player::new(payload.creator_id, payload.creator_name.clone(), None),
        );
        let handle = RoomHandle::new(room);
        if state.try_insert_room(code.clone(), handle) {
            info!(room = %code, mode = ?config.mode, "room created");
            return Ok(CreateRoomResponse { code });
        }
    }

    Err(ServiceError::Internal(
        "could not allocate a unique room code".into(),
    ))
}

/// List rooms that can still be joined.
pub async fn list_rooms(state: &SharedState) -> RoomListResponse {
    let handles: Vec<_> = state
        .rooms()
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    let mut rooms = Vec::new();
    for handle in handles {
        let room = handle.room.lock().await;
        if room.status == RoomStatus::Waiting {
            rooms.push(RoomSummary::from_room(&room));
        }
    }
    RoomListResponse { rooms }
}

/// Add a player to a waiting room and return the snapshot they should render.
/// Re-joining with a known id is a no-op that still returns the snapshot.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    payload: JoinRoomRequest,
) -> Result<RoomSnapshot, ServiceError> {
    payload.validate()?;
    let handle = state.room(code)?;
    let mut room = handle.room.lock().await;

    if room.players.contains_key(&payload.player_id) {
        return Ok(RoomSnapshot::from_room(&room));
    }
    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::RoomAlreadyStarted(code.to_string()));
    }
    if room.players.len() >= room.config.max_players {
        return Err(ServiceError::RoomFull(code.to_string()));
    }

    let player = Player::new(payload.player_id, payload.display_name, None);
    let summary = (&player).into();
    room.players.insert(payload.player_id, player);
    game_events::player_joined(&mut room, &handle.channel, summary);
    info!(room = %code, player = %payload.player_id, "player joined");

    Ok(RoomSnapshot::from_room(&room))
}

/// Remove a player. Idempotent: unknown players and unknown rooms are not
/// errors. Leaving mid-question can complete the round, in which case it
/// settles here. An emptied room is torn down by the cleanup sweep after its
/// grace period.
pub async fn leave_room(state: &SharedState, code: &str, player_id: Uuid) -> Result<(), ServiceError> {
    let Ok(handle) = state.room(code) else {
        return Ok(());
    };

    let settled = {
        let mut room = handle.room.lock().await;
        let Some(player) = room.players.shift_remove(&player_id) else {
            return Ok(());
        };
        game_events::player_left(&mut room, &handle.channel, player_id);
        info!(room = %code, player = %player_id, "player left");

        if player.is_captain {
            if let Some(team) = player.team {
                if let Some(captain_id) = room.promote_oldest_member(team) {
                    game_events::captain_changed(&mut room, &handle.channel, team, captain_id);
                }
            }
        }

        if room.status == RoomStatus::Playing && room.round_complete() {
            answers::settle_round(&mut room, &handle.channel, state.config())
        } else {
            None
        }
    };

    if let Some(settled) = settled {
        answers::dispatch_settlement(state, code, settled).await;
    }
    Ok(())
}

/// Flip a player's readiness. Calling twice restores the original state.
pub async fn toggle_ready(
    state: &SharedState,
    code: &str,
    player_id: Uuid,
) -> Result<ReadyResponse, ServiceError> {
    let handle = state.room(code)?;
    let mut room = handle.room.lock().await;

    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::RoomAlreadyStarted(code.to_string()));
    }
    let is_ready = match room.players.get_mut(&player_id) {
        Some(player) => {
            player.is_ready = !player.is_ready;
            player.is_ready
        }
        None => {
            return Err(ServiceError::NotAuthorized(
                "player is not in this room".into(),
            ));
        }
    };
    game_events::player_ready(&mut room, &handle.channel, player_id, is_ready);

    Ok(ReadyResponse {
        is_ready,
        all_ready: room.all_ready(),
    })
}

/// Move a player onto a team, respecting the per-team capacity of half the
/// roster cap. The first occupant of a captain-less team becomes captain; a
/// departing captain's old team promotes its oldest remaining member.
pub async fn switch_team(
    state: &SharedState,
    code: &str,
    payload: SwitchTeamRequest,
) -> Result<(), ServiceError> {
    let handle = state.room(code)?;
    let mut room = handle.room.lock().await;

    if room.status != RoomStatus::Waiting {
        return Err(ServiceError::RoomAlreadyStarted(code.to_string()));
    }
    if room.config.mode != GameMode::Team {
        return Err(ServiceError::InvalidConfig(
            "this room is not in team mode".into(),
        ));
    }

    let (previous_team, was_captain) = match room.players.get(&payload.player_id) {
        Some(player) => (player.team, player.is_captain),
        None => {
            return Err(ServiceError::NotAuthorized(
                "player is not in this room".into(),
            ));
        }
    };
    if previous_team == Some(payload.team) {
        return Ok(());
    }

    let team_capacity = room.config.max_players / 2;
    if room.team_members(payload.team).count() >= team_capacity {
        return Err(ServiceError::TeamFull);
    }

    let becomes_captain = room.captain_of(payload.team).is_none();
    if let Some(player) = room.players.get_mut(&payload.player_id) {
        player.team = Some(payload.team);
        player.is_captain = becomes_captain;
    }
    game_events::team_changed(&mut room, &handle.channel, payload.player_id, payload.team);
    if becomes_captain {
        game_events::captain_changed(&mut room, &handle.channel, payload.team, payload.player_id);
    }
    if was_captain {
        if let Some(old_team) = previous_team {
            if let Some(captain_id) = room.promote_oldest_member(old_team) {
                game_events::captain_changed(&mut room, &handle.channel, old_team, captain_id);
            }
        }
    }

    Ok(())
}

/// Start the match. Creator-only; requires at least two players, everyone
/// ready, and (in TEAM mode) everyone on a team. The `waiting → starting`
/// transition under the room lock is the compare-and-swap that makes racing
/// start requests resolve to exactly one winner; the loser observes a room
/// that already left `waiting`. Questions load with no lock held.
pub async fn start_game(
    state: &SharedState,
    code: &str,
    requester_id: Uuid,
) -> Result<(), ServiceError> {
    let handle = state.room(code)?;
    let question_count = {
        let mut room = handle.room.lock().await;
        if requester_id != room.creator_id {
            return Err(ServiceError::NotAuthorized(
                "only the creator may start the game".into(),
            ));
        }
        if room.status != RoomStatus::Waiting {
            return Err(ServiceError::RoomAlreadyStarted(code.to_string()));
        }
        if room.players.len() < 2 {
            return Err(ServiceError::NotReady(
                "at least 2 players are required".into(),
            ));
        }
        if !room.all_ready() {
            return Err(ServiceError::NotReady("every player must be ready".into()));
        }
        if room.config.mode == GameMode::Team
            && room.players.values().any(|player| player.team.is_none())
        {
            return Err(ServiceError::NotReady(
                "every player must pick a team".into(),
            ));
        }

        room.status = room.status.advance(RoomStatus::Starting)?;
        game_events::game_starting(&mut room, &handle.channel);
        room.config.question_count
    };

    let loaded = state
        .repository()
        .load_questions(QuestionRequest {
            count: question_count,
        })
        .await;

    let mut room = handle.room.lock().await;
    match loaded {
        Ok(questions) => {
            if room.status != RoomStatus::Starting {
                return Err(ServiceError::RoomAlreadyStarted(code.to_string()));
            }
            room.questions = questions;
            room.status = room.status.advance(RoomStatus::Playing)?;
            info!(room = %code, questions = room.questions.len(), "game started");
            sequencer::open_question(state, &mut room, &handle.channel, 0)
        }
        Err(err) => {
            error!(room = %code, error = %err, "failed to load questions; ending room");
            sequencer::force_finish(&mut room, &handle.channel);
            Err(ServiceError::Internal("failed to load questions".into()))
        }
    }
}

/// Authoritative polling view of a room.
pub async fn snapshot(state: &SharedState, code: &str) -> Result<RoomSnapshot, ServiceError> {
    let handle = state.room(code)?;
    let room = handle.room.lock().await;
    Ok(RoomSnapshot::from_room(&room))
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[index] as char
        })
        .collect()
}
