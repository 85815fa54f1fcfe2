use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::room::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, PlayerActionRequest,
        ReadyResponse, RoomListResponse, RoomSnapshot, SwitchTeamRequest,
    },
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling room lifecycle and roster operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/leave", post(leave_room))
        .route("/rooms/{code}/ready", post(toggle_ready))
        .route("/rooms/{code}/team", post(switch_team))
        .route("/rooms/{code}/start", post(start_game))
}

/// Create a room and register the creator as its first player.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid configuration")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let created = room_service::create_room(&state, payload)?;
    Ok(Json(created))
}

/// List rooms that are still accepting players.
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    responses((status = 200, description = "Joinable rooms", body = RoomListResponse))
)]
pub async fn list_rooms(State(state): State<SharedState>) -> Json<RoomListResponse> {
    Json(room_service::list_rooms(&state).await)
}

/// Join a waiting room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined; current snapshot", body = RoomSnapshot),
        (status = 404, description = "Unknown room code"),
        (status = 409, description = "Room full or already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let snapshot = room_service::join_room(&state, &code, payload).await?;
    Ok(Json(snapshot))
}

/// Leave a room. Idempotent.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = PlayerActionRequest,
    responses((status = 200, description = "Left the room"))
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<PlayerActionRequest>,
) -> Result<(), AppError> {
    room_service::leave_room(&state, &code, payload.player_id).await?;
    Ok(())
}

/// Flip the caller's readiness flag.
#[utoipa::path(
    post,
    path = "/rooms/{code}/ready",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Readiness toggled", body = ReadyResponse),
        (status = 409, description = "Room already started")
    )
)]
pub async fn toggle_ready(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<PlayerActionRequest>,
) -> Result<Json<ReadyResponse>, AppError> {
    let readiness = room_service::toggle_ready(&state, &code, payload.player_id).await?;
    Ok(Json(readiness))
}

/// Move the caller onto a team (TEAM mode only).
#[utoipa::path(
    post,
    path = "/rooms/{code}/team",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = SwitchTeamRequest,
    responses(
        (status = 200, description = "Team switched"),
        (status = 409, description = "Target team is full")
    )
)]
pub async fn switch_team(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SwitchTeamRequest>,
) -> Result<(), AppError> {
    room_service::switch_team(&state, &code, payload).await?;
    Ok(())
}

/// Start the match. Creator only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/start",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = PlayerActionRequest,
    responses(
        (status = 200, description = "Game started"),
        (status = 403, description = "Requester is not the creator"),
        (status = 409, description = "Players missing, unready, or already started")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<PlayerActionRequest>,
) -> Result<(), AppError> {
    room_service::start_game(&state, &code, payload.player_id).await?;
    Ok(())
}
