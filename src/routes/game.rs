use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::room::{AnswerRequest, AnswerResponse, RoomSnapshot, SuggestRequest},
    error::AppError,
    services::{answers, room_service},
    state::SharedState,
};

/// Routes handling in-match operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/answer", post(submit_answer))
        .route("/rooms/{code}/suggest", post(submit_suggestion))
        .route("/rooms/{code}/snapshot", get(snapshot))
}

/// Submit an authoritative answer for the current question.
#[utoipa::path(
    post,
    path = "/rooms/{code}/answer",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer accepted", body = AnswerResponse),
        (status = 403, description = "Submitter is not allowed to answer"),
        (status = 409, description = "Answer window closed")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = answers::submit_answer(&state, &code, payload).await?;
    Ok(Json(response))
}

/// Suggest an option to teammates (TEAM mode only).
#[utoipa::path(
    post,
    path = "/rooms/{code}/suggest",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggestion recorded"),
        (status = 409, description = "Answer window closed")
    )
)]
pub async fn submit_suggestion(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<SuggestRequest>,
) -> Result<(), AppError> {
    answers::submit_suggestion(&state, &code, payload).await?;
    Ok(())
}

/// Authoritative polling view: full room state plus the room version.
#[utoipa::path(
    get,
    path = "/rooms/{code}/snapshot",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Current room snapshot", body = RoomSnapshot),
        (status = 404, description = "Unknown room code")
    )
)]
pub async fn snapshot(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    let view = room_service::snapshot(&state, &code).await?;
    Ok(Json(view))
}
