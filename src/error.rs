//! Error taxonomy. `ServiceError` is the caller-visible failure set of the
//! game core; `AppError` is its HTTP projection. Every error maps to a stable
//! machine-readable code plus a human string.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::machine::InvalidTransition;

/// Recoverable failures returned synchronously by game operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No room exists under the given code.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// The roster is at capacity.
    #[error("room `{0}` is full")]
    RoomFull(String),
    /// The room left the `Waiting` state and can no longer accept this action.
    #[error("room `{0}` has already started")]
    RoomAlreadyStarted(String),
    /// The requester may not perform this action (non-creator start,
    /// non-captain answer in TEAM mode, unknown player).
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    /// Not enough players, or not everyone is ready.
    #[error("not ready: {0}")]
    NotReady(String),
    /// Late submission, or a submission for a question that is not current.
    #[error("answer window closed: {0}")]
    AnswerWindowClosed(String),
    /// The target team is at capacity.
    #[error("team is full")]
    TeamFull,
    /// Malformed or out-of-bounds room configuration or request.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Internal invariant breach. The affected room is forced to `Finished`.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::RoomNotFound(_) => "room_not_found",
            ServiceError::RoomFull(_) => "room_full",
            ServiceError::RoomAlreadyStarted(_) => "room_already_started",
            ServiceError::NotAuthorized(_) => "not_authorized",
            ServiceError::NotReady(_) => "not_ready",
            ServiceError::AnswerWindowClosed(_) => "answer_window_closed",
            ServiceError::TeamFull => "team_full",
            ServiceError::InvalidConfig(_) => "invalid_config",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidConfig(format!("validation failed: {err}"))
    }
}

/// HTTP-facing error wrapper.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct AppError {
    #[source]
    source: ServiceError,
}

impl From<ServiceError> for AppError {
    fn from(source: ServiceError) -> Self {
        Self { source }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        Self {
            source: err.into(),
        }
    }
}

/// JSON body returned for every error response.
#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.source {
            ServiceError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::RoomFull(_)
            | ServiceError::RoomAlreadyStarted(_)
            | ServiceError::NotReady(_)
            | ServiceError::AnswerWindowClosed(_)
            | ServiceError::TeamFull => StatusCode::CONFLICT,
            ServiceError::NotAuthorized(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            code: self.source.code(),
            message: self.source.to_string(),
        });

        (status, payload).into_response()
    }
}
