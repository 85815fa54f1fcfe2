use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload plus the size of the room registry.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(state.rooms().len())
}
