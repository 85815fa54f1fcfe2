/// Answer and suggestion collection plus exactly-once settlement.
pub mod answers;
/// Background garbage collection of dead rooms.
pub mod cleanup;
/// OpenAPI documentation generation.
pub mod documentation;
/// Versioned event emission helpers.
pub mod game_events;
/// Health check service.
pub mod health_service;
/// Room lifecycle and roster operations.
pub mod room_service;
/// Scoring math for question settlement.
pub mod scoring;
/// Per-room question clock and deadline timers.
pub mod sequencer;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
