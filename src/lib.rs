//! Library crate for quiz-battle-back, exposing modules for the binary and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Injected question/result repository boundary.
pub mod dao;
/// HTTP and SSE payload types.
pub mod dto;
/// Error taxonomy and HTTP projection.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Game logic services.
pub mod services;
/// Shared application state and the room domain model.
pub mod state;
