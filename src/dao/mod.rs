//! Injected storage boundary. The core does not own a question bank or a
//! results store; it consumes this trait. The built-in implementation keeps
//! everything in memory.

pub mod memory;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::state::room::{FinalScore, Question};

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error raised by repository backends regardless of the underlying store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend could not serve the request.
    #[error("repository unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl RepositoryError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        RepositoryError::Unavailable {
            message: message.into(),
        }
    }
}

/// Parameters for a question load, derived from the room configuration.
#[derive(Debug, Clone, Copy)]
pub struct QuestionRequest {
    /// Exact number of questions the match needs.
    pub count: usize,
}

/// Abstraction over the question bank and the results archive.
pub trait QuestionRepository: Send + Sync {
    /// Fetch exactly `request.count` questions for a new match.
    fn load_questions(
        &self,
        request: QuestionRequest,
    ) -> BoxFuture<'static, RepositoryResult<Vec<Question>>>;

    /// Archive the final standings of a finished match.
    fn persist_result(
        &self,
        room_code: &str,
        scores: &[FinalScore],
    ) -> BoxFuture<'static, RepositoryResult<()>>;
}
