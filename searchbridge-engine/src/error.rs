//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by a search engine client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine could not be reached or refused the connection.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("change feed already running: {0}")]
    FeedAlreadyRunning(String),

    #[error("change feed not running: {0}")]
    FeedNotRunning(String),

    /// The engine rejected the request.
    #[error("request failed: {0}")]
    Request(String),

    /// The client was closed.
    #[error("client closed")]
    Closed,
}
