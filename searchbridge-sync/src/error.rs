//! Error types for the sync layer.

use crate::config::DeliveryMode;
use searchbridge_engine::EngineError;
use searchbridge_model::MappingError;
use searchbridge_types::DomainType;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing with the search engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A configuration value could not be used.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No engine client could be obtained at startup.
    #[error("search engine client unavailable: {0}")]
    ClientUnavailable(#[source] EngineError),

    /// The type's search mapping could not be derived.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// No searchable type uses this index type name.
    #[error("type name '{0}' is not searchable")]
    UnknownTypeName(String),

    /// The domain type is not marked searchable.
    #[error("{0} is not searchable")]
    NotSearchable(DomainType),

    /// The host handed over something the bridge can never index.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An engine call failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The plugin has not been started, or has been stopped.
    #[error("search plugin is not running")]
    NotRunning,

    /// No handler is registered for the delivery mode.
    #[error("no handler registered for delivery mode {0}")]
    NoHandler(DeliveryMode),

    /// A delivery worker has shut down.
    #[error("delivery channel closed")]
    ChannelClosed,
}
