//! Core type definitions for searchbridge.
//!
//! This crate defines the identifiers shared by every layer of the bridge:
//! - [`DomainType`], the host-supplied name of a class of persisted objects
//! - [`EventId`] (UUID v7) for index events
//! - [`IndexEventKind`] and [`MutationKind`], the vocabulary of index sync
//!
//! Nothing here knows about a particular search engine or host framework.

mod event;
mod ids;

pub use event::{EventId, IndexEventKind, MutationKind};
pub use ids::DomainType;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid domain type: {0:?}")]
    InvalidDomainType(String),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
}
