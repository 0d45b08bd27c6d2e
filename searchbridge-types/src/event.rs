//! Event vocabulary for index synchronization.
//!
//! A host mutation ([`MutationKind`]) is collapsed into one of two index
//! operations ([`IndexEventKind`]): creates and updates both become an
//! upsert, deletes become a document removal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an index event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new time-ordered event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The mutation a host notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Persisted,
    Updated,
    Deleted,
}

impl MutationKind {
    /// The index operation this mutation requires.
    pub const fn index_kind(self) -> IndexEventKind {
        match self {
            Self::Persisted | Self::Updated => IndexEventKind::Index,
            Self::Deleted => IndexEventKind::Delete,
        }
    }
}

/// The operation an index event applies to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexEventKind {
    /// Upsert the subject's document.
    Index,
    /// Remove the subject's document.
    Delete,
}

impl fmt::Display for IndexEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => f.write_str("INDEX"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

impl FromStr for IndexEventKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INDEX" => Ok(Self::Index),
            "DELETE" => Ok(Self::Delete),
            _ => Err(crate::Error::UnknownEventKind(s.to_string())),
        }
    }
}
