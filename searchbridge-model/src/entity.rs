use searchbridge_types::DomainType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A persisted object as the host's persistence layer hands it over.
///
/// The `data` field holds the object's fields as JSON; which of them end up
/// in the search document is decided by the type's [`crate::Mapper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub domain_type: DomainType,
    pub data: serde_json::Value,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        domain_type: impl Into<DomainType>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            domain_type: domain_type.into(),
            data,
        }
    }

    /// Extract a string value from `data` using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value from `data` using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.data.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value from `data` using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.data.pointer(pointer).and_then(|v| v.as_f64())
    }
}

/// Anything a host lifecycle notification can carry.
///
/// Only [`Entity`] values may be indexed. Other subjects still report a
/// domain type so the searchable check can run first; a searchable subject
/// that is not an entity is a host integration defect.
pub trait Subject: fmt::Debug + Send + Sync {
    /// The runtime type of the subject.
    fn domain_type(&self) -> &DomainType;

    /// Returns the subject as a persisted entity, or `None` if it is not one.
    fn into_entity(self: Arc<Self>) -> Option<Arc<Entity>> {
        None
    }
}

impl Subject for Entity {
    fn domain_type(&self) -> &DomainType {
        &self.domain_type
    }

    fn into_entity(self: Arc<Self>) -> Option<Arc<Entity>> {
        Some(self)
    }
}
