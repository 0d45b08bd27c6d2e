//! Reverse lookup from index type name to domain type.

use crate::error::{SyncError, SyncResult};
use crate::registry::MapperRegistry;
use searchbridge_model::TypeDiscovery;
use searchbridge_types::DomainType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Resolves an index type name (as found in search hits) back to the
/// domain type it was derived from.
pub struct TypeLookup {
    registry: Arc<MapperRegistry>,
    discovery: Arc<dyn TypeDiscovery>,
    by_type_name: Mutex<HashMap<String, DomainType>>,
}

impl TypeLookup {
    pub fn new(registry: Arc<MapperRegistry>, discovery: Arc<dyn TypeDiscovery>) -> Self {
        Self {
            registry,
            discovery,
            by_type_name: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the domain type whose mapper declares `type_name`.
    ///
    /// On a cache miss every searchable type is mapped in turn. A type whose
    /// mapper cannot be derived is skipped, not reported.
    pub async fn lookup_domain_type(&self, type_name: &str) -> SyncResult<DomainType> {
        if let Some(hit) = self.cache().get(type_name) {
            return Ok(hit.clone());
        }

        for candidate in self.discovery.searchable_types() {
            let mapper = match self.registry.get_mapper(&candidate).await {
                Ok(mapper) => mapper,
                Err(e) => {
                    debug!(domain_type = %candidate, "Skipping unmappable type during lookup: {e}");
                    continue;
                }
            };
            self.cache()
                .insert(mapper.type_name().to_string(), candidate.clone());
            if mapper.type_name() == type_name {
                return Ok(candidate);
            }
        }

        Err(SyncError::UnknownTypeName(type_name.to_string()))
    }

    /// Removes every cached name that points at `domain_type`.
    pub fn forget(&self, domain_type: &DomainType) {
        self.cache().retain(|_, t| t != domain_type);
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, DomainType>> {
        self.by_type_name
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
