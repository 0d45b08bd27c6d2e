//! Per-type mapper cache.

use crate::error::SyncResult;
use searchbridge_model::{Mapper, MapperFactory, MappingError};
use searchbridge_types::DomainType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;
use tracing::debug;

type Slot = Arc<OnceCell<Arc<Mapper>>>;

/// Caches one [`Mapper`] per domain type for the life of the plugin.
///
/// Concurrent first calls for the same type share a single derivation;
/// callers for other types are not blocked by it. A failed derivation leaves
/// the slot empty so the next call retries.
///
/// Each index type name belongs to one domain type: a mapper whose type
/// name is already held by another type fails with
/// [`MappingError::DuplicateTypeName`].
pub struct MapperRegistry {
    factory: Arc<dyn MapperFactory>,
    slots: Mutex<HashMap<DomainType, Slot>>,
    claims: Mutex<HashMap<String, DomainType>>,
}

impl MapperRegistry {
    pub fn new(factory: Arc<dyn MapperFactory>) -> Self {
        Self {
            factory,
            slots: Mutex::new(HashMap::new()),
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached mapper for `domain_type`, deriving it on first use.
    pub async fn get_mapper(&self, domain_type: &DomainType) -> SyncResult<Arc<Mapper>> {
        let slot = self.slot(domain_type);
        let mapper = slot
            .get_or_try_init(|| async {
                debug!(domain_type = %domain_type, "Deriving mapper");
                let mapper = self.factory.derive_mapper(domain_type)?;
                self.claim(&mapper)?;
                Ok::<_, MappingError>(Arc::new(mapper))
            })
            .await?;
        Ok(Arc::clone(mapper))
    }

    /// The cached mapper, without deriving one.
    pub fn cached(&self, domain_type: &DomainType) -> Option<Arc<Mapper>> {
        self.slots()
            .get(domain_type)
            .and_then(|slot| slot.get().cloned())
    }

    /// Drops the cached mapper so the next lookup derives a fresh one.
    pub fn invalidate(&self, domain_type: &DomainType) {
        if self.slots().remove(domain_type).is_some() {
            debug!(domain_type = %domain_type, "Mapper invalidated");
        }
        self.claims().retain(|_, owner| owner != domain_type);
    }

    /// Number of types with a derived mapper.
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, domain_type: &DomainType) -> Slot {
        Arc::clone(self.slots().entry(domain_type.clone()).or_default())
    }

    /// The domain type holding `type_name`, if any mapper claimed it.
    pub fn owner_of(&self, type_name: &str) -> Option<DomainType> {
        self.claims().get(type_name).cloned()
    }

    fn claim(&self, mapper: &Mapper) -> Result<(), MappingError> {
        let mut claims = self.claims();
        match claims.get(mapper.type_name()) {
            Some(owner) if owner != mapper.domain_type() => {
                Err(MappingError::DuplicateTypeName {
                    domain_type: mapper.domain_type().clone(),
                    type_name: mapper.type_name().to_string(),
                    claimed_by: owner.clone(),
                })
            }
            _ => {
                claims.insert(mapper.type_name().to_string(), mapper.domain_type().clone());
                Ok(())
            }
        }
    }

    fn claims(&self) -> MutexGuard<'_, HashMap<String, DomainType>> {
        self.claims.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<DomainType, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
