use crate::{Mapper, MappingResult};
use searchbridge_types::DomainType;

/// Builds the search mapping for a domain type.
///
/// Implementations may do expensive work (schema derivation, reflection);
/// callers are expected to cache the result.
pub trait MapperFactory: Send + Sync {
    fn derive_mapper(&self, domain_type: &DomainType) -> MappingResult<Mapper>;
}

/// Enumerates the host's domain types.
pub trait TypeDiscovery: Send + Sync {
    /// Every persisted type the host knows about, searchable or not.
    fn model_types(&self) -> Vec<DomainType>;

    /// The types marked searchable.
    fn searchable_types(&self) -> Vec<DomainType>;

    /// Returns true if `domain_type` is marked searchable.
    fn is_searchable(&self, domain_type: &DomainType) -> bool {
        self.searchable_types().iter().any(|t| t == domain_type)
    }
}
