use crate::{IndexSchema, Mapper, MapperFactory, MappingError, MappingResult, TypeDiscovery};
use searchbridge_types::DomainType;
use std::collections::{BTreeMap, BTreeSet};

/// An in-memory catalog of the host's domain types.
///
/// Types declared with [`SchemaCatalog::declare`] are searchable; types
/// declared with [`SchemaCatalog::declare_plain`] are persisted but never
/// indexed. Hosts that derive schemas at build time can populate one of
/// these at startup and hand it to the plugin as both capabilities.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<DomainType, IndexSchema>,
    plain: BTreeSet<DomainType>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a searchable type. A later declaration replaces an earlier one.
    pub fn declare(&mut self, schema: IndexSchema) -> &mut Self {
        self.plain.remove(&schema.domain_type);
        self.schemas.insert(schema.domain_type.clone(), schema);
        self
    }

    /// Registers a persisted type that is not searchable.
    pub fn declare_plain(&mut self, domain_type: impl Into<DomainType>) -> &mut Self {
        let domain_type = domain_type.into();
        if !self.schemas.contains_key(&domain_type) {
            self.plain.insert(domain_type);
        }
        self
    }

    pub fn schema(&self, domain_type: &DomainType) -> Option<&IndexSchema> {
        self.schemas.get(domain_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len() + self.plain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MapperFactory for SchemaCatalog {
    fn derive_mapper(&self, domain_type: &DomainType) -> MappingResult<Mapper> {
        let schema = self
            .schemas
            .get(domain_type)
            .ok_or_else(|| MappingError::MissingSchema(domain_type.clone()))?;
        Mapper::from_schema(schema)
    }
}

impl TypeDiscovery for SchemaCatalog {
    fn model_types(&self) -> Vec<DomainType> {
        let mut all: Vec<DomainType> = self
            .schemas
            .keys()
            .chain(self.plain.iter())
            .cloned()
            .collect();
        all.sort();
        all
    }

    fn searchable_types(&self) -> Vec<DomainType> {
        self.schemas.keys().cloned().collect()
    }

    fn is_searchable(&self, domain_type: &DomainType) -> bool {
        self.schemas.contains_key(domain_type)
    }
}
