mod common;

use common::*;
use searchbridge_model::{
    FieldMapping, IndexSchema, Mapper, MapperFactory, MappingError, MappingResult, SchemaCatalog,
};
use searchbridge_sync::{MapperRegistry, SyncError};
use searchbridge_types::DomainType;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts derivations and fails the first `failures` of them.
struct CountingFactory {
    catalog: SchemaCatalog,
    derived: AtomicUsize,
    failures: AtomicUsize,
}

impl CountingFactory {
    fn new(failures: usize) -> Self {
        Self {
            catalog: blog_catalog(),
            derived: AtomicUsize::new(0),
            failures: AtomicUsize::new(failures),
        }
    }

    fn derived(&self) -> usize {
        self.derived.load(Ordering::SeqCst)
    }
}

impl MapperFactory for CountingFactory {
    fn derive_mapper(&self, domain_type: &DomainType) -> MappingResult<Mapper> {
        self.derived.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MappingError::MissingSchema(domain_type.clone()));
        }
        self.catalog.derive_mapper(domain_type)
    }
}

#[tokio::test]
async fn returns_the_same_mapper_on_every_call() {
    init_tracing();
    let factory = Arc::new(CountingFactory::new(0));
    let registry = MapperRegistry::new(factory.clone());
    let article = DomainType::new(ARTICLE);

    let first = registry.get_mapper(&article).await.unwrap();
    let second = registry.get_mapper(&article).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.type_name(), ARTICLE_INDEX);
    assert_eq!(factory.derived(), 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn failed_derivation_is_not_cached() {
    let factory = Arc::new(CountingFactory::new(1));
    let registry = MapperRegistry::new(factory.clone());
    let article = DomainType::new(ARTICLE);

    let err = registry.get_mapper(&article).await.unwrap_err();
    assert!(matches!(err, SyncError::Mapping(MappingError::MissingSchema(_))));
    assert!(registry.cached(&article).is_none());
    assert!(registry.is_empty());

    let mapper = registry.get_mapper(&article).await.unwrap();
    assert_eq!(mapper.type_name(), ARTICLE_INDEX);
    assert_eq!(factory.derived(), 2);
}

#[tokio::test]
async fn unknown_type_reports_missing_schema() {
    let registry = MapperRegistry::new(Arc::new(blog_catalog()));
    let err = registry.get_mapper(&DomainType::new(PLAIN)).await.unwrap_err();
    assert!(matches!(err, SyncError::Mapping(MappingError::MissingSchema(t)) if t.as_str() == PLAIN));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_derive_once() {
    let factory = Arc::new(CountingFactory::new(0));
    let registry = Arc::new(MapperRegistry::new(factory.clone()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_mapper(&DomainType::new(ARTICLE)).await })
        })
        .collect();

    let mut mappers = Vec::new();
    for task in tasks {
        mappers.push(task.await.unwrap().unwrap());
    }

    assert_eq!(factory.derived(), 1);
    assert!(mappers.iter().all(|m| Arc::ptr_eq(m, &mappers[0])));
}

#[tokio::test]
async fn invalidate_forces_a_fresh_derivation() {
    let factory = Arc::new(CountingFactory::new(0));
    let registry = MapperRegistry::new(factory.clone());
    let article = DomainType::new(ARTICLE);

    let before = registry.get_mapper(&article).await.unwrap();
    registry.invalidate(&article);
    assert!(registry.cached(&article).is_none());

    let after = registry.get_mapper(&article).await.unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(factory.derived(), 2);
}

#[tokio::test]
async fn types_are_cached_independently() {
    let registry = MapperRegistry::new(Arc::new(blog_catalog()));
    registry.get_mapper(&DomainType::new(ARTICLE)).await.unwrap();
    registry.get_mapper(&DomainType::new(COMMENT)).await.unwrap();
    assert_eq!(registry.len(), 2);

    registry.invalidate(&DomainType::new(ARTICLE));
    assert_eq!(registry.len(), 1);
    assert!(registry.cached(&DomainType::new(COMMENT)).is_some());
}

fn post_catalog(type_name: Option<&str>) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    for t in ["models.blog.Post", "models.forum.Post"] {
        let schema = IndexSchema::new(t, vec![FieldMapping::text("title")]);
        catalog.declare(match type_name {
            Some(name) => schema.with_type_name(name),
            None => schema,
        });
    }
    catalog
}

#[tokio::test]
async fn same_simple_name_in_two_namespaces_maps_to_two_type_names() {
    let registry = MapperRegistry::new(Arc::new(post_catalog(None)));
    let blog = registry.get_mapper(&DomainType::new("models.blog.Post")).await.unwrap();
    let forum = registry.get_mapper(&DomainType::new("models.forum.Post")).await.unwrap();

    assert_ne!(blog.type_name(), forum.type_name());
    assert_eq!(
        registry.owner_of("models_forum_post"),
        Some(DomainType::new("models.forum.Post"))
    );
}

#[tokio::test]
async fn a_type_name_belongs_to_one_domain_type() {
    let registry = MapperRegistry::new(Arc::new(post_catalog(Some("post"))));
    let blog = DomainType::new("models.blog.Post");
    let forum = DomainType::new("models.forum.Post");

    registry.get_mapper(&blog).await.unwrap();
    let err = registry.get_mapper(&forum).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Mapping(MappingError::DuplicateTypeName { ref type_name, ref claimed_by, .. })
            if type_name == "post" && *claimed_by == blog
    ));
    assert!(registry.cached(&forum).is_none());

    // The owner can be re-derived after an invalidate.
    registry.invalidate(&blog);
    registry.get_mapper(&blog).await.unwrap();
    assert_eq!(registry.owner_of("post"), Some(blog.clone()));

    registry.invalidate(&blog);
    assert_eq!(registry.owner_of("post"), None);
    registry.get_mapper(&forum).await.unwrap();
    assert_eq!(registry.owner_of("post"), Some(forum));
}
