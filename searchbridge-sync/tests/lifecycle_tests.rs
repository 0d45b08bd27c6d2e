mod common;

use common::*;
use pretty_assertions::assert_eq;
use searchbridge_engine::mock::{EngineCall, EngineOp, RecordingConnector};
use searchbridge_engine::{ChangeFeed, DatabaseConnection, SearchClient};
use searchbridge_model::{IndexSchema, SchemaCatalog};
use searchbridge_sync::{IndexLifecycleManager, IndexStart, MapperRegistry, RiverStart, SyncError};
use searchbridge_types::DomainType;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

async fn manager_over(
    connector: &RecordingConnector,
    catalog: SchemaCatalog,
) -> Arc<IndexLifecycleManager> {
    init_tracing();
    let client = connect(connector).await;
    let registry = Arc::new(MapperRegistry::new(Arc::new(catalog)));
    Arc::new(IndexLifecycleManager::new(
        client,
        registry,
        DatabaseConnection::default(),
    ))
}

fn article() -> DomainType {
    DomainType::new(ARTICLE)
}

fn comment() -> DomainType {
    DomainType::new(COMMENT)
}

#[tokio::test]
async fn first_start_creates_index_and_applies_mapping() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;

    assert_eq!(manager.start_index_if_needed(&article()).await.unwrap(), IndexStart::Created);
    assert_eq!(
        manager.start_index_if_needed(&article()).await.unwrap(),
        IndexStart::AlreadyStarted
    );

    let log = connector.log();
    assert_eq!(log.creates_of(ARTICLE_INDEX), 1);
    assert_eq!(log.count(|c| *c == EngineCall::PutMapping(ARTICLE_INDEX.into())), 1);
    let engine = connector.client().unwrap();
    let mapping = engine.engine().mapping(ARTICLE_INDEX).unwrap();
    assert_eq!(mapping[ARTICLE_INDEX]["properties"]["author"]["type"], "keyword");
    assert!(manager.is_index_started(&article()));
}

#[tokio::test]
async fn concurrent_first_calls_create_exactly_once() {
    let connector = RecordingConnector::new().with_create_delay(Duration::from_millis(20));
    let manager = manager_over(&connector, blog_catalog()).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.start_index_if_needed(&article()).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() == IndexStart::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(connector.log().creates_of(ARTICLE_INDEX), 1);
}

#[tokio::test]
async fn a_slow_type_does_not_serialize_other_types() {
    let connector = RecordingConnector::new().with_create_delay(Duration::from_millis(20));
    let manager = manager_over(&connector, blog_catalog()).await;

    let (article_ty, comment_ty) = (article(), comment());
    let (a, c) = tokio::join!(
        manager.start_index_if_needed(&article_ty),
        manager.start_index_if_needed(&comment_ty),
    );
    assert_eq!(a.unwrap(), IndexStart::Created);
    assert_eq!(c.unwrap(), IndexStart::Created);
    assert_eq!(
        manager.started_indices(),
        BTreeSet::from([article(), comment()])
    );
}

#[tokio::test]
async fn failed_creation_leaves_type_unstarted() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;
    connector.failures().fail(EngineOp::CreateIndex, ARTICLE_INDEX);

    let err = manager.start_index_if_needed(&article()).await.unwrap_err();
    assert!(matches!(err, SyncError::Engine(_)));
    assert!(!manager.is_index_started(&article()));

    connector.failures().heal(EngineOp::CreateIndex, ARTICLE_INDEX);
    assert_eq!(manager.start_index_if_needed(&article()).await.unwrap(), IndexStart::Created);
    assert_eq!(connector.log().creates_of(ARTICLE_INDEX), 2);
}

#[tokio::test]
async fn existing_engine_index_is_adopted() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;
    let client = connector.client().unwrap();
    client.create_index(ARTICLE_INDEX).await.unwrap();

    assert_eq!(manager.start_index_if_needed(&article()).await.unwrap(), IndexStart::Created);
    assert!(client.engine().mapping(ARTICLE_INDEX).is_some());
}

#[tokio::test]
async fn mapping_failure_is_reported() {
    let connector = RecordingConnector::new();
    let mut catalog = SchemaCatalog::new();
    catalog.declare(IndexSchema::new("models.blog.Broken", Vec::new()));
    let manager = manager_over(&connector, catalog).await;

    let err = manager
        .start_index_if_needed(&DomainType::new("models.blog.Broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Mapping(_)));
    assert_eq!(connector.log().count(|c| matches!(c, EngineCall::CreateIndex(_))), 0);
}

#[tokio::test]
async fn river_starts_only_for_types_with_a_source() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;

    assert_eq!(manager.start_river_if_needed(&article()).await.unwrap(), RiverStart::Started);
    assert_eq!(
        manager.start_river_if_needed(&article()).await.unwrap(),
        RiverStart::AlreadyStarted
    );
    assert_eq!(manager.start_river_if_needed(&comment()).await.unwrap(), RiverStart::NoSource);
    assert_eq!(manager.start_river_if_needed(&comment()).await.unwrap(), RiverStart::NoSource);

    assert_eq!(manager.started_rivers(), BTreeSet::from([article()]));
    let feeds = connector.client().unwrap().engine().running_feeds();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].name, ARTICLE_FEED);
    assert_eq!(feeds[0].query, ARTICLE_FEED_QUERY);
}

#[tokio::test]
async fn reindex_of_unstarted_type_only_creates() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;

    manager.reindex(&comment()).await.unwrap();

    let log = connector.log();
    assert_eq!(log.deletes_of(COMMENT_INDEX), 0);
    assert_eq!(log.creates_of(COMMENT_INDEX), 1);
    assert!(manager.is_index_started(&comment()));
}

#[tokio::test]
async fn reindex_of_started_type_deletes_then_creates() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;
    manager.start_index_if_needed(&article()).await.unwrap();
    manager.start_river_if_needed(&article()).await.unwrap();
    connector.log().clear();

    manager.reindex(&article()).await.unwrap();

    assert_eq!(
        connector.log().calls(),
        vec![
            EngineCall::DeleteIndex(ARTICLE_INDEX.into()),
            EngineCall::CreateIndex(ARTICLE_INDEX.into()),
            EngineCall::PutMapping(ARTICLE_INDEX.into()),
            EngineCall::StopChangeFeed(ARTICLE_FEED.into()),
            EngineCall::StartChangeFeed(ARTICLE_FEED.into()),
        ]
    );
    assert!(manager.is_index_started(&article()));
    assert!(manager.is_river_started(&article()));
}

#[tokio::test]
async fn reindex_attempts_the_river_even_if_the_index_fails() {
    let connector = RecordingConnector::new();
    let manager = manager_over(&connector, blog_catalog()).await;
    manager.start_index_if_needed(&article()).await.unwrap();
    connector.failures().fail(EngineOp::DeleteIndex, ARTICLE_INDEX);

    let err = manager.reindex(&article()).await.unwrap_err();
    assert!(matches!(err, SyncError::Engine(_)));
    assert!(manager.is_index_started(&article()));
    assert!(manager.is_river_started(&article()));
}

#[tokio::test]
async fn resources_left_by_an_earlier_process_are_adopted() {
    init_tracing();
    let connector = RecordingConnector::persistent();
    let earlier = connect(&connector).await;
    earlier.create_index(ARTICLE_INDEX).await.unwrap();
    let stale = ChangeFeed::new(ARTICLE_INDEX, "SELECT 1", DatabaseConnection::default());
    earlier.start_change_feed(&stale).await.unwrap();
    earlier.close().await.unwrap();

    let manager = manager_over(&connector, blog_catalog()).await;
    assert_eq!(manager.start_index_if_needed(&article()).await.unwrap(), IndexStart::Created);
    assert_eq!(manager.start_river_if_needed(&article()).await.unwrap(), RiverStart::Started);

    let engine = connector.shared_engine().unwrap();
    assert!(engine.mapping(ARTICLE_INDEX).is_some());
    let feeds = engine.running_feeds();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].query, ARTICLE_FEED_QUERY);

    manager.reindex(&article()).await.unwrap();
    assert!(manager.is_river_started(&article()));
    assert_eq!(engine.running_feeds().len(), 1);
}
