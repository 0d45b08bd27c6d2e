//! Shared fixtures for searchbridge-sync integration tests.

#![allow(dead_code)]

use searchbridge_engine::mock::RecordingConnector;
use searchbridge_engine::{NodeSettings, OperatingMode, SearchClient, SearchConnector};
use searchbridge_model::{Entity, FieldMapping, IndexSchema, SchemaCatalog};
use serde_json::json;
use std::sync::{Arc, Once};

pub const ARTICLE: &str = "models.blog.Article";
pub const COMMENT: &str = "models.blog.Comment";
pub const SAMPLE: &str = "models.searchbridge.SampleModel";
pub const OUTSIDE: &str = "reports.Summary";
pub const PLAIN: &str = "models.blog.Draft";

pub const ARTICLE_INDEX: &str = "models_blog_article";
pub const COMMENT_INDEX: &str = "models_blog_comment";
pub const SAMPLE_INDEX: &str = "models_searchbridge_samplemodel";
pub const OUTSIDE_INDEX: &str = "reports_summary";
pub const ARTICLE_FEED: &str = "models_blog_article_river";

pub const ARTICLE_FEED_QUERY: &str = "SELECT id AS _id, title, author FROM article";

static TRACING: Once = Once::new();

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn article_schema() -> IndexSchema {
    IndexSchema::new(
        ARTICLE,
        vec![
            FieldMapping::text("title"),
            FieldMapping::keyword("author"),
            FieldMapping::long("views"),
        ],
    )
    .with_change_feed(ARTICLE_FEED_QUERY)
}

pub fn comment_schema() -> IndexSchema {
    IndexSchema::new(COMMENT, vec![FieldMapping::text("body")])
}

/// Article (with change feed), Comment, the excluded sample model, a type
/// outside the `models` namespace, and one non-searchable type.
pub fn blog_catalog() -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog
        .declare(article_schema())
        .declare(comment_schema())
        .declare(IndexSchema::new(SAMPLE, vec![FieldMapping::keyword("name")]))
        .declare(IndexSchema::new(OUTSIDE, vec![FieldMapping::double("total")]))
        .declare_plain(PLAIN);
    catalog
}

pub fn article(id: &str, title: &str) -> Arc<Entity> {
    Arc::new(Entity::new(
        id,
        ARTICLE,
        json!({ "title": title, "author": "ada", "views": 3 }),
    ))
}

pub fn comment(id: &str, body: &str) -> Arc<Entity> {
    Arc::new(Entity::new(id, COMMENT, json!({ "body": body })))
}

/// Connects a recording client in MEMORY mode.
pub async fn connect(connector: &RecordingConnector) -> Arc<dyn SearchClient> {
    let settings = NodeSettings::for_mode(OperatingMode::Memory, "test-cluster");
    connector.connect(&settings).await.unwrap()
}
