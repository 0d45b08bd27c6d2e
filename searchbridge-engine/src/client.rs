use crate::{ChangeFeed, EngineResult, NodeSettings};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A connected search engine client.
///
/// Every call may block on network I/O. Timeouts and cancellation are the
/// implementation's business.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Creates the index for `type_name`.
    /// Fails with [`crate::EngineError::IndexAlreadyExists`] if it exists.
    async fn create_index(&self, type_name: &str) -> EngineResult<()>;

    /// Deletes the index for `type_name` and all its documents.
    async fn delete_index(&self, type_name: &str) -> EngineResult<()>;

    /// Installs the field mapping for `type_name`.
    async fn put_mapping(&self, type_name: &str, mapping: &Value) -> EngineResult<()>;

    /// Upserts a document.
    async fn index_document(&self, type_name: &str, id: &str, body: &Value) -> EngineResult<()>;

    /// Removes a document. Removing a missing document succeeds.
    async fn delete_document(&self, type_name: &str, id: &str) -> EngineResult<()>;

    /// Starts streaming rows from a database query into an index.
    async fn start_change_feed(&self, feed: &ChangeFeed) -> EngineResult<()>;

    /// Stops the change feed named `name`.
    async fn stop_change_feed(&self, name: &str) -> EngineResult<()>;

    /// Releases the connection. Later calls fail with [`crate::EngineError::Closed`].
    async fn close(&self) -> EngineResult<()>;
}

/// Obtains a client for a node configuration.
#[async_trait]
pub trait SearchConnector: Send + Sync {
    async fn connect(&self, settings: &NodeSettings) -> EngineResult<Arc<dyn SearchClient>>;
}
