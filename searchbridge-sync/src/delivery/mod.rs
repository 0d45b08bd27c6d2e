//! Delivery of index events to the engine.
//!
//! The [`DeliveryDispatcher`] resolves the handler for the configured
//! [`DeliveryMode`] and hands it each event; it never buffers or retries.
//! Each handler states its own failure and ordering contract:
//!
//! | Mode | Applied | Failures | Ordering |
//! |---|---|---|---|
//! | LOCAL | before `dispatch` returns | returned to the caller | caller's order |
//! | ASYNC | by background workers | logged, event dropped | per subject |
//! | QUEUED | in batches | logged, event dropped | global |

mod asynchronous;
mod local;
mod queued;

pub use asynchronous::AsyncHandler;
pub use local::LocalHandler;
pub use queued::QueuedHandler;

use crate::config::{BridgeConfig, DeliveryMode};
use crate::error::{SyncError, SyncResult};
use crate::event::IndexEvent;
use crate::registry::MapperRegistry;
use async_trait::async_trait;
use searchbridge_engine::SearchClient;
use searchbridge_types::IndexEventKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Applies (or arranges to apply) index events.
#[async_trait]
pub trait IndexEventHandler: Send + Sync {
    async fn handle(&self, event: IndexEvent) -> SyncResult<()>;

    /// Waits until every event accepted so far has been applied or dropped.
    async fn flush(&self) -> SyncResult<()> {
        Ok(())
    }

    /// Flushes and releases the handler's resources. Later calls to
    /// `handle` fail with [`SyncError::ChannelClosed`] or are applied
    /// directly, depending on the handler.
    async fn shutdown(&self) -> SyncResult<()> {
        self.flush().await
    }
}

/// Writes one event's document change to the engine.
pub struct DocumentWriter {
    client: Arc<dyn SearchClient>,
    registry: Arc<MapperRegistry>,
}

impl DocumentWriter {
    pub fn new(client: Arc<dyn SearchClient>, registry: Arc<MapperRegistry>) -> Self {
        Self { client, registry }
    }

    /// Upserts (INDEX) or removes (DELETE) the subject's document under its
    /// mapper's type name.
    pub async fn apply(&self, event: &IndexEvent) -> SyncResult<()> {
        let subject = &event.subject;
        let mapper = self.registry.get_mapper(&subject.domain_type).await?;
        let id = mapper.document_id(subject);
        match event.kind {
            IndexEventKind::Index => {
                let body = mapper.build_document(subject);
                self.client
                    .index_document(mapper.type_name(), id, &body)
                    .await?;
            }
            IndexEventKind::Delete => {
                self.client.delete_document(mapper.type_name(), id).await?;
            }
        }
        debug!(event = %event, type_name = mapper.type_name(), "Applied index event");
        Ok(())
    }
}

/// Builds the built-in handler for `mode`.
///
/// Must be called inside a Tokio runtime: the ASYNC handler spawns workers.
pub fn builtin_handler(
    mode: DeliveryMode,
    writer: Arc<DocumentWriter>,
    config: &BridgeConfig,
) -> Arc<dyn IndexEventHandler> {
    match mode {
        DeliveryMode::Local => Arc::new(LocalHandler::new(writer)),
        DeliveryMode::Async => Arc::new(AsyncHandler::new(writer, config.async_workers)),
        DeliveryMode::Queued => Arc::new(QueuedHandler::new(writer, config.queue_batch_size)),
    }
}

/// Routes events to the handler of the active delivery mode.
pub struct DeliveryDispatcher {
    mode: DeliveryMode,
    handlers: HashMap<DeliveryMode, Arc<dyn IndexEventHandler>>,
}

impl DeliveryDispatcher {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            handlers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the handler for `mode`.
    pub fn register(&mut self, mode: DeliveryMode, handler: Arc<dyn IndexEventHandler>) {
        self.handlers.insert(mode, handler);
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// The handler for the active mode.
    pub fn handler(&self) -> SyncResult<&Arc<dyn IndexEventHandler>> {
        self.handlers
            .get(&self.mode)
            .ok_or(SyncError::NoHandler(self.mode))
    }

    pub async fn dispatch(&self, event: IndexEvent) -> SyncResult<()> {
        self.handler()?.handle(event).await
    }

    pub async fn flush(&self) -> SyncResult<()> {
        self.handler()?.flush().await
    }

    /// Shuts down every registered handler, returning the first failure.
    pub async fn shutdown(&self) -> SyncResult<()> {
        let mut first_err = None;
        for handler in self.handlers.values() {
            if let Err(e) = handler.shutdown().await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
