use super::{DocumentWriter, IndexEventHandler};
use crate::error::SyncResult;
use crate::event::IndexEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Applies each event before returning. Failures go back to the caller.
pub struct LocalHandler {
    writer: Arc<DocumentWriter>,
}

impl LocalHandler {
    pub fn new(writer: Arc<DocumentWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl IndexEventHandler for LocalHandler {
    async fn handle(&self, event: IndexEvent) -> SyncResult<()> {
        self.writer.apply(&event).await.inspect_err(|e| {
            warn!(event = %event, "Index event failed: {e}");
        })
    }
}
