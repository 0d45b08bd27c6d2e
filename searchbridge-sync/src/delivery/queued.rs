use super::{DocumentWriter, IndexEventHandler};
use crate::error::{SyncError, SyncResult};
use crate::event::IndexEvent;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Buffers events and applies them in batches of `batch_size`, or on flush.
///
/// Batches are drained and applied under one async lock, so events reach
/// the engine in the order they were handed over. A failed event is logged
/// and dropped; the rest of its batch is still applied. After `shutdown`,
/// `handle` fails with [`SyncError::ChannelClosed`].
pub struct QueuedHandler {
    writer: Arc<DocumentWriter>,
    batch_size: usize,
    buffer: Mutex<Vec<IndexEvent>>,
    apply_lock: tokio::sync::Mutex<()>,
    dropped: AtomicU64,
    // Only changed while the buffer lock is held.
    closed: AtomicBool,
}

impl QueuedHandler {
    pub fn new(writer: Arc<DocumentWriter>, batch_size: usize) -> Self {
        Self {
            writer,
            batch_size: batch_size.max(1),
            buffer: Mutex::new(Vec::new()),
            apply_lock: tokio::sync::Mutex::new(()),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Events accepted but not yet applied.
    pub fn pending(&self) -> usize {
        self.buffer().len()
    }

    /// Events that failed to apply since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    async fn drain(&self) {
        let _held = self.apply_lock.lock().await;
        let batch = std::mem::take(&mut *self.buffer());
        if batch.is_empty() {
            return;
        }
        debug!(size = batch.len(), "Applying queued batch");
        for event in &batch {
            if let Err(e) = self.writer.apply(event).await {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event = %event, "Dropping queued index event: {e}");
            }
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<IndexEvent>> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl IndexEventHandler for QueuedHandler {
    async fn handle(&self, event: IndexEvent) -> SyncResult<()> {
        let full = {
            let mut buffer = self.buffer();
            if self.closed.load(Ordering::Acquire) {
                return Err(SyncError::ChannelClosed);
            }
            buffer.push(event);
            buffer.len() >= self.batch_size
        };
        if full {
            self.drain().await;
        }
        Ok(())
    }

    async fn flush(&self) -> SyncResult<()> {
        self.drain().await;
        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        {
            let _buffer = self.buffer();
            self.closed.store(true, Ordering::Release);
        }
        self.drain().await;
        Ok(())
    }
}
