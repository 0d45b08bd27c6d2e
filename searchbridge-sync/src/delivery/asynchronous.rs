use super::{DocumentWriter, IndexEventHandler};
use crate::error::{SyncError, SyncResult};
use crate::event::IndexEvent;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Per-worker queue depth before `handle` waits.
const WORKER_QUEUE_CAPACITY: usize = 1024;

enum Job {
    Apply(IndexEvent),
    Flush(oneshot::Sender<()>),
}

/// Applies events on background workers.
///
/// Events are sharded by `(domain type, id)`, so every event for one subject
/// is applied by the same worker in dispatch order. There is no ordering
/// across subjects. A failed event is logged and dropped.
pub struct AsyncHandler {
    senders: Mutex<Option<Vec<mpsc::Sender<Job>>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    dropped: Arc<AtomicU64>,
}

impl AsyncHandler {
    /// Spawns `workers` tasks (at least one) on the current runtime.
    pub fn new(writer: Arc<DocumentWriter>, workers: usize) -> Self {
        let dropped = Arc::new(AtomicU64::new(0));
        let mut senders = Vec::new();
        let mut handles = Vec::new();
        for worker in 0..workers.max(1) {
            let (tx, rx) = mpsc::channel(WORKER_QUEUE_CAPACITY);
            senders.push(tx);
            handles.push(tokio::spawn(run_worker(
                worker,
                rx,
                Arc::clone(&writer),
                Arc::clone(&dropped),
            )));
        }
        Self {
            senders: Mutex::new(Some(senders)),
            workers: tokio::sync::Mutex::new(handles),
            dropped,
        }
    }

    /// Events that failed to apply since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn sender_for(&self, event: &IndexEvent) -> SyncResult<mpsc::Sender<Job>> {
        let senders = self.senders();
        let senders = senders.as_ref().ok_or(SyncError::ChannelClosed)?;
        let mut hasher = DefaultHasher::new();
        event.subject.domain_type.hash(&mut hasher);
        event.subject.id.hash(&mut hasher);
        let shard = (hasher.finish() % senders.len() as u64) as usize;
        Ok(senders[shard].clone())
    }

    fn all_senders(&self) -> Vec<mpsc::Sender<Job>> {
        self.senders().as_ref().cloned().unwrap_or_default()
    }

    fn senders(&self) -> MutexGuard<'_, Option<Vec<mpsc::Sender<Job>>>> {
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_worker(
    worker: usize,
    mut rx: mpsc::Receiver<Job>,
    writer: Arc<DocumentWriter>,
    dropped: Arc<AtomicU64>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Apply(event) => {
                if let Err(e) = writer.apply(&event).await {
                    dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(worker, event = %event, "Dropping async index event: {e}");
                }
            }
            Job::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!(worker, "Async delivery worker stopped");
}

#[async_trait]
impl IndexEventHandler for AsyncHandler {
    async fn handle(&self, event: IndexEvent) -> SyncResult<()> {
        let sender = self.sender_for(&event)?;
        sender
            .send(Job::Apply(event))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    async fn flush(&self) -> SyncResult<()> {
        let mut acks = Vec::new();
        for sender in self.all_senders() {
            let (tx, rx) = oneshot::channel();
            sender
                .send(Job::Flush(tx))
                .await
                .map_err(|_| SyncError::ChannelClosed)?;
            acks.push(rx);
        }
        for ack in acks {
            ack.await.map_err(|_| SyncError::ChannelClosed)?;
        }
        Ok(())
    }

    async fn shutdown(&self) -> SyncResult<()> {
        // Dropping the senders ends each worker once its queue is drained.
        let senders = self.senders().take();
        drop(senders);
        let handles = std::mem::take(&mut *self.workers.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Async delivery worker panicked: {e}");
            }
        }
        Ok(())
    }
}
