//! A recording engine client for testing code that drives an engine.
//!
//! [`RecordingClient`] forwards to a [`MemoryEngine`], appends every call to
//! a shared [`CallLog`], and fails calls that match a [`FailurePlan`].
//! [`RecordingConnector::persistent`] hands every client the same engine,
//! standing in for a cluster that outlives the process.

use crate::{
    ChangeFeed, EngineError, EngineResult, MemoryEngine, NodeSettings, SearchClient,
    SearchConnector,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An engine operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOp {
    CreateIndex,
    DeleteIndex,
    PutMapping,
    IndexDocument,
    DeleteDocument,
    StartChangeFeed,
    StopChangeFeed,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Connect { cluster_name: String },
    CreateIndex(String),
    DeleteIndex(String),
    PutMapping(String),
    IndexDocument { type_name: String, id: String },
    DeleteDocument { type_name: String, id: String },
    StartChangeFeed(String),
    StopChangeFeed(String),
    Close,
}

/// Calls recorded across every client a connector hands out.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    pub fn push(&self, call: EngineCall) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn creates_of(&self, type_name: &str) -> usize {
        self.count(|c| matches!(c, EngineCall::CreateIndex(t) if t == type_name))
    }

    pub fn deletes_of(&self, type_name: &str) -> usize {
        self.count(|c| matches!(c, EngineCall::DeleteIndex(t) if t == type_name))
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Which operations should fail, keyed by index type name
/// (feed name for [`EngineOp::StopChangeFeed`]).
#[derive(Debug, Clone, Default)]
pub struct FailurePlan(Arc<Mutex<HashSet<(EngineOp, String)>>>);

impl FailurePlan {
    pub fn fail(&self, op: EngineOp, target: impl Into<String>) {
        self.0.lock().unwrap().insert((op, target.into()));
    }

    pub fn heal(&self, op: EngineOp, target: &str) {
        self.0.lock().unwrap().remove(&(op, target.to_string()));
    }

    fn check(&self, op: EngineOp, target: &str) -> EngineResult<()> {
        if self.0.lock().unwrap().contains(&(op, target.to_string())) {
            return Err(EngineError::Request(format!("injected {op:?} failure for {target}")));
        }
        Ok(())
    }
}

/// A [`MemoryEngine`] that records calls and injects failures.
#[derive(Debug)]
pub struct RecordingClient {
    engine: Arc<MemoryEngine>,
    /// Closing a shared client leaves the engine open.
    shared: bool,
    closed: AtomicBool,
    log: CallLog,
    failures: FailurePlan,
    create_delay: Option<Duration>,
}

impl RecordingClient {
    /// A client over its own fresh engine.
    pub fn new(settings: NodeSettings, log: CallLog, failures: FailurePlan) -> Self {
        Self::over(Arc::new(MemoryEngine::new(settings)), false, log, failures)
    }

    /// A client over an engine other clients also use.
    pub fn attached(engine: Arc<MemoryEngine>, log: CallLog, failures: FailurePlan) -> Self {
        Self::over(engine, true, log, failures)
    }

    fn over(engine: Arc<MemoryEngine>, shared: bool, log: CallLog, failures: FailurePlan) -> Self {
        Self {
            engine,
            shared,
            closed: AtomicBool::new(false),
            log,
            failures,
            create_delay: None,
        }
    }

    /// Sleeps inside every `create_index`, widening race windows.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// The backing engine, for inspecting indices and documents.
    pub fn engine(&self) -> &MemoryEngine {
        &self.engine
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    fn check(&self, op: EngineOp, target: &str) -> EngineResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(EngineError::Closed);
        }
        self.failures.check(op, target)
    }
}

#[async_trait]
impl SearchClient for RecordingClient {
    async fn create_index(&self, type_name: &str) -> EngineResult<()> {
        self.log.push(EngineCall::CreateIndex(type_name.to_string()));
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.check(EngineOp::CreateIndex, type_name)?;
        self.engine.create_index(type_name).await
    }

    async fn delete_index(&self, type_name: &str) -> EngineResult<()> {
        self.log.push(EngineCall::DeleteIndex(type_name.to_string()));
        self.check(EngineOp::DeleteIndex, type_name)?;
        self.engine.delete_index(type_name).await
    }

    async fn put_mapping(&self, type_name: &str, mapping: &Value) -> EngineResult<()> {
        self.log.push(EngineCall::PutMapping(type_name.to_string()));
        self.check(EngineOp::PutMapping, type_name)?;
        self.engine.put_mapping(type_name, mapping).await
    }

    async fn index_document(&self, type_name: &str, id: &str, body: &Value) -> EngineResult<()> {
        self.log.push(EngineCall::IndexDocument {
            type_name: type_name.to_string(),
            id: id.to_string(),
        });
        self.check(EngineOp::IndexDocument, type_name)?;
        self.engine.index_document(type_name, id, body).await
    }

    async fn delete_document(&self, type_name: &str, id: &str) -> EngineResult<()> {
        self.log.push(EngineCall::DeleteDocument {
            type_name: type_name.to_string(),
            id: id.to_string(),
        });
        self.check(EngineOp::DeleteDocument, type_name)?;
        self.engine.delete_document(type_name, id).await
    }

    async fn start_change_feed(&self, feed: &ChangeFeed) -> EngineResult<()> {
        self.log.push(EngineCall::StartChangeFeed(feed.name.clone()));
        self.check(EngineOp::StartChangeFeed, &feed.type_name)?;
        self.engine.start_change_feed(feed).await
    }

    async fn stop_change_feed(&self, name: &str) -> EngineResult<()> {
        self.log.push(EngineCall::StopChangeFeed(name.to_string()));
        self.check(EngineOp::StopChangeFeed, name)?;
        self.engine.stop_change_feed(name).await
    }

    async fn close(&self) -> EngineResult<()> {
        self.log.push(EngineCall::Close);
        self.closed.store(true, Ordering::Release);
        if self.shared {
            return Ok(());
        }
        self.engine.close().await
    }
}

/// Hands out a new [`RecordingClient`] per connect, all sharing one log
/// and failure plan. Each client gets a fresh engine unless the connector
/// is [`persistent`](Self::persistent).
#[derive(Debug, Default)]
pub struct RecordingConnector {
    log: CallLog,
    failures: FailurePlan,
    refuse: Mutex<bool>,
    create_delay: Option<Duration>,
    persistent: bool,
    shared: Mutex<Option<Arc<MemoryEngine>>>,
    clients: Mutex<Vec<Arc<RecordingClient>>>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every connect attaches to one engine, created on the first connect.
    /// Indices, documents and feeds survive a client's `close`.
    pub fn persistent() -> Self {
        Self {
            persistent: true,
            ..Self::default()
        }
    }

    /// The engine shared by a persistent connector, once connected.
    pub fn shared_engine(&self) -> Option<Arc<MemoryEngine>> {
        self.shared.lock().unwrap().clone()
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Makes subsequent connects fail (or succeed again).
    pub fn refuse_connections(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn failures(&self) -> &FailurePlan {
        &self.failures
    }

    /// The most recently connected client.
    pub fn client(&self) -> Option<Arc<RecordingClient>> {
        self.clients.lock().unwrap().last().cloned()
    }

    pub fn connect_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchConnector for RecordingConnector {
    async fn connect(&self, settings: &NodeSettings) -> EngineResult<Arc<dyn SearchClient>> {
        self.log.push(EngineCall::Connect {
            cluster_name: settings.cluster_name.clone(),
        });
        if *self.refuse.lock().unwrap() {
            return Err(EngineError::Unavailable(format!(
                "cluster {} refused connection",
                settings.cluster_name
            )));
        }
        let mut client = if self.persistent {
            let engine = Arc::clone(
                self.shared
                    .lock()
                    .unwrap()
                    .get_or_insert_with(|| Arc::new(MemoryEngine::new(settings.clone()))),
            );
            RecordingClient::attached(engine, self.log.clone(), self.failures.clone())
        } else {
            RecordingClient::new(settings.clone(), self.log.clone(), self.failures.clone())
        };
        if let Some(delay) = self.create_delay {
            client = client.with_create_delay(delay);
        }
        let client = Arc::new(client);
        self.clients.lock().unwrap().push(Arc::clone(&client));
        Ok(client)
    }
}
