//! In-process engine backend.

use crate::{
    ChangeFeed, EngineError, EngineResult, NodeSettings, SearchClient, SearchConnector,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryIndex {
    mapping: Option<Value>,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct MemoryState {
    indices: BTreeMap<String, MemoryIndex>,
    feeds: BTreeMap<String, ChangeFeed>,
}

/// A search engine that lives in this process and forgets everything on drop.
#[derive(Debug)]
pub struct MemoryEngine {
    settings: NodeSettings,
    state: Mutex<MemoryState>,
    closed: AtomicBool,
}

impl MemoryEngine {
    pub fn new(settings: NodeSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(MemoryState::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn has_index(&self, type_name: &str) -> bool {
        self.state().indices.contains_key(type_name)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.state().indices.keys().cloned().collect()
    }

    pub fn mapping(&self, type_name: &str) -> Option<Value> {
        self.state()
            .indices
            .get(type_name)
            .and_then(|idx| idx.mapping.clone())
    }

    pub fn document(&self, type_name: &str, id: &str) -> Option<Value> {
        self.state()
            .indices
            .get(type_name)
            .and_then(|idx| idx.documents.get(id).cloned())
    }

    pub fn document_count(&self, type_name: &str) -> usize {
        self.state()
            .indices
            .get(type_name)
            .map_or(0, |idx| idx.documents.len())
    }

    pub fn running_feeds(&self) -> Vec<ChangeFeed> {
        self.state().feeds.values().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // Poisoning is ignored: every mutation is a single map operation.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open_state(&self) -> EngineResult<MutexGuard<'_, MemoryState>> {
        if self.is_closed() {
            return Err(EngineError::Closed);
        }
        Ok(self.state())
    }
}

#[async_trait]
impl SearchClient for MemoryEngine {
    async fn create_index(&self, type_name: &str) -> EngineResult<()> {
        let mut state = self.open_state()?;
        if state.indices.contains_key(type_name) {
            return Err(EngineError::IndexAlreadyExists(type_name.to_string()));
        }
        state
            .indices
            .insert(type_name.to_string(), MemoryIndex::default());
        debug!(type_name, "memory index created");
        Ok(())
    }

    async fn delete_index(&self, type_name: &str) -> EngineResult<()> {
        let mut state = self.open_state()?;
        state
            .indices
            .remove(type_name)
            .map(|_| ())
            .ok_or_else(|| EngineError::IndexNotFound(type_name.to_string()))
    }

    async fn put_mapping(&self, type_name: &str, mapping: &Value) -> EngineResult<()> {
        let mut state = self.open_state()?;
        let index = state
            .indices
            .get_mut(type_name)
            .ok_or_else(|| EngineError::IndexNotFound(type_name.to_string()))?;
        index.mapping = Some(mapping.clone());
        Ok(())
    }

    async fn index_document(&self, type_name: &str, id: &str, body: &Value) -> EngineResult<()> {
        let mut state = self.open_state()?;
        let index = state
            .indices
            .get_mut(type_name)
            .ok_or_else(|| EngineError::IndexNotFound(type_name.to_string()))?;
        index.documents.insert(id.to_string(), body.clone());
        Ok(())
    }

    async fn delete_document(&self, type_name: &str, id: &str) -> EngineResult<()> {
        let mut state = self.open_state()?;
        let index = state
            .indices
            .get_mut(type_name)
            .ok_or_else(|| EngineError::IndexNotFound(type_name.to_string()))?;
        index.documents.remove(id);
        Ok(())
    }

    async fn start_change_feed(&self, feed: &ChangeFeed) -> EngineResult<()> {
        let mut state = self.open_state()?;
        if state.feeds.contains_key(&feed.name) {
            return Err(EngineError::FeedAlreadyRunning(feed.name.clone()));
        }
        state.feeds.insert(feed.name.clone(), feed.clone());
        debug!(feed = %feed.name, type_name = %feed.type_name, "memory change feed started");
        Ok(())
    }

    async fn stop_change_feed(&self, name: &str) -> EngineResult<()> {
        let mut state = self.open_state()?;
        state
            .feeds
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::FeedNotRunning(name.to_string()))
    }

    async fn close(&self) -> EngineResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Connects to a fresh [`MemoryEngine`] on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryConnector;

#[async_trait]
impl SearchConnector for MemoryConnector {
    async fn connect(&self, settings: &NodeSettings) -> EngineResult<Arc<dyn SearchClient>> {
        Ok(Arc::new(MemoryEngine::new(settings.clone())))
    }
}
