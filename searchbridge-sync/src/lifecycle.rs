//! Per-type provisioning of engine indices and change feeds.
//!
//! Each resource kind keeps a started-set and a per-type async lock. The
//! started-set is only touched under a short std mutex; engine I/O runs
//! while holding the per-type lock alone, so concurrent first calls for one
//! type collapse into a single creation while other types proceed.

use crate::error::SyncResult;
use crate::registry::MapperRegistry;
use searchbridge_engine::{ChangeFeed, DatabaseConnection, EngineError, SearchClient};
use searchbridge_model::Mapper;
use searchbridge_types::DomainType;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Outcome of [`IndexLifecycleManager::start_index_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStart {
    Created,
    AlreadyStarted,
}

/// Outcome of [`IndexLifecycleManager::start_river_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverStart {
    Started,
    AlreadyStarted,
    /// The mapper declares no change feed source. The type is left out of
    /// the started-set so a later reindex checks again.
    NoSource,
}

#[derive(Default)]
struct Guarded {
    started: Mutex<BTreeSet<DomainType>>,
    locks: Mutex<HashMap<DomainType, Arc<tokio::sync::Mutex<()>>>>,
}

impl Guarded {
    fn contains(&self, domain_type: &DomainType) -> bool {
        lock(&self.started).contains(domain_type)
    }

    fn mark(&self, domain_type: &DomainType) {
        lock(&self.started).insert(domain_type.clone());
    }

    fn unmark(&self, domain_type: &DomainType) {
        lock(&self.started).remove(domain_type);
    }

    fn snapshot(&self) -> BTreeSet<DomainType> {
        lock(&self.started).clone()
    }

    fn type_lock(&self, domain_type: &DomainType) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(lock(&self.locks).entry(domain_type.clone()).or_default())
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Creates, and on reindex rebuilds, the engine resources of each type.
pub struct IndexLifecycleManager {
    client: Arc<dyn SearchClient>,
    registry: Arc<MapperRegistry>,
    database: DatabaseConnection,
    indices: Guarded,
    rivers: Guarded,
}

impl IndexLifecycleManager {
    pub fn new(
        client: Arc<dyn SearchClient>,
        registry: Arc<MapperRegistry>,
        database: DatabaseConnection,
    ) -> Self {
        Self {
            client,
            registry,
            database,
            indices: Guarded::default(),
            rivers: Guarded::default(),
        }
    }

    /// Creates the type's index unless this process already did.
    pub async fn start_index_if_needed(&self, domain_type: &DomainType) -> SyncResult<IndexStart> {
        if self.indices.contains(domain_type) {
            return Ok(IndexStart::AlreadyStarted);
        }

        let type_lock = self.indices.type_lock(domain_type);
        let _held = type_lock.lock().await;
        if self.indices.contains(domain_type) {
            debug!(domain_type = %domain_type, "Index started by a concurrent caller");
            return Ok(IndexStart::AlreadyStarted);
        }

        let mapper = self.registry.get_mapper(domain_type).await?;
        self.create_index(&mapper).await?;
        self.indices.mark(domain_type);
        Ok(IndexStart::Created)
    }

    /// Starts the type's change feed if its mapper declares one.
    pub async fn start_river_if_needed(&self, domain_type: &DomainType) -> SyncResult<RiverStart> {
        if self.rivers.contains(domain_type) {
            return Ok(RiverStart::AlreadyStarted);
        }

        let type_lock = self.rivers.type_lock(domain_type);
        let _held = type_lock.lock().await;
        if self.rivers.contains(domain_type) {
            return Ok(RiverStart::AlreadyStarted);
        }

        let mapper = self.registry.get_mapper(domain_type).await?;
        if !self.start_river(&mapper).await? {
            return Ok(RiverStart::NoSource);
        }
        self.rivers.mark(domain_type);
        Ok(RiverStart::Started)
    }

    /// Rebuilds the type's index and change feed from a freshly derived mapper.
    ///
    /// A started index is deleted first; either way it is created again. The
    /// change feed is handled the same way, independently: both halves are
    /// always attempted and the first failure is returned.
    pub async fn reindex(&self, domain_type: &DomainType) -> SyncResult<()> {
        let previous = self.registry.cached(domain_type);
        self.registry.invalidate(domain_type);
        let previous_name = previous.as_ref().map(|m| m.type_name());

        let index_result = self.rebuild_index(domain_type, previous_name).await;
        if let Err(e) = &index_result {
            warn!(domain_type = %domain_type, "Index rebuild failed: {e}");
        }
        let river_result = self.rebuild_river(domain_type, previous_name).await;
        if let Err(e) = &river_result {
            warn!(domain_type = %domain_type, "Change feed rebuild failed: {e}");
        }
        index_result.and(river_result)
    }

    pub fn is_index_started(&self, domain_type: &DomainType) -> bool {
        self.indices.contains(domain_type)
    }

    pub fn is_river_started(&self, domain_type: &DomainType) -> bool {
        self.rivers.contains(domain_type)
    }

    pub fn started_indices(&self) -> BTreeSet<DomainType> {
        self.indices.snapshot()
    }

    pub fn started_rivers(&self) -> BTreeSet<DomainType> {
        self.rivers.snapshot()
    }

    async fn rebuild_index(
        &self,
        domain_type: &DomainType,
        previous_name: Option<&str>,
    ) -> SyncResult<()> {
        let type_lock = self.indices.type_lock(domain_type);
        let _held = type_lock.lock().await;

        let mapper = self.registry.get_mapper(domain_type).await?;
        if self.indices.contains(domain_type) {
            let name = previous_name.unwrap_or(mapper.type_name());
            info!(domain_type = %domain_type, type_name = name, "Deleting index for reindex");
            self.client.delete_index(name).await?;
            self.indices.unmark(domain_type);
        }
        self.create_index(&mapper).await?;
        self.indices.mark(domain_type);
        Ok(())
    }

    async fn rebuild_river(
        &self,
        domain_type: &DomainType,
        previous_name: Option<&str>,
    ) -> SyncResult<()> {
        let type_lock = self.rivers.type_lock(domain_type);
        let _held = type_lock.lock().await;

        let mapper = self.registry.get_mapper(domain_type).await?;
        if self.rivers.contains(domain_type) {
            let name = ChangeFeed::name_for(previous_name.unwrap_or(mapper.type_name()));
            info!(domain_type = %domain_type, feed = %name, "Stopping change feed for reindex");
            self.client.stop_change_feed(&name).await?;
            self.rivers.unmark(domain_type);
        }
        if self.start_river(&mapper).await? {
            self.rivers.mark(domain_type);
        }
        Ok(())
    }

    async fn create_index(&self, mapper: &Mapper) -> SyncResult<()> {
        info!(domain_type = %mapper.domain_type(), type_name = mapper.type_name(), "Start index");
        match self.client.create_index(mapper.type_name()).await {
            Ok(()) => {}
            // Left over from an earlier process; the mapping is reapplied below.
            Err(EngineError::IndexAlreadyExists(_)) => {
                debug!(type_name = mapper.type_name(), "Index already exists in engine");
            }
            Err(e) => return Err(e.into()),
        }
        self.client
            .put_mapping(mapper.type_name(), &mapper.mapping())
            .await?;
        Ok(())
    }

    /// Returns false if the mapper has no change feed source.
    async fn start_river(&self, mapper: &Mapper) -> SyncResult<bool> {
        let Some(source) = mapper.change_feed() else {
            debug!(domain_type = %mapper.domain_type(), "No change feed source declared");
            return Ok(false);
        };
        info!(domain_type = %mapper.domain_type(), type_name = mapper.type_name(), "Start change feed");
        let feed = ChangeFeed::new(mapper.type_name(), source.query.clone(), self.database.clone());
        match self.client.start_change_feed(&feed).await {
            Ok(()) => {}
            // Left running by an earlier process; restart it with the current
            // query and connection.
            Err(EngineError::FeedAlreadyRunning(_)) => {
                debug!(feed = %feed.name, "Change feed already running in engine, restarting");
                self.client.stop_change_feed(&feed.name).await?;
                self.client.start_change_feed(&feed).await?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(true)
    }
}
