//! The search plugin: owns all per-process sync state.
//!
//! ```text
//!  Stopped ──start()──▶ Running ──stop()──▶ Stopped
//!                        │  ▲
//!                        └──┘ start() while running: logged no-op
//! ```
//!
//! Every `start()` builds fresh caches and started-sets; nothing survives a
//! `stop()`.

use crate::config::{BridgeConfig, DeliveryMode};
use crate::delivery::{builtin_handler, DeliveryDispatcher, DocumentWriter, IndexEventHandler};
use crate::error::{SyncError, SyncResult};
use crate::event::IndexEvent;
use crate::lifecycle::IndexLifecycleManager;
use crate::lookup::TypeLookup;
use crate::registry::MapperRegistry;
use crate::status::Status;
use crate::translator::{self, EventTranslator};
use searchbridge_engine::{SearchClient, SearchConnector};
use searchbridge_model::{Entity, MapperFactory, SchemaCatalog, Subject, TypeDiscovery};
use searchbridge_types::DomainType;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Builds a delivery handler once the engine client exists.
pub type HandlerFactory =
    Arc<dyn Fn(Arc<DocumentWriter>) -> Arc<dyn IndexEventHandler> + Send + Sync>;

/// State that lives from one `start()` to the matching `stop()`.
struct Runtime {
    client: Arc<dyn SearchClient>,
    registry: Arc<MapperRegistry>,
    lookup: TypeLookup,
    lifecycle: IndexLifecycleManager,
    translator: EventTranslator,
    dispatcher: DeliveryDispatcher,
    eligible: BTreeSet<DomainType>,
}

/// Keeps a search engine in step with the host's persisted objects.
pub struct SearchPlugin {
    config: BridgeConfig,
    connector: Arc<dyn SearchConnector>,
    factory: Arc<dyn MapperFactory>,
    discovery: Arc<dyn TypeDiscovery>,
    handler_factories: HashMap<DeliveryMode, HandlerFactory>,
    runtime: RwLock<Option<Arc<Runtime>>>,
    transition: Mutex<()>,
}

impl SearchPlugin {
    pub fn new(
        config: BridgeConfig,
        connector: Arc<dyn SearchConnector>,
        factory: Arc<dyn MapperFactory>,
        discovery: Arc<dyn TypeDiscovery>,
    ) -> Self {
        Self {
            config,
            connector,
            factory,
            discovery,
            handler_factories: HashMap::new(),
            runtime: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    /// Uses one catalog as both mapper factory and type discovery.
    pub fn with_catalog(
        config: BridgeConfig,
        connector: Arc<dyn SearchConnector>,
        catalog: SchemaCatalog,
    ) -> Self {
        let catalog = Arc::new(catalog);
        Self::new(config, connector, catalog.clone(), catalog)
    }

    /// Supplies the handler for `mode`, replacing the built-in one.
    /// Takes effect at the next `start()`.
    pub fn register_handler(&mut self, mode: DeliveryMode, factory: HandlerFactory) {
        self.handler_factories.insert(mode, factory);
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        self.runtime.read().await.is_some()
    }

    /// Connects to the engine and provisions every eligible type.
    ///
    /// Fails only if no client can be obtained; per-type provisioning
    /// failures are logged and leave that type unstarted.
    pub async fn start(&self) -> SyncResult<()> {
        let _transition = self.transition.lock().await;
        if self.runtime.read().await.is_some() {
            debug!("Search plugin started already");
            return Ok(());
        }

        let settings = self.config.node_settings();
        info!(
            mode = %settings.mode,
            cluster = %settings.cluster_name,
            local = settings.local,
            shards = settings.shards,
            replicas = settings.replicas,
            "Starting search plugin"
        );
        let client = self.connector.connect(&settings).await.map_err(|e| {
            error!("Search engine client unavailable: {e}");
            SyncError::ClientUnavailable(e)
        })?;

        let runtime = self.build_runtime(client);
        for domain_type in &runtime.eligible {
            if let Err(e) = runtime.lifecycle.start_index_if_needed(domain_type).await {
                warn!(domain_type = %domain_type, "Could not start index: {e}");
            }
            if let Err(e) = runtime.lifecycle.start_river_if_needed(domain_type).await {
                warn!(domain_type = %domain_type, "Could not start change feed: {e}");
            }
        }

        info!(
            eligible = runtime.eligible.len(),
            delivery = %runtime.dispatcher.mode(),
            "Search plugin started"
        );
        *self.runtime.write().await = Some(Arc::new(runtime));
        Ok(())
    }

    /// Drains pending deliveries and releases the engine client.
    pub async fn stop(&self) -> SyncResult<()> {
        let _transition = self.transition.lock().await;
        let Some(runtime) = self.runtime.write().await.take() else {
            debug!("Search plugin not running, nothing to stop");
            return Ok(());
        };

        info!("Stopping search plugin");
        let drained = runtime.dispatcher.shutdown().await;
        if let Err(e) = &drained {
            warn!("Delivery shutdown failed: {e}");
        }
        let closed = runtime.client.close().await.map_err(SyncError::from);
        drained.and(closed)
    }

    /// Handles one host lifecycle notification.
    ///
    /// Returns `Ok(true)` if an index event was dispatched, `Ok(false)` if
    /// the notification was filtered out.
    pub async fn on_notification(&self, name: &str, subject: Arc<dyn Subject>) -> SyncResult<bool> {
        if !translator::is_interesting(name) {
            return Ok(false);
        }
        debug!(notification = name, subject = ?subject, "Received notification");

        let runtime = self.running().await?;
        let Some(event) = runtime.translator.translate(name, &subject)? else {
            return Ok(false);
        };
        runtime
            .lifecycle
            .start_index_if_needed(&event.subject.domain_type)
            .await?;

        info!(event = %event, "Index event");
        runtime.dispatcher.dispatch(event).await?;
        Ok(true)
    }

    /// Indexes an entity directly, bypassing notification filtering.
    pub async fn index(&self, entity: Arc<Entity>) -> SyncResult<()> {
        let runtime = self.running().await?;
        if !self.discovery.is_searchable(&entity.domain_type) {
            return Err(SyncError::NotSearchable(entity.domain_type.clone()));
        }
        runtime
            .lifecycle
            .start_index_if_needed(&entity.domain_type)
            .await?;
        runtime.dispatcher.dispatch(IndexEvent::index(entity)).await
    }

    /// Drops and rebuilds the type's index and change feed.
    pub async fn reindex(&self, domain_type: &DomainType) -> SyncResult<()> {
        let runtime = self.running().await?;
        if !self.discovery.is_searchable(domain_type) {
            return Err(SyncError::NotSearchable(domain_type.clone()));
        }
        info!(domain_type = %domain_type, "Reindexing");
        runtime.lookup.forget(domain_type);
        runtime.lifecycle.reindex(domain_type).await
    }

    /// Resolves an index type name back to its domain type.
    pub async fn lookup_domain_type(&self, type_name: &str) -> SyncResult<DomainType> {
        self.running().await?.lookup.lookup_domain_type(type_name).await
    }

    /// Waits until every dispatched event has been applied or dropped.
    pub async fn flush(&self) -> SyncResult<()> {
        self.running().await?.dispatcher.flush().await
    }

    /// Provisioning state of every eligible type; empty when not running.
    pub async fn status(&self) -> Vec<Status> {
        let Some(runtime) = self.runtime.read().await.clone() else {
            return Vec::new();
        };
        runtime
            .eligible
            .iter()
            .map(|t| Status {
                domain_type: t.clone(),
                index_started: runtime.lifecycle.is_index_started(t),
                river_started: runtime.lifecycle.is_river_started(t),
            })
            .collect()
    }

    /// Types provisioned at startup; empty when not running.
    pub async fn eligible_types(&self) -> BTreeSet<DomainType> {
        match self.runtime.read().await.as_ref() {
            Some(runtime) => runtime.eligible.clone(),
            None => BTreeSet::new(),
        }
    }

    /// Number of types with a cached mapper; zero when not running.
    pub async fn cached_mappers(&self) -> usize {
        match self.runtime.read().await.as_ref() {
            Some(runtime) => runtime.registry.len(),
            None => 0,
        }
    }

    async fn running(&self) -> SyncResult<Arc<Runtime>> {
        self.runtime
            .read()
            .await
            .clone()
            .ok_or(SyncError::NotRunning)
    }

    fn build_runtime(&self, client: Arc<dyn SearchClient>) -> Runtime {
        let registry = Arc::new(MapperRegistry::new(Arc::clone(&self.factory)));
        let writer = Arc::new(DocumentWriter::new(
            Arc::clone(&client),
            Arc::clone(&registry),
        ));

        let mode = self.config.delivery;
        let mut dispatcher = DeliveryDispatcher::new(mode);
        for (custom_mode, factory) in &self.handler_factories {
            dispatcher.register(*custom_mode, factory(Arc::clone(&writer)));
        }
        if !self.handler_factories.contains_key(&mode) {
            dispatcher.register(mode, builtin_handler(mode, Arc::clone(&writer), &self.config));
        }

        let eligible = self
            .discovery
            .model_types()
            .into_iter()
            .filter(|t| self.discovery.is_searchable(t) && self.config.eligibility.is_eligible(t))
            .collect();

        Runtime {
            lifecycle: IndexLifecycleManager::new(
                Arc::clone(&client),
                Arc::clone(&registry),
                self.config.database.clone(),
            ),
            lookup: TypeLookup::new(Arc::clone(&registry), Arc::clone(&self.discovery)),
            translator: EventTranslator::new(Arc::clone(&self.discovery)),
            client,
            registry,
            dispatcher,
            eligible,
        }
    }
}
