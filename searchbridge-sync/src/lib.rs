//! Search index synchronization for searchbridge.
//!
//! Keeps a search engine in step with a host application's persisted
//! objects: each searchable domain type gets an index (and optionally a
//! database change feed) provisioned once, and every persisted, updated or
//! deleted entity becomes an index event applied to the engine.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Config**: [`BridgeConfig`] read from flat [`Properties`] or TOML
//! - **Registry**: [`MapperRegistry`], one mapper derivation per type
//! - **Lookup**: [`TypeLookup`], index type name to domain type
//! - **Lifecycle**: [`IndexLifecycleManager`], at-most-once index and feed
//!   provisioning, plus reindex
//! - **Translator**: [`EventTranslator`], host notification to [`IndexEvent`]
//! - **Delivery**: [`DeliveryDispatcher`] and the built-in
//!   [`IndexEventHandler`]s
//! - **Plugin**: [`SearchPlugin`], which owns all of the above between
//!   `start()` and `stop()`
//!
//! ## Event flow
//!
//! 1. **Classify**: the notification name's suffix picks INDEX or DELETE
//! 2. **Filter**: non-searchable subjects are dropped
//! 3. **Provision**: the subject's index is created on first use
//! 4. **Deliver**: the active handler applies the document change
//!
//! # Example
//!
//! ```
//! use searchbridge_engine::MemoryConnector;
//! use searchbridge_model::{Entity, FieldMapping, IndexSchema, SchemaCatalog};
//! use searchbridge_sync::{BridgeConfig, SearchPlugin};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> searchbridge_sync::SyncResult<()> {
//! let mut catalog = SchemaCatalog::new();
//! catalog.declare(IndexSchema::new("models.Note", vec![FieldMapping::text("title")]));
//!
//! let plugin = SearchPlugin::with_catalog(
//!     BridgeConfig::default(),
//!     Arc::new(MemoryConnector),
//!     catalog,
//! );
//! plugin.start().await?;
//!
//! let note = Entity::new("1", "models.Note", json!({ "title": "hello" }));
//! plugin.on_notification("jpa.objectPersisted", Arc::new(note)).await?;
//!
//! plugin.stop().await?;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod delivery;
mod error;
mod event;
mod lifecycle;
mod lookup;
mod plugin;
mod registry;
mod status;
pub mod translator;

pub use config::{
    BridgeConfig, DeliveryMode, EligibilityFilter, Properties, DEFAULT_ASYNC_WORKERS,
    DEFAULT_CLUSTER_NAME, DEFAULT_ELIGIBLE_PREFIX, DEFAULT_EXCLUDED_FIXTURE,
    DEFAULT_QUEUE_BATCH_SIZE, KEY_ASYNC_WORKERS, KEY_CLUSTER, KEY_DB_DRIVER, KEY_DB_PASS,
    KEY_DB_URL, KEY_DB_USER, KEY_DELIVERY, KEY_ELIGIBLE_EXCLUDE, KEY_ELIGIBLE_PREFIX, KEY_MODE,
    KEY_QUEUE_BATCH_SIZE,
};
pub use delivery::{DeliveryDispatcher, DocumentWriter, IndexEventHandler};
pub use error::{SyncError, SyncResult};
pub use event::IndexEvent;
pub use lifecycle::{IndexLifecycleManager, IndexStart, RiverStart};
pub use lookup::TypeLookup;
pub use plugin::{HandlerFactory, SearchPlugin};
pub use registry::MapperRegistry;
pub use status::Status;
pub use translator::EventTranslator;
