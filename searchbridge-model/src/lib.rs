//! Domain model for searchbridge.
//!
//! Defines the types that sit between the host application and the index
//! synchronization core:
//! - [`Entity`]: the host's persisted object (id, type, JSON payload)
//! - [`Subject`]: anything a host notification may carry
//! - [`IndexSchema`] / [`FieldMapping`]: a type's declared search mapping
//! - [`Mapper`]: the validated, derived mapping the core caches per type
//! - [`MapperFactory`] / [`TypeDiscovery`]: host capabilities the core calls
//! - [`SchemaCatalog`]: a declarative implementation of both capabilities

mod capability;
mod catalog;
mod entity;
mod error;
mod mapper;
mod schema;

pub use capability::{MapperFactory, TypeDiscovery};
pub use catalog::SchemaCatalog;
pub use entity::{Entity, Subject};
pub use error::{MappingError, MappingResult};
pub use mapper::{default_type_name, Mapper};
pub use schema::{ChangeFeedSource, FieldMapping, FieldType, IndexSchema};
