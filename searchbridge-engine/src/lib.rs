//! Search engine capability for searchbridge.
//!
//! The sync core never talks to a concrete engine. It drives whatever
//! implements [`SearchClient`], obtained through a [`SearchConnector`] from
//! the [`NodeSettings`] derived for the configured [`OperatingMode`].
//!
//! Two implementations ship with the crate:
//! - [`MemoryEngine`]: an in-process backend, used for `MEMORY` mode
//! - [`mock::RecordingClient`]: wraps a memory engine, records every call
//!   and injects failures, for tests of code that drives an engine

mod client;
mod error;
mod feed;
mod memory;
pub mod mock;
mod settings;

pub use client::{SearchClient, SearchConnector};
pub use error::{EngineError, EngineResult};
pub use feed::{ChangeFeed, DatabaseConnection};
pub use memory::{MemoryConnector, MemoryEngine};
pub use settings::{NodeSettings, OperatingMode};
