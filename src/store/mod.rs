//! Storage engine abstraction layer.
//!
//! This module defines the pluggable storage contract and the built-in
//! backends. The shape of the layer:
//!
//! - [`kv_store::StoreProvider`] / [`kv_store::Store`]: the byte-oriented
//!   store contract every backend implements, and its shared handle
//! - [`capabilities`]: optional capability traits (transactions, versioning,
//!   range queries) plus the static [`capabilities::Capabilities`] descriptor
//! - [`transaction::Transaction`]: overlay transactions usable wherever a
//!   store is expected
//! - [`engine::Engine`] / [`engine_registry::EngineRegistry`]: backend
//!   factories and their name-keyed registry
//! - [`memory`]: the full-featured in-memory backend
//! - [`basic`]: the minimal in-memory backend
//! - [`event`]: store lifecycle events and the bus that delivers them

pub mod basic;
pub mod capabilities;
pub mod engine;
pub mod engine_registry;
pub mod event;
pub mod kv_store;
pub mod memory;
pub mod options;
pub mod transaction;

pub use basic::{BasicEngine, BasicStore, BASIC_ENGINE};
pub use capabilities::{Capabilities, RangeQueryable, Transactional, Versioned};
pub use engine::{Engine, EngineProvider};
pub use engine_registry::EngineRegistry;
pub use event::{
    CellarEventBus, StoreEventCallback, StoreEventInfo, StoreEventListener, StoreEvents,
    SubscriberRef,
};
pub use kv_store::{Store, StoreProvider};
pub use memory::{
    MemoryEngine, MemoryStore, MemoryTransaction, DEFAULT_MAX_VERSIONS, MAX_SIZE_OPTION,
    MAX_VERSIONS_OPTION, MEMORY_ENGINE,
};
pub use options::{ConfigValue, StoreOptions};
pub use transaction::{Transaction, TransactionProvider};
