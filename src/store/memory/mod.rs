//! Full-featured in-memory backend: transactions, versioning, range queries.

mod engine;
mod store;
mod transaction;

pub use engine::{
    MemoryEngine, DEFAULT_MAX_VERSIONS, MAX_SIZE_OPTION, MAX_VERSIONS_OPTION, MEMORY_ENGINE,
};
pub use store::MemoryStore;
pub use transaction::MemoryTransaction;
