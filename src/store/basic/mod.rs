//! Minimal in-memory backend with strict deletes and no optional capabilities.

mod engine;
mod store;

pub use engine::{BasicEngine, BASIC_ENGINE};
pub use store::BasicStore;
