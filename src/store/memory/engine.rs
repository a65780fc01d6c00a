use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::capabilities::Capabilities;
use crate::store::engine::{Engine, EngineProvider};
use crate::store::kv_store::{Store, StoreProvider};
use crate::store::memory::store::MemoryStore;
use crate::store::options::StoreOptions;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Registration name of the in-memory engine.
pub const MEMORY_ENGINE: &str = "memory";

/// Option key bounding the total value bytes a store may hold.
pub const MAX_SIZE_OPTION: &str = "max_size";

/// Option key bounding how many version snapshots a store retains.
pub const MAX_VERSIONS_OPTION: &str = "max_versions";

/// Version snapshots retained when `max_versions` is not configured.
pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// Factory for the full-featured in-memory backend.
///
/// # Purpose
/// `MemoryEngine` creates and tracks `MemoryStore` instances by name. It
/// advertises the full capability set: transactions, versioning, and range
/// queries.
///
/// # Options
/// - `max_size` (integer): bound on total value bytes; unbounded if absent
/// - `max_versions` (integer): version retention; defaults to 10
///
/// Wrong-typed or non-positive values fall back to the defaults.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    inner: Arc<MemoryEngineInner>,
}

impl MemoryEngine {
    pub fn new() -> MemoryEngine {
        MemoryEngine {
            inner: Arc::new(MemoryEngineInner::default()),
        }
    }

    /// Convenience constructor returning the engine behind the generic handle.
    pub fn create_engine() -> Engine {
        Engine::new(MemoryEngine::new())
    }
}

#[derive(Default)]
struct MemoryEngineInner {
    stores: DashMap<String, MemoryStore>,
}

impl EngineProvider for MemoryEngine {
    fn name(&self) -> String {
        MEMORY_ENGINE.to_string()
    }

    fn create(&self, name: &str, path: &str, options: &StoreOptions) -> CellarResult<Store> {
        let max_size = options
            .get_integer(MAX_SIZE_OPTION)
            .filter(|v| *v > 0)
            .map(|v| v as u64);
        let max_versions = options
            .get_integer(MAX_VERSIONS_OPTION)
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_MAX_VERSIONS);

        match self.inner.stores.entry(name.to_string()) {
            Entry::Occupied(_) => Err(CellarError::new(
                &format!("store '{}' already exists", name),
                ErrorKind::StoreExists,
            )),
            Entry::Vacant(entry) => {
                log::debug!("creating memory store '{}'", name);
                let store = MemoryStore::new(name, path, max_size, max_versions);
                entry.insert(store.clone());
                Ok(Store::new(store))
            }
        }
    }

    fn open(&self, name: &str, _path: &str) -> CellarResult<Store> {
        let store = self.inner.stores.get(name).ok_or_else(|| {
            CellarError::new(
                &format!("store '{}' not found", name),
                ErrorKind::StoreNotFound,
            )
        })?;

        // A closed store's data is gone; open never resurrects it.
        if store.is_closed()? {
            return Err(CellarError::new(
                &format!("store '{}' is closed", name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(Store::new(store.clone()))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::capabilities::Versioned;

    #[test]
    fn test_engine_identity_and_capabilities() {
        let engine = MemoryEngine::new();
        assert_eq!(engine.name(), MEMORY_ENGINE);

        let caps = engine.capabilities();
        assert!(caps.transactions);
        assert!(caps.versioning);
        assert!(caps.range_queries);
        assert!(!caps.persistent);
        assert!(!caps.compressed);
    }

    #[test]
    fn test_create_and_open() {
        let engine = MemoryEngine::new();
        let store = engine
            .create("users", "/data/users", &StoreOptions::new())
            .unwrap();
        store.set(b"k", b"v").unwrap();

        // open returns a handle over the same live data.
        let reopened = engine.open("users", "/data/users").unwrap();
        assert_eq!(reopened.get(b"k").unwrap(), b"v");
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let engine = MemoryEngine::new();
        engine.create("users", "", &StoreOptions::new()).unwrap();

        let err = engine
            .create("users", "", &StoreOptions::new())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreExists);
    }

    #[test]
    fn test_open_unknown_store() {
        let engine = MemoryEngine::new();
        let err = engine.open("nope", "").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreNotFound);
    }

    #[test]
    fn test_open_never_resurrects_closed_store() {
        let engine = MemoryEngine::new();
        let store = engine.create("users", "", &StoreOptions::new()).unwrap();
        store.set(b"k", b"v").unwrap();
        store.close().unwrap();

        let err = engine.open("users", "").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
    }

    #[test]
    fn test_options_are_applied() {
        let engine = MemoryEngine::new();
        let options = StoreOptions::new()
            .with(MAX_SIZE_OPTION, 10i64)
            .with(MAX_VERSIONS_OPTION, 2);
        let store = engine.create("bounded", "", &options).unwrap();

        let err = store.set(b"k", &[0u8; 11]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidConfig);

        let versioned = store.versioned().unwrap();
        for i in 0..4u8 {
            store.set(b"k", &[i]).unwrap();
            versioned.save_version().unwrap();
        }
        assert_eq!(versioned.list_versions().unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_wrong_typed_options_fall_back_to_defaults() {
        let engine = MemoryEngine::new();
        let options = StoreOptions::new()
            .with(MAX_SIZE_OPTION, "huge")
            .with(MAX_VERSIONS_OPTION, -1);
        let store = engine.create("lax", "", &options).unwrap();

        // No size bound applied.
        store.set(b"k", &[0u8; 1024]).unwrap();

        // Default retention of 10.
        let versioned = store.versioned().unwrap();
        for i in 0..12u8 {
            store.set(b"k", &[i]).unwrap();
            versioned.save_version().unwrap();
        }
        assert_eq!(versioned.list_versions().unwrap().len(), DEFAULT_MAX_VERSIONS);
    }

    #[test]
    fn test_stores_are_namespaced_per_engine() {
        let engine1 = MemoryEngine::new();
        let engine2 = MemoryEngine::new();
        engine1.create("users", "", &StoreOptions::new()).unwrap();

        // A second engine instance has its own table.
        assert!(engine2.create("users", "", &StoreOptions::new()).is_ok());
    }
}
