use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::basic::store::BasicStore;
use crate::store::capabilities::Capabilities;
use crate::store::engine::{Engine, EngineProvider};
use crate::store::kv_store::{Store, StoreProvider};
use crate::store::options::StoreOptions;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Registration name of the basic engine.
pub const BASIC_ENGINE: &str = "basic";

/// Factory for the minimal in-memory backend.
///
/// Ignores all store options and advertises no optional capabilities.
#[derive(Clone, Default)]
pub struct BasicEngine {
    inner: Arc<BasicEngineInner>,
}

impl BasicEngine {
    pub fn new() -> BasicEngine {
        BasicEngine {
            inner: Arc::new(BasicEngineInner::default()),
        }
    }

    /// Convenience constructor returning the engine behind the generic handle.
    pub fn create_engine() -> Engine {
        Engine::new(BasicEngine::new())
    }
}

#[derive(Default)]
struct BasicEngineInner {
    stores: DashMap<String, BasicStore>,
}

impl EngineProvider for BasicEngine {
    fn name(&self) -> String {
        BASIC_ENGINE.to_string()
    }

    fn create(&self, name: &str, path: &str, _options: &StoreOptions) -> CellarResult<Store> {
        match self.inner.stores.entry(name.to_string()) {
            Entry::Occupied(_) => Err(CellarError::new(
                &format!("store '{}' already exists", name),
                ErrorKind::StoreExists,
            )),
            Entry::Vacant(entry) => {
                log::debug!("creating basic store '{}'", name);
                let store = BasicStore::new(name, path);
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

        if store.is_closed()? {
            return Err(CellarError::new(
                &format!("store '{}' is closed", name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(Store::new(store.clone()))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }
}
