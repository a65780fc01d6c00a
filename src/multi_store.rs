use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::engine::{Engine, EngineProvider};
use crate::store::engine_registry::EngineRegistry;
use crate::store::event::{
    CellarEventBus, StoreEventInfo, StoreEventListener, StoreEvents, SubscriberRef,
};
use crate::store::kv_store::{Store, StoreProvider};
use crate::store::options::StoreOptions;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Orchestrator owning many named stores across many engines.
///
/// # Purpose
/// `MultiStore` is the top-level entry point of the library. It owns an
/// `EngineRegistry`, a table of open stores keyed by logical name, and an
/// event bus for lifecycle notifications. Store names are unique across the
/// whole multi-store regardless of which engine backs them.
///
/// # Usage
/// ```text
/// let multi = MultiStore::new("/data");
/// multi.register_engine(MemoryEngine::create_engine())?;
/// multi.register_engine(BasicEngine::create_engine())?;
///
/// // Empty engine name picks the default (first registered) engine.
/// let users = multi.create_store("users", "", &StoreOptions::new())?;
/// let cache = multi.create_store("cache", "basic", &StoreOptions::new())?;
///
/// multi.stop()?;
/// ```
///
/// # Thread Safety
/// All operations are safe to call concurrently. The store table is guarded
/// by one reader/writer lock; creation holds the exclusive mode across the
/// duplicate check and the engine call so two racing creates of the same name
/// cannot both succeed.
#[derive(Clone)]
pub struct MultiStore {
    inner: Arc<MultiStoreInner>,
}

impl MultiStore {
    /// Creates a new multi-store rooted at `root_path`.
    ///
    /// The root path is identity for non-persistent engines; each store's
    /// path is derived by joining the root with the store name.
    pub fn new(root_path: &str) -> MultiStore {
        MultiStore {
            inner: Arc::new(MultiStoreInner {
                root_path: root_path.to_string(),
                stores: RwLock::new(HashMap::new()),
                engines: EngineRegistry::new(),
                default_engine: RwLock::new(None),
                event_bus: CellarEventBus::new(),
            }),
        }
    }

    /// Registers an engine. The first engine registered becomes the default
    /// used when `create_store` is called with an empty engine name.
    ///
    /// # Errors
    /// * `EngineExists` if an engine with the same name is already registered
    /// * `InvalidConfig` if the engine's name is empty
    pub fn register_engine(&self, engine: Engine) -> CellarResult<()> {
        let name = engine.name();
        self.inner.engines.register(engine)?;

        let mut default = self.inner.default_engine.write();
        if default.is_none() {
            log::debug!("engine '{}' is now the default engine", name);
            *default = Some(name);
        }
        Ok(())
    }

    /// Returns the engine registry for direct inspection.
    pub fn engines(&self) -> &EngineRegistry {
        &self.inner.engines
    }

    /// Returns the name of the current default engine, if any.
    pub fn default_engine(&self) -> Option<String> {
        self.inner.default_engine.read().clone()
    }

    /// Changes the default engine.
    ///
    /// # Errors
    /// * `EngineNotFound` if no engine is registered under `name`
    pub fn set_default_engine(&self, name: &str) -> CellarResult<()> {
        if !self.inner.engines.has(name) {
            return Err(CellarError::new(
                &format!("engine '{}' is not registered", name),
                ErrorKind::EngineNotFound,
            ));
        }
        *self.inner.default_engine.write() = Some(name.to_string());
        Ok(())
    }

    /// Creates a new named store backed by the given engine.
    ///
    /// An empty `engine_name` selects the default engine. The store's path is
    /// the multi-store root joined with the store name.
    ///
    /// # Errors
    /// * `StoreExists` if any engine already backs a store with this name
    /// * `EngineNotFound` if `engine_name` is unknown, or it is empty and no
    ///   engine has been registered
    /// * engine-specific failures are wrapped with context, preserving their
    ///   kind
    pub fn create_store(
        &self,
        name: &str,
        engine_name: &str,
        options: &StoreOptions,
    ) -> CellarResult<Store> {
        let engine = self.resolve_engine(engine_name)?;

        // Exclusive over the whole check-create-insert sequence: a racing
        // create of the same name waits here and then fails the dup check.
        let mut stores = self.inner.stores.write();
        if stores.contains_key(name) {
            log::error!("store '{}' already exists", name);
            return Err(CellarError::new(
                &format!("store '{}' already exists", name),
                ErrorKind::StoreExists,
            ));
        }

        let path = Path::new(&self.inner.root_path)
            .join(name)
            .to_string_lossy()
            .into_owned();
        let store = engine.create(name, &path, options).map_err(|e| {
            let kind = e.kind().clone();
            CellarError::new_with_cause(
                &format!("engine '{}' failed to create store '{}'", engine.name(), name),
                kind,
                e,
            )
        })?;

        stores.insert(name.to_string(), store.clone());
        drop(stores);

        log::debug!("created store '{}' via engine '{}'", name, engine.name());
        self.notify(StoreEvents::Created, name);
        Ok(store)
    }

    /// Returns the open store registered under `name`, if any.
    pub fn get_store(&self, name: &str) -> Option<Store> {
        self.inner.stores.read().get(name).cloned()
    }

    /// Lists the names of all managed stores.
    pub fn list_stores(&self) -> Vec<String> {
        self.inner.stores.read().keys().cloned().collect()
    }

    /// Returns the number of managed stores.
    pub fn store_count(&self) -> usize {
        self.inner.stores.read().len()
    }

    /// Removes a store from the multi-store and closes it.
    ///
    /// A failure while closing, like a failing event listener, is logged but
    /// does not fail the deletion; the store is unmanaged either way.
    ///
    /// # Errors
    /// * `StoreNotFound` if no store is registered under `name`
    pub fn delete_store(&self, name: &str) -> CellarResult<()> {
        let store = {
            let mut stores = self.inner.stores.write();
            stores.remove(name).ok_or_else(|| {
                CellarError::new(
                    &format!("store '{}' not found", name),
                    ErrorKind::StoreNotFound,
                )
            })?
        };

        if let Err(e) = store.close() {
            log::warn!("failed to close store '{}' during deletion: {}", name, e);
        }

        log::debug!("deleted store '{}'", name);
        self.notify(StoreEvents::Deleted, name);
        Ok(())
    }

    /// Closes every managed store and empties the store table.
    ///
    /// All stores are attempted even when some fail; the table is cleared
    /// unconditionally. The first close failure's kind is preserved in the
    /// aggregate error. Listener failures are logged and never interrupt the
    /// loop.
    pub fn close_all(&self) -> CellarResult<()> {
        let stores: Vec<(String, Store)> = {
            let mut table = self.inner.stores.write();
            table.drain().collect()
        };

        let mut first_failure: Option<CellarError> = None;
        let mut failed = 0usize;
        for (name, store) in stores {
            match store.close() {
                Ok(_) => {
                    self.notify(StoreEvents::Closed, &name);
                }
                Err(e) => {
                    log::error!("failed to close store '{}': {}", name, e);
                    failed += 1;
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }

        match first_failure {
            None => Ok(()),
            Some(cause) => {
                let kind = cause.kind().clone();
                Err(CellarError::new_with_cause(
                    &format!("failed to close {} store(s)", failed),
                    kind,
                    cause,
                ))
            }
        }
    }

    /// Starts the multi-store. Present for lifecycle symmetry; no background
    /// work is required for the in-memory engines.
    pub fn start(&self) -> CellarResult<()> {
        log::debug!("multi-store at '{}' started", self.inner.root_path);
        Ok(())
    }

    /// Stops the multi-store, closing every managed store.
    pub fn stop(&self) -> CellarResult<()> {
        log::debug!("multi-store at '{}' stopping", self.inner.root_path);
        self.close_all()
    }

    /// Subscribes a listener to store lifecycle events.
    pub fn subscribe(&self, listener: StoreEventListener) -> CellarResult<SubscriberRef> {
        self.inner.event_bus.register(listener)
    }

    /// Removes a previously subscribed listener.
    pub fn unsubscribe(&self, subscriber: SubscriberRef) -> CellarResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }

    // Notifications are fire-and-forget: a failing listener must never change
    // the outcome of the store operation it observes.
    fn notify(&self, event: StoreEvents, name: &str) {
        if let Err(e) = self
            .inner
            .event_bus
            .publish(StoreEventInfo::new(event, name))
        {
            log::warn!("failed to publish store event for '{}': {}", name, e);
        }
    }

    fn resolve_engine(&self, engine_name: &str) -> CellarResult<Engine> {
        let name = if engine_name.is_empty() {
            self.inner.default_engine.read().clone().ok_or_else(|| {
                CellarError::new(
                    "no engine registered; register an engine before creating stores",
                    ErrorKind::EngineNotFound,
                )
            })?
        } else {
            engine_name.to_string()
        };

        self.inner.engines.get(&name).ok_or_else(|| {
            CellarError::new(
                &format!("engine '{}' is not registered", name),
                ErrorKind::EngineNotFound,
            )
        })
    }
}

struct MultiStoreInner {
    root_path: String,
    stores: RwLock<HashMap<String, Store>>,
    engines: EngineRegistry,
    default_engine: RwLock<Option<String>>,
    event_bus: CellarEventBus,
}
