use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::engine::{Engine, EngineProvider};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Name-keyed lookup table of registered engines.
///
/// # Purpose
/// `EngineRegistry` maps engine names to `Engine` factories, independent of any
/// particular engine implementation. It is explicitly constructed and passed
/// around (typically owned by a `MultiStore`); there is no process-wide
/// singleton, so a registry's lifetime is scoped to whoever owns it.
///
/// # Thread Safety
/// All operations are guarded by a single reader/writer lock over the table.
/// The registry can be cloned cheaply; clones share the same table.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    inner: Arc<EngineRegistryInner>,
}

impl EngineRegistry {
    /// Creates an empty registry.
    pub fn new() -> EngineRegistry {
        EngineRegistry {
            inner: Arc::new(EngineRegistryInner::default()),
        }
    }

    /// Registers an engine under its own name.
    ///
    /// # Errors
    /// * `InvalidConfig` if the engine's name is empty
    /// * `EngineExists` if an engine with the same name is already registered
    pub fn register(&self, engine: Engine) -> CellarResult<()> {
        let name = engine.name();
        if name.is_empty() {
            return Err(CellarError::new(
                "cannot register an engine with an empty name",
                ErrorKind::InvalidConfig,
            ));
        }

        let mut engines = self.inner.engines.write();
        if engines.contains_key(&name) {
            log::error!("engine '{}' is already registered", name);
            return Err(CellarError::new(
                &format!("engine '{}' is already registered", name),
                ErrorKind::EngineExists,
            ));
        }

        log::debug!("registered engine '{}'", name);
        engines.insert(name, engine);
        Ok(())
    }

    /// Returns the engine registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Engine> {
        self.inner.engines.read().get(name).cloned()
    }

    /// Removes and returns the engine registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<Engine> {
        self.inner.engines.write().remove(name)
    }

    /// Lists the names of all registered engines.
    pub fn list(&self) -> Vec<String> {
        self.inner.engines.read().keys().cloned().collect()
    }

    /// Checks whether an engine is registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.inner.engines.read().contains_key(name)
    }

    /// Returns the number of registered engines.
    pub fn count(&self) -> usize {
        self.inner.engines.read().len()
    }

    /// Removes every registered engine.
    pub fn clear(&self) {
        self.inner.engines.write().clear()
    }
}

#[derive(Default)]
struct EngineRegistryInner {
    engines: RwLock<HashMap<String, Engine>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::capabilities::Capabilities;
    use crate::store::engine::EngineProvider;
    use crate::store::kv_store::Store;
    use crate::store::options::StoreOptions;

    struct NamedEngine {
        name: String,
    }

    impl NamedEngine {
        fn new(name: &str) -> Engine {
            Engine::new(NamedEngine {
                name: name.to_string(),
            })
        }
    }

    impl EngineProvider for NamedEngine {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn create(
            &self,
            _name: &str,
            _path: &str,
            _options: &StoreOptions,
        ) -> CellarResult<Store> {
            Err(CellarError::new("unsupported", ErrorKind::InternalError))
        }

        fn open(&self, _name: &str, _path: &str) -> CellarResult<Store> {
            Err(CellarError::new("unsupported", ErrorKind::InternalError))
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::none()
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = EngineRegistry::new();
        registry.register(NamedEngine::new("memory")).unwrap();

        let engine = registry.get("memory").unwrap();
        assert_eq!(engine.name(), "memory");
        assert!(registry.get("disk").is_none());
    }

    #[test]
    fn test_register_rejects_empty_name() {
        let registry = EngineRegistry::new();
        let err = registry.register(NamedEngine::new("")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let registry = EngineRegistry::new();
        registry.register(NamedEngine::new("memory")).unwrap();

        let err = registry.register(NamedEngine::new("memory")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EngineExists);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = EngineRegistry::new();
        registry.register(NamedEngine::new("memory")).unwrap();

        assert!(registry.unregister("memory").is_some());
        assert!(registry.unregister("memory").is_none());
        assert!(!registry.has("memory"));
    }

    #[test]
    fn test_list_and_count() {
        let registry = EngineRegistry::new();
        registry.register(NamedEngine::new("memory")).unwrap();
        registry.register(NamedEngine::new("basic")).unwrap();

        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["basic".to_string(), "memory".to_string()]);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_clear() {
        let registry = EngineRegistry::new();
        registry.register(NamedEngine::new("memory")).unwrap();
        registry.clear();
        assert_eq!(registry.count(), 0);
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_clones_share_table() {
        let registry = EngineRegistry::new();
        let clone = registry.clone();
        registry.register(NamedEngine::new("memory")).unwrap();
        assert!(clone.has("memory"));
    }
}
