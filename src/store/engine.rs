use crate::errors::CellarResult;
use crate::store::capabilities::Capabilities;
use crate::store::kv_store::Store;
use crate::store::options::StoreOptions;
use std::ops::Deref;
use std::sync::Arc;

/// Factory interface for one kind of store backend.
///
/// # Purpose
/// An engine creates and opens named store instances of a single backend kind
/// and advertises, once and statically, which optional capabilities those
/// stores support. The multi-store resolves logical store names to engines
/// through the `EngineRegistry` and delegates creation here.
///
/// # Implementations
/// - `MemoryEngine`: full-featured in-memory backend
/// - `BasicEngine`: minimal in-memory backend with no optional capabilities
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; engine methods may be called
/// concurrently from multiple threads.
pub trait EngineProvider: Send + Sync {
    /// Returns the registration name of this engine.
    fn name(&self) -> String;

    /// Creates a new named store.
    ///
    /// Engine-specific hints are parsed from `options`; unrecognized keys are
    /// ignored and wrong-typed values fall back to defaults. Non-persistent
    /// engines keep `path` as identity only.
    ///
    /// # Errors
    /// * `StoreExists` if this engine already knows the name
    fn create(&self, name: &str, path: &str, options: &StoreOptions) -> CellarResult<Store>;

    /// Opens an existing named store.
    ///
    /// For a non-persistent engine, `open` and `create` observe the same
    /// underlying table: `open` never resurrects data discarded by `close`.
    ///
    /// # Errors
    /// * `StoreNotFound` if this engine has no record of the name
    /// * `StoreClosed` if the record exists but the store was closed
    fn open(&self, name: &str, path: &str) -> CellarResult<Store>;

    /// Returns the engine-wide capability declaration.
    fn capabilities(&self) -> Capabilities;
}

/// High-level handle for an engine, wrapping a concrete `EngineProvider` in an
/// `Arc` so one engine instance can be shared between a registry and its
/// callers.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<dyn EngineProvider>,
}

impl Engine {
    /// Creates a new `Engine` wrapping a provider implementation.
    pub fn new<T: EngineProvider + 'static>(inner: T) -> Self {
        Engine {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Engine {
    type Target = Arc<dyn EngineProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.inner.name())
            .finish()
    }
}
