use crate::errors::CellarResult;
use crate::store::capabilities::{RangeQueryable, Transactional, Versioned};
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface every store backend must provide.
///
/// # Purpose
/// Defines the mandatory key-value contract for all store implementations:
/// reads, writes, existence checks, whole-store iteration, lifecycle, and
/// identity. Optional features (transactions, versioning, range queries) are
/// exposed through the capability downcasts rather than mandatory methods, so a
/// minimal backend only implements what it truly supports.
///
/// # Defensive copying
/// Keys and values cross this boundary by copy in both directions: callers pass
/// borrowed slices, implementations store their own buffers, and every value
/// handed back (from `get` or an iteration callback) is an independent copy.
/// Callers must never be able to observe or induce aliasing with a store's
/// internal buffers. This is a safety contract, not an optimization target.
///
/// # Implementations
/// - `MemoryStore`: in-memory backend with transactions, versioning, and range
///   queries
/// - `BasicStore`: minimal in-memory backend with none of the optional
///   capabilities and strict delete semantics
///
/// # Thread Safety
/// Implementers must be `Send + Sync` for safe use in concurrent contexts.
pub trait StoreProvider: Send + Sync {
    /// Returns the logical name of the store.
    fn name(&self) -> String;

    /// Returns the path argument the store was created with.
    ///
    /// Non-persistent backends carry the path as identity only and never touch
    /// the filesystem.
    fn path(&self) -> String;

    /// Returns a copy of the value stored under `key`.
    ///
    /// # Errors
    /// * `KeyNotFound` if the key does not exist
    /// * `StoreClosed` if the store has been closed
    fn get(&self, key: &[u8]) -> CellarResult<Vec<u8>>;

    /// Stores a copy of `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// * `InvalidConfig` if a configured maximum size bound would be exceeded;
    ///   the store is left unchanged in that case
    /// * `StoreClosed` if the store has been closed
    fn set(&self, key: &[u8], value: &[u8]) -> CellarResult<()>;

    /// Removes `key` from the store.
    ///
    /// Whether deleting an absent key is a no-op success or a `KeyNotFound`
    /// error is backend-defined: `MemoryStore` is lenient (no-op), `BasicStore`
    /// is strict (error). See the backend documentation.
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn delete(&self, key: &[u8]) -> CellarResult<()>;

    /// Checks whether `key` exists in the store.
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn has(&self, key: &[u8]) -> CellarResult<bool>;

    /// Calls `f` once per key/value pair with defensive copies, in unspecified
    /// order. Iteration stops early the first time `f` returns `false`.
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn iterate(&self, f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool) -> CellarResult<()>;

    /// Closes the store, discarding all data and version snapshots.
    ///
    /// Closing is idempotent: a second call is a no-op success. Every other
    /// operation on a closed store fails with `StoreClosed`.
    fn close(&self) -> CellarResult<()>;

    /// Checks whether the store has been closed.
    fn is_closed(&self) -> CellarResult<bool>;

    /// Returns the transactional capability of this store, if supported.
    ///
    /// Callers must check for `None` and treat absence as "feature not
    /// supported", never as a programming error.
    fn as_transactional(&self) -> Option<&dyn Transactional> {
        None
    }

    /// Returns the versioning capability of this store, if supported.
    fn as_versioned(&self) -> Option<&dyn Versioned> {
        None
    }

    /// Returns the range-query capability of this store, if supported.
    fn as_range_queryable(&self) -> Option<&dyn RangeQueryable> {
        None
    }
}

/// High-level handle for a store backend.
///
/// # Purpose
/// `Store` is the public API for interacting with a store instance. It wraps a
/// concrete `StoreProvider` implementation in an `Arc` for efficient,
/// thread-safe sharing across the application.
///
/// # Characteristics
/// - **Thread-Safe**: can be safely cloned and shared across threads
/// - **Provider-Agnostic**: works with any `StoreProvider` implementation
/// - **Ergonomic**: implements `Deref` for seamless access to provider methods
/// - **Lightweight**: cloning only increments the reference count
///
/// # Usage Example
/// ```text
/// let store = engine.create("users", "/data/users", &StoreOptions::new())?;
/// store.set(b"user:1", b"alice")?;
/// let value = store.get(b"user:1")?;
///
/// // Optional capabilities are checked, never assumed
/// if let Some(tx_cap) = store.transactional() {
///     let tx = tx_cap.begin_tx(false)?;
///     tx.set(b"user:2", b"bob")?;
///     tx.commit()?;
/// }
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn StoreProvider>,
}

impl Store {
    /// Creates a new `Store` wrapping a provider implementation.
    pub fn new<T: StoreProvider + 'static>(inner: T) -> Self {
        Store {
            inner: Arc::new(inner),
        }
    }

    /// Returns the transactional capability, if the backend supports it.
    pub fn transactional(&self) -> Option<&dyn Transactional> {
        self.inner.as_transactional()
    }

    /// Returns the versioning capability, if the backend supports it.
    pub fn versioned(&self) -> Option<&dyn Versioned> {
        self.inner.as_versioned()
    }

    /// Returns the range-query capability, if the backend supports it.
    pub fn range_queryable(&self) -> Option<&dyn RangeQueryable> {
        self.inner.as_range_queryable()
    }
}

impl Deref for Store {
    type Target = Arc<dyn StoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name())
            .finish()
    }
}
