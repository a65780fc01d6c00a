use crate::errors::CellarResult;
use crate::store::kv_store::StoreProvider;
use std::ops::Deref;
use std::sync::Arc;

/// Contract for a store-scoped transaction.
///
/// # Purpose
/// A transaction is a short-lived overlay of pending writes and deletes layered
/// over its parent store. It extends the full `StoreProvider` contract so that
/// callers can use a transaction polymorphically wherever a store is expected:
/// reads resolve through the overlay first and fall back to the live store;
/// writes and deletes touch only the overlay until `commit`.
///
/// # Lifecycle
/// A transaction is terminated by exactly one of `commit` or `rollback`.
/// Subsequent calls to either, or to any read/write operation, fail with
/// `TxNotActive`. `close()` on a transaction is defined as `rollback()`.
///
/// # Thread Safety
/// A transaction object is not designed for concurrent use by multiple
/// threads; callers must confine one transaction to one logical unit of work.
pub trait TransactionProvider: StoreProvider {
    /// Atomically applies every pending write and delete to the parent store.
    ///
    /// The whole apply step happens under a single acquisition of the store's
    /// write lock, so no concurrent reader can observe a partial application.
    /// The transaction is marked inactive whether or not the apply succeeds.
    ///
    /// # Errors
    /// * `StoreClosed` if the store was closed after the transaction began;
    ///   the store is left unchanged
    /// * `InvalidConfig` if applying the batch would exceed the store's
    ///   configured size bound; the store is left unchanged
    /// * `TxNotActive` if the transaction was already committed or rolled back
    fn commit(&self) -> CellarResult<()>;

    /// Discards all pending writes and deletes and marks the transaction
    /// inactive. Never touches the parent store.
    ///
    /// # Errors
    /// * `TxNotActive` if the transaction was already committed or rolled back
    fn rollback(&self) -> CellarResult<()>;

    /// Checks whether the transaction is still active.
    fn is_active(&self) -> CellarResult<bool>;

    /// Checks whether the transaction was opened read-only.
    fn is_read_only(&self) -> CellarResult<bool>;
}

/// High-level handle for a transaction.
///
/// Wraps a concrete `TransactionProvider` in an `Arc`, mirroring the `Store`
/// wrapper, so a transaction can be passed around and dereferenced to the full
/// store contract plus commit/rollback.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<dyn TransactionProvider>,
}

impl Transaction {
    /// Creates a new `Transaction` wrapping a provider implementation.
    pub fn new<T: TransactionProvider + 'static>(inner: T) -> Self {
        Transaction {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Transaction {
    type Target = Arc<dyn TransactionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("store", &self.inner.name())
            .finish()
    }
}
