use crate::errors::CellarResult;
use crate::store::transaction::Transaction;

/// Static declaration of the optional features a store backend supports.
///
/// # Purpose
/// An engine advertises its `Capabilities` once, engine-wide; callers use the
/// descriptor to decide which optional interfaces to look for on the stores the
/// engine produces. The descriptor must match what the store type actually
/// implements: a capability flagged here and a `Some` return from the matching
/// `as_*` downcast go together.
///
/// # Fields
/// - `transactions`: stores support `begin_tx`/commit/rollback overlays
/// - `versioning`: stores support point-in-time snapshots
/// - `range_queries`: stores support ordered range iteration
/// - `persistent`: data survives process restart (no in-tree backend does)
/// - `compressed`: values are stored compressed (no in-tree backend does)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub transactions: bool,
    pub versioning: bool,
    pub range_queries: bool,
    pub persistent: bool,
    pub compressed: bool,
}

impl Capabilities {
    /// The full in-memory profile: transactions, versioning, and range queries,
    /// without persistence or compression.
    pub const fn memory() -> Capabilities {
        Capabilities {
            transactions: true,
            versioning: true,
            range_queries: true,
            persistent: false,
            compressed: false,
        }
    }

    /// The degenerate profile with no optional features at all.
    pub const fn none() -> Capabilities {
        Capabilities {
            transactions: false,
            versioning: false,
            range_queries: false,
            persistent: false,
            compressed: false,
        }
    }
}

/// Optional capability: transactional overlays.
///
/// A store advertising this capability can create short-lived transactions that
/// buffer writes and deletes in an overlay until committed. Only one level of
/// overlay is supported; transactions cannot be nested.
pub trait Transactional: Send + Sync {
    /// Begins a new transaction against this store.
    ///
    /// The returned transaction is live, not a copy: reads through it observe
    /// the store as of the moment each read occurs, shadowed by the overlay.
    /// The transaction holds no store lock between creation and commit, so a
    /// long-lived transaction never blocks other store operations; it only
    /// risks a `StoreClosed` failure at commit time if the store was closed in
    /// the meantime.
    ///
    /// # Arguments
    /// * `read_only` - when true, `set` and `delete` on the transaction fail
    ///   with `TxReadOnly`
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn begin_tx(&self, read_only: bool) -> CellarResult<Transaction>;

    /// Reports whether this store supports transactions. Always true for
    /// implementers; present so the capability can be queried uniformly.
    fn supports_transactions(&self) -> bool {
        true
    }
}

/// Optional capability: point-in-time versioning.
///
/// Versions are full, immutable snapshots of the store's contents paired with a
/// deterministic content hash. They are created only by `save_version`, never
/// mutated, and destroyed only by the retention policy (oldest-first eviction)
/// or by closing the store.
pub trait Versioned: Send + Sync {
    /// Snapshots the current contents as a new version.
    ///
    /// Version numbers are issued monotonically starting at 1. The returned
    /// hash is computed over the key/value pairs sorted ascending by key, so
    /// two snapshots of identical content hash identically and any content
    /// difference yields a different hash. If retention now exceeds the
    /// configured maximum version count, the numerically oldest versions are
    /// evicted until the count is within bound.
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn save_version(&self) -> CellarResult<(u64, Vec<u8>)>;

    /// Replaces the store's live data with a copy of the given version's
    /// snapshot.
    ///
    /// This is a destructive, non-reversible replace of current state; it does
    /// not itself create a new version.
    ///
    /// # Errors
    /// * `VersionNotFound` if the version is not retained
    /// * `StoreClosed` if the store has been closed
    fn load_version(&self, version: u64) -> CellarResult<()>;

    /// Lists the version numbers currently retained, in ascending order.
    fn list_versions(&self) -> CellarResult<Vec<u64>>;

    /// Returns the highest version number ever issued.
    ///
    /// Monotonic and independent of how many versions remain after eviction.
    fn current_version(&self) -> CellarResult<u64>;

    /// Reports whether this store supports versioning.
    fn supports_versioning(&self) -> bool {
        true
    }
}

/// Optional capability: ordered range iteration.
pub trait RangeQueryable: Send + Sync {
    /// Scans keys in the half-open interval `[start, end)` under lexicographic
    /// byte ordering. An empty `start` means no lower bound; an empty `end`
    /// means no upper bound.
    ///
    /// Keys are collected and sorted on every call (there is no persistent
    /// index), then delivered to `f` in ascending or descending order with
    /// defensive copies. Iteration stops early when `f` returns `false`.
    ///
    /// # Errors
    /// * `StoreClosed` if the store has been closed
    fn iterate_range(
        &self,
        start: &[u8],
        end: &[u8],
        ascending: bool,
        f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool,
    ) -> CellarResult<()>;

    /// Reports whether this store supports range queries.
    fn supports_range_queries(&self) -> bool {
        true
    }
}
