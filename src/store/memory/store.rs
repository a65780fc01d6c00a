use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::capabilities::{RangeQueryable, Transactional, Versioned};
use crate::store::kv_store::StoreProvider;
use crate::store::memory::transaction::MemoryTransaction;
use crate::store::transaction::Transaction;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// In-memory store backend with transactions, versioning, and range queries.
///
/// # Purpose
/// `MemoryStore` is the full-featured concrete backend: a guarded byte-key to
/// byte-value mapping with optional size accounting, a transaction overlay
/// mechanism, and a retained history of point-in-time version snapshots. All
/// data lives in memory and is lost when the store is closed.
///
/// # Characteristics
/// - **Thread-Safe**: one reader/writer lock per store instance; mutating
///   operations take the exclusive mode, reads take the shared mode
/// - **Defensive Copying**: values are copied on every boundary crossing
/// - **Lenient Delete**: deleting an absent key is a no-op success, which keeps
///   the transactional apply path free of phantom failures
/// - **No Persistence**: `path` is carried as identity only
///
/// # Usage
/// Typically obtained via `MemoryEngine::create`:
/// ```text
/// let engine = MemoryEngine::new();
/// let store = engine.create("users", "/data/users", &StoreOptions::new())?;
/// store.set(b"user:1", b"alice")?;
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    /// Creates a new in-memory store.
    ///
    /// # Arguments
    /// * `name` - logical store name; must not be empty
    /// * `path` - identity path argument, never touched on disk
    /// * `max_size` - optional bound on the total value bytes stored
    /// * `max_versions` - number of version snapshots retained
    ///
    /// # Panics
    /// Panics if `name` is empty. This is a programmer error caught fail-fast
    /// in development, not a recoverable runtime failure.
    pub fn new(name: &str, path: &str, max_size: Option<u64>, max_versions: usize) -> MemoryStore {
        assert!(!name.is_empty(), "store name must not be empty");
        MemoryStore {
            inner: Arc::new(MemoryStoreInner {
                name: name.to_string(),
                path: path.to_string(),
                max_size,
                max_versions,
                state: RwLock::new(StoreState::default()),
            }),
        }
    }

    /// Applies a transaction's pending writes and deletes atomically.
    ///
    /// The whole batch is validated and applied under a single write-lock
    /// acquisition: either every entry lands or none does, and no concurrent
    /// reader observes a partial application.
    pub(crate) fn apply_tx(
        &self,
        writes: &HashMap<Vec<u8>, Vec<u8>>,
        deletes: &HashSet<Vec<u8>>,
    ) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        // Pre-validate the size bound over the whole batch so a rejection
        // leaves the store untouched. Writes and deletes never share a key.
        if let Some(max) = self.inner.max_size {
            let mut prospective = state.current_size;
            for (key, value) in writes {
                let old = state.data.get(key).map(|v| v.len() as u64).unwrap_or(0);
                prospective = prospective - old + value.len() as u64;
            }
            for key in deletes {
                if let Some(old) = state.data.get(key) {
                    prospective -= old.len() as u64;
                }
            }
            if prospective > max {
                return Err(CellarError::new(
                    &format!(
                        "committing transaction on store '{}' exceeds maximum store size",
                        self.inner.name
                    ),
                    ErrorKind::InvalidConfig,
                ));
            }
            state.current_size = prospective;
        }

        for (key, value) in writes {
            state.data.insert(key.clone(), value.clone());
        }
        for key in deletes {
            state.data.remove(key);
        }
        Ok(())
    }

    /// Returns the logical union of the live entries and a transaction overlay,
    /// resolved under a single read-lock acquisition so overlay values win over
    /// live values and pending deletes hide live keys.
    pub(crate) fn merged_entries(
        &self,
        writes: &HashMap<Vec<u8>, Vec<u8>>,
        deletes: &HashSet<Vec<u8>>,
    ) -> CellarResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;

        let mut entries = Vec::with_capacity(state.data.len() + writes.len());
        for (key, value) in &state.data {
            if deletes.contains(key) {
                continue;
            }
            match writes.get(key) {
                Some(pending) => entries.push((key.clone(), pending.clone())),
                None => entries.push((key.clone(), value.clone())),
            }
        }
        for (key, value) in writes {
            if !state.data.contains_key(key) {
                entries.push((key.clone(), value.clone()));
            }
        }
        Ok(entries)
    }
}

struct MemoryStoreInner {
    name: String,
    path: String,
    max_size: Option<u64>,
    max_versions: usize,
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    data: HashMap<Vec<u8>, Vec<u8>>,
    closed: bool,
    // Running total of value byte lengths, maintained only when max_size is set.
    current_size: u64,
    versions: BTreeMap<u64, HashMap<Vec<u8>, Vec<u8>>>,
    version_counter: u64,
}

impl MemoryStoreInner {
    fn check_open(&self, state: &StoreState) -> CellarResult<()> {
        if state.closed {
            log::error!("store '{}' is closed", self.name);
            return Err(CellarError::new(
                &format!("store '{}' is closed", self.name),
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }
}

/// Computes the deterministic content hash of a key/value set: pairs are
/// visited in ascending key order, accumulating key bytes then value bytes.
fn content_hash(data: &HashMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut keys: Vec<&Vec<u8>> = data.keys().collect();
    keys.sort();

    let mut hasher = Sha256::new();
    for key in keys {
        hasher.update(key);
        hasher.update(&data[key]);
    }
    hasher.finalize().to_vec()
}

impl StoreProvider for MemoryStore {
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    fn path(&self) -> String {
        self.inner.path.clone()
    }

    fn get(&self, key: &[u8]) -> CellarResult<Vec<u8>> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;

        state.data.get(key).cloned().ok_or_else(|| {
            CellarError::new(
                &format!("key not found in store '{}'", self.inner.name),
                ErrorKind::KeyNotFound,
            )
        })
    }

    fn set(&self, key: &[u8], value: &[u8]) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        if let Some(max) = self.inner.max_size {
            let old = state.data.get(key).map(|v| v.len() as u64).unwrap_or(0);
            let prospective = state.current_size - old + value.len() as u64;
            if prospective > max {
                return Err(CellarError::new(
                    &format!(
                        "value for key exceeds maximum store size of {} bytes",
                        max
                    ),
                    ErrorKind::InvalidConfig,
                ));
            }
            state.current_size = prospective;
        }

        state.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        // Lenient delete: removing an absent key succeeds without effect.
        if let Some(old) = state.data.remove(key) {
            if self.inner.max_size.is_some() {
                state.current_size -= old.len() as u64;
            }
        }
        Ok(())
    }

    fn has(&self, key: &[u8]) -> CellarResult<bool> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;
        Ok(state.data.contains_key(key))
    }

    fn iterate(&self, f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool) -> CellarResult<()> {
        // Snapshot under the read lock, deliver after releasing it, so the
        // callback may call back into the store without deadlocking.
        let entries: Vec<(Vec<u8>, Vec<u8>)> = {
            let state = self.inner.state.read();
            self.inner.check_open(&state)?;
            state
                .data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        for (key, value) in entries {
            if !f(key, value) {
                break;
            }
        }
        Ok(())
    }

    fn close(&self) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        if state.closed {
            return Ok(());
        }

        log::debug!("closing store '{}'", self.inner.name);
        state.data.clear();
        state.versions.clear();
        state.current_size = 0;
        state.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> CellarResult<bool> {
        Ok(self.inner.state.read().closed)
    }

    fn as_transactional(&self) -> Option<&dyn Transactional> {
        Some(self)
    }

    fn as_versioned(&self) -> Option<&dyn Versioned> {
        Some(self)
    }

    fn as_range_queryable(&self) -> Option<&dyn RangeQueryable> {
        Some(self)
    }
}

impl Transactional for MemoryStore {
    fn begin_tx(&self, read_only: bool) -> CellarResult<Transaction> {
        // Shared mode only to check the closed flag; the transaction holds no
        // store lock between creation and commit.
        {
            let state = self.inner.state.read();
            self.inner.check_open(&state)?;
        }
        Ok(Transaction::new(MemoryTransaction::new(
            self.clone(),
            read_only,
        )))
    }
}

impl Versioned for MemoryStore {
    fn save_version(&self) -> CellarResult<(u64, Vec<u8>)> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        state.version_counter += 1;
        let version = state.version_counter;
        let snapshot = state.data.clone();
        let hash = content_hash(&snapshot);
        state.versions.insert(version, snapshot);

        // Oldest-first eviction down to the retention bound.
        while state.versions.len() > self.inner.max_versions {
            if let Some((oldest, _)) = state.versions.pop_first() {
                log::debug!(
                    "store '{}': evicting version {} past retention bound",
                    self.inner.name,
                    oldest
                );
            }
        }

        Ok((version, hash))
    }

    fn load_version(&self, version: u64) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        let snapshot = state.versions.get(&version).cloned().ok_or_else(|| {
            CellarError::new(
                &format!(
                    "version {} not found in store '{}'",
                    version, self.inner.name
                ),
                ErrorKind::VersionNotFound,
            )
        })?;

        state.data = snapshot;
        if self.inner.max_size.is_some() {
            state.current_size = state.data.values().map(|v| v.len() as u64).sum();
        }
        Ok(())
    }

    fn list_versions(&self) -> CellarResult<Vec<u64>> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;
        Ok(state.versions.keys().copied().collect())
    }

    fn current_version(&self) -> CellarResult<u64> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;
        Ok(state.version_counter)
    }
}

impl RangeQueryable for MemoryStore {
    fn iterate_range(
        &self,
        start: &[u8],
        end: &[u8],
        ascending: bool,
        f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool,
    ) -> CellarResult<()> {
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = {
            let state = self.inner.state.read();
            self.inner.check_open(&state)?;
            state
                .data
                .iter()
                .filter(|(k, _)| {
                    (start.is_empty() || k.as_slice() >= start)
                        && (end.is_empty() || k.as_slice() < end)
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if !ascending {
            entries.reverse();
        }

        for (key, value) in entries {
            if !f(key, value) {
                break;
            }
        }
        Ok(())
    }
}
