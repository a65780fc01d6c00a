use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::kv_store::StoreProvider;
use crate::store::memory::store::MemoryStore;
use crate::store::transaction::TransactionProvider;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Overlay transaction over a `MemoryStore`.
///
/// # Purpose
/// `MemoryTransaction` buffers writes and deletes in a private overlay while
/// reads resolve through the overlay first, then fall back to the live store.
/// Nothing touches the parent store before `commit`, and `commit` applies the
/// whole batch under one acquisition of the store's write lock.
///
/// # Characteristics
/// - **Read-Your-Writes**: the transaction observes its own pending changes
/// - **Isolated**: other readers of the store never see uncommitted state
/// - **No Store Lock Held**: between creation and commit, the transaction
///   holds no lock on the parent store, so long-lived transactions never
///   block direct store access
#[derive(Clone)]
pub struct MemoryTransaction {
    inner: Arc<MemoryTransactionInner>,
}

impl MemoryTransaction {
    pub(crate) fn new(store: MemoryStore, read_only: bool) -> MemoryTransaction {
        MemoryTransaction {
            inner: Arc::new(MemoryTransactionInner {
                store,
                read_only,
                state: Mutex::new(TxState {
                    writes: HashMap::new(),
                    deletes: HashSet::new(),
                    active: true,
                }),
            }),
        }
    }
}

struct MemoryTransactionInner {
    store: MemoryStore,
    read_only: bool,
    state: Mutex<TxState>,
}

struct TxState {
    writes: HashMap<Vec<u8>, Vec<u8>>,
    deletes: HashSet<Vec<u8>>,
    active: bool,
}

impl MemoryTransactionInner {
    fn check_active(&self, state: &TxState) -> CellarResult<()> {
        if !state.active {
            return Err(CellarError::new(
                "transaction is no longer active",
                ErrorKind::TxNotActive,
            ));
        }
        Ok(())
    }

    fn check_writable(&self, state: &TxState) -> CellarResult<()> {
        self.check_active(state)?;
        if self.read_only {
            return Err(CellarError::new(
                "transaction is read-only",
                ErrorKind::TxReadOnly,
            ));
        }
        Ok(())
    }
}

impl StoreProvider for MemoryTransaction {
    fn name(&self) -> String {
        self.inner.store.name()
    }

    fn path(&self) -> String {
        self.inner.store.path()
    }

    fn get(&self, key: &[u8]) -> CellarResult<Vec<u8>> {
        // Resolve through the overlay under the tx lock, then drop the guard
        // before falling back to the store so lock order stays one-level.
        {
            let state = self.inner.state.lock();
            self.inner.check_active(&state)?;

            if state.deletes.contains(key) {
                return Err(CellarError::new(
                    &format!("key not found in store '{}'", self.inner.store.name()),
                    ErrorKind::KeyNotFound,
                ));
            }
            if let Some(value) = state.writes.get(key) {
                return Ok(value.clone());
            }
        }
        self.inner.store.get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> CellarResult<()> {
        let mut state = self.inner.state.lock();
        self.inner.check_writable(&state)?;

        state.deletes.remove(key);
        state.writes.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> CellarResult<()> {
        let mut state = self.inner.state.lock();
        self.inner.check_writable(&state)?;

        state.writes.remove(key);
        state.deletes.insert(key.to_vec());
        Ok(())
    }

    fn has(&self, key: &[u8]) -> CellarResult<bool> {
        {
            let state = self.inner.state.lock();
            self.inner.check_active(&state)?;

            if state.deletes.contains(key) {
                return Ok(false);
            }
            if state.writes.contains_key(key) {
                return Ok(true);
            }
        }
        self.inner.store.has(key)
    }

    fn iterate(&self, f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool) -> CellarResult<()> {
        let entries = {
            let state = self.inner.state.lock();
            self.inner.check_active(&state)?;
            self.inner
                .store
                .merged_entries(&state.writes, &state.deletes)?
        };

        for (key, value) in entries {
            if !f(key, value) {
                break;
            }
        }
        Ok(())
    }

    // Closing a transaction discards it.
    fn close(&self) -> CellarResult<()> {
        self.rollback()
    }

    fn is_closed(&self) -> CellarResult<bool> {
        Ok(!self.inner.state.lock().active)
    }
}

impl TransactionProvider for MemoryTransaction {
    fn commit(&self) -> CellarResult<()> {
        let (writes, deletes) = {
            let mut state = self.inner.state.lock();
            self.inner.check_active(&state)?;

            // Deactivate first: the transaction terminates whether or not the
            // apply below succeeds.
            state.active = false;
            (
                std::mem::take(&mut state.writes),
                std::mem::take(&mut state.deletes),
            )
        };

        self.inner.store.apply_tx(&writes, &deletes)
    }

    fn rollback(&self) -> CellarResult<()> {
        let mut state = self.inner.state.lock();
        self.inner.check_active(&state)?;

        state.active = false;
        state.writes.clear();
        state.deletes.clear();
        Ok(())
    }

    fn is_active(&self) -> CellarResult<bool> {
        Ok(self.inner.state.lock().active)
    }

    fn is_read_only(&self) -> CellarResult<bool> {
        Ok(self.inner.read_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::capabilities::Transactional;

    fn create_test_store() -> MemoryStore {
        MemoryStore::new("tx_store", "", None, 10)
    }

    #[test]
    fn test_writes_invisible_until_commit() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();

        tx.set(b"key1", b"value1").unwrap();
        assert!(!store.has(b"key1").unwrap());
        assert_eq!(tx.get(b"key1").unwrap(), b"value1");

        tx.commit().unwrap();
        assert_eq!(store.get(b"key1").unwrap(), b"value1");
    }

    #[test]
    fn test_read_falls_through_to_store() {
        let store = create_test_store();
        store.set(b"live", b"value").unwrap();

        let tx = store.begin_tx(false).unwrap();
        assert_eq!(tx.get(b"live").unwrap(), b"value");
        assert!(tx.has(b"live").unwrap());
    }

    #[test]
    fn test_pending_delete_hides_live_key() {
        let store = create_test_store();
        store.set(b"live", b"value").unwrap();

        let tx = store.begin_tx(false).unwrap();
        tx.delete(b"live").unwrap();
        assert!(!tx.has(b"live").unwrap());
        assert_eq!(tx.get(b"live").unwrap_err().kind(), &ErrorKind::KeyNotFound);

        // Still visible outside the transaction.
        assert!(store.has(b"live").unwrap());

        tx.commit().unwrap();
        assert!(!store.has(b"live").unwrap());
    }

    #[test]
    fn test_set_cancels_pending_delete() {
        let store = create_test_store();
        store.set(b"k", b"old").unwrap();

        let tx = store.begin_tx(false).unwrap();
        tx.delete(b"k").unwrap();
        tx.set(b"k", b"new").unwrap();
        assert_eq!(tx.get(b"k").unwrap(), b"new");

        tx.commit().unwrap();
        assert_eq!(store.get(b"k").unwrap(), b"new");
    }

    #[test]
    fn test_delete_cancels_pending_write() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();
        tx.set(b"k", b"v").unwrap();
        tx.delete(b"k").unwrap();

        tx.commit().unwrap();
        assert!(!store.has(b"k").unwrap());
    }

    #[test]
    fn test_rollback_discards_everything() {
        let store = create_test_store();
        store.set(b"live", b"value").unwrap();

        let tx = store.begin_tx(false).unwrap();
        tx.set(b"new", b"data").unwrap();
        tx.delete(b"live").unwrap();
        tx.rollback().unwrap();

        assert!(store.has(b"live").unwrap());
        assert!(!store.has(b"new").unwrap());
    }

    #[test]
    fn test_operations_fail_after_commit() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();
        tx.commit().unwrap();

        assert_eq!(tx.get(b"k").unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert_eq!(tx.set(b"k", b"v").unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert_eq!(tx.delete(b"k").unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert_eq!(tx.commit().unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert_eq!(tx.rollback().unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert!(!tx.is_active().unwrap());
    }

    #[test]
    fn test_operations_fail_after_rollback() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();
        tx.rollback().unwrap();

        assert_eq!(tx.set(b"k", b"v").unwrap_err().kind(), &ErrorKind::TxNotActive);
        assert_eq!(tx.rollback().unwrap_err().kind(), &ErrorKind::TxNotActive);
    }

    #[test]
    fn test_read_only_transaction_rejects_mutation() {
        let store = create_test_store();
        store.set(b"k", b"v").unwrap();

        let tx = store.begin_tx(true).unwrap();
        assert!(tx.is_read_only().unwrap());
        assert_eq!(tx.get(b"k").unwrap(), b"v");
        assert_eq!(tx.set(b"k", b"x").unwrap_err().kind(), &ErrorKind::TxReadOnly);
        assert_eq!(tx.delete(b"k").unwrap_err().kind(), &ErrorKind::TxReadOnly);

        // Committing an empty read-only transaction is fine.
        tx.commit().unwrap();
        assert_eq!(store.get(b"k").unwrap(), b"v");
    }

    #[test]
    fn test_iterate_merges_overlay() {
        let store = create_test_store();
        store.set(b"a", b"1").unwrap();
        store.set(b"b", b"2").unwrap();

        let tx = store.begin_tx(false).unwrap();
        tx.set(b"b", b"overridden").unwrap();
        tx.set(b"c", b"3").unwrap();
        tx.delete(b"a").unwrap();

        let mut seen = Vec::new();
        tx.iterate(&mut |k, v| {
            seen.push((k, v));
            true
        })
        .unwrap();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (b"b".to_vec(), b"overridden".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn test_close_is_rollback() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();
        tx.set(b"k", b"v").unwrap();
        tx.close().unwrap();

        assert!(tx.is_closed().unwrap());
        assert!(!store.has(b"k").unwrap());
    }

    #[test]
    fn test_commit_fails_on_closed_store() {
        let store = create_test_store();
        let tx = store.begin_tx(false).unwrap();
        tx.set(b"k", b"v").unwrap();
        store.close().unwrap();

        let err = tx.commit().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
        // The transaction is spent either way.
        assert!(!tx.is_active().unwrap());
    }

    #[test]
    fn test_commit_respects_size_bound_atomically() {
        let store = MemoryStore::new("bounded", "", Some(10), 10);
        store.set(b"a", &[0u8; 5]).unwrap();

        let tx = store.begin_tx(false).unwrap();
        tx.set(b"b", &[0u8; 4]).unwrap();
        tx.set(b"c", &[0u8; 4]).unwrap();

        let err = tx.commit().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidConfig);

        // Nothing from the batch landed.
        assert!(!store.has(b"b").unwrap());
        assert!(!store.has(b"c").unwrap());
        assert!(store.has(b"a").unwrap());

        // Headroom unchanged, a 5-byte write still fits.
        store.set(b"d", &[0u8; 5]).unwrap();
    }

    #[test]
    fn test_two_transactions_are_isolated() {
        let store = create_test_store();
        let tx1 = store.begin_tx(false).unwrap();
        let tx2 = store.begin_tx(false).unwrap();

        tx1.set(b"k", b"from_tx1").unwrap();
        assert!(!tx2.has(b"k").unwrap());

        tx1.commit().unwrap();
        // tx2 reads through to the now-committed value.
        assert_eq!(tx2.get(b"k").unwrap(), b"from_tx1");
    }
}
