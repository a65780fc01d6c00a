use crate::errors::{CellarError, CellarResult, ErrorKind};
use crate::store::kv_store::StoreProvider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Minimal in-memory store backend.
///
/// # Purpose
/// `BasicStore` implements the core store contract and nothing else: no
/// transactions, no versioning, no range queries, no size bound. It exists as
/// the smallest useful backend and as the reference for capability-absent
/// behavior.
///
/// # Characteristics
/// - **Strict Delete**: deleting an absent key fails with `KeyNotFound`,
///   unlike the lenient variant of the full-featured backend
/// - **Defensive Copying**: values are copied on every boundary crossing
#[derive(Clone)]
pub struct BasicStore {
    inner: Arc<BasicStoreInner>,
}

impl BasicStore {
    pub fn new(name: &str, path: &str) -> BasicStore {
        assert!(!name.is_empty(), "store name must not be empty");
        BasicStore {
            inner: Arc::new(BasicStoreInner {
                name: name.to_string(),
                path: path.to_string(),
                state: RwLock::new(BasicState::default()),
            }),
        }
    }
}

struct BasicStoreInner {
    name: String,
    path: String,
    state: RwLock<BasicState>,
}

#[derive(Default)]
struct BasicState {
    data: HashMap<Vec<u8>, Vec<u8>>,
    closed: bool,
}

impl BasicStoreInner {
    fn check_open(&self, state: &BasicState) -> CellarResult<()> {
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

impl StoreProvider for BasicStore {
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

        state.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> CellarResult<()> {
        let mut state = self.inner.state.write();
        self.inner.check_open(&state)?;

        // Strict delete: the key must exist.
        if state.data.remove(key).is_none() {
            return Err(CellarError::new(
                &format!("key not found in store '{}'", self.inner.name),
                ErrorKind::KeyNotFound,
            ));
        }
        Ok(())
    }

    fn has(&self, key: &[u8]) -> CellarResult<bool> {
        let state = self.inner.state.read();
        self.inner.check_open(&state)?;
        Ok(state.data.contains_key(key))
    }

    fn iterate(&self, f: &mut dyn FnMut(Vec<u8>, Vec<u8>) -> bool) -> CellarResult<()> {
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
        state.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> CellarResult<bool> {
        Ok(self.inner.state.read().closed)
    }
}
