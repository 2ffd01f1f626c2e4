// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fault-injecting wrapper around [`MemoryStore`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use testprint_core::{MemoryStore, Store, StoreError};

/// [`MemoryStore`] that can be told to fail and counts every port call, so
/// tests can check that registries and sessions degrade instead of aborting.
///
/// Clones share blobs, counters and fail flags.
///
/// ```
/// use testprint_core::{LoadStatus, Registry};
/// use testprint_dry_tests::FlakyStore;
///
/// let store = FlakyStore::new();
/// store.set_fail_on_load(true);
/// let registry = Registry::open(store.clone(), "test-ids");
///
/// assert_eq!(registry.load_status(), LoadStatus::Reset);
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
    blobs: MemoryStore,
    faults: Arc<Faults>,
}

#[derive(Debug, Default)]
struct Faults {
    loads: AtomicUsize,
    saves: AtomicUsize,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
}

impl FlakyStore {
    /// Empty store that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already holding `bytes` under `key`. Seeding is not counted.
    pub fn with_blob(key: &str, bytes: &[u8]) -> Self {
        let store = Self::new();
        let _ = store.blobs.save_raw(key, bytes);
        store
    }

    /// Make every following `load_raw` fail (or succeed again).
    pub fn set_fail_on_load(&self, fail: bool) {
        self.faults.fail_load.store(fail, Ordering::SeqCst);
    }

    /// Make every following `save_raw` fail (or succeed again). A failed save
    /// leaves the stored blob untouched.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.faults.fail_save.store(fail, Ordering::SeqCst);
    }

    /// `load_raw` calls so far, failed ones included.
    pub fn load_count(&self) -> usize {
        self.faults.loads.load(Ordering::SeqCst)
    }

    /// `save_raw` calls so far, failed ones included.
    pub fn save_count(&self) -> usize {
        self.faults.saves.load(Ordering::SeqCst)
    }

    /// Bytes under `key`, bypassing counters and fail flags.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.load_raw(key).ok()
    }

    /// Whether anything is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }
}

impl Store for FlakyStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.faults.loads.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Other(format!("injected load failure for `{key}`")));
        }
        self.blobs.load_raw(key)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.faults.saves.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Other(format!("injected save failure for `{key}`")));
        }
        self.blobs.save_raw(key, data)
    }
}
