// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for raw persisted blobs (keyed by logical name).
//!
//! The registry and the engine config both live behind this port. Adapters
//! decide where bytes go (`testprint-store-fs` writes `<base>/<key>.json`);
//! [`MemoryStore`] keeps them in-process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Storage port for raw blobs (keyed by logical name).
pub trait Store {
    /// Load a raw blob. Returns [`StoreError::NotFound`] when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    /// Persist a raw blob, replacing any previous value.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// In-process store. Clones share the same backing map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a blob is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }
}

impl Store for MemoryStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.load_raw("nope"), Err(StoreError::NotFound)));
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        store.save_raw("k", b"{}").unwrap();
        assert_eq!(store.load_raw("k").unwrap(), b"{}");
        assert!(store.contains_key("k"));
    }

    #[test]
    fn clones_share_state() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.save_raw("shared", b"1").unwrap();
        assert_eq!(b.load_raw("shared").unwrap(), b"1");
    }
}
