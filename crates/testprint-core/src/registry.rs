// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted identifier → entry store.
//!
//! The registry is pure storage: it never decides identity. Entries are minted
//! by the [`Matcher`](crate::Matcher) and removed only by [`Registry::cleanup`].
//!
//! # Persisted Layout
//!
//! One JSON object keyed by identifier, in insertion order:
//!
//! ```json
//! {
//!   "3f0c9f7e-1d2b-4c61-9a43-5a8f3f2f6b10": {
//!     "hash": "<hex fingerprint>",
//!     "lastNodeId": "math.test.js::adds",
//!     "bodyLength": 31,
//!     "createdAt": 1760000000000,
//!     "lastSeen": 1760000000000
//!   }
//! }
//! ```
//!
//! Loading then saving reproduces the same bytes.
//!
//! # Ordering Invariant
//!
//! Iteration follows insertion order (file order for loaded entries). The fuzzy
//! matcher breaks score ties with it, and [`Registry::find_by_fingerprint`]
//! returns the earliest-inserted holder of a fingerprint.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::fingerprint::Fingerprint;
use crate::store::{Store, StoreError};

/// Default store key for the registry.
pub const DEFAULT_REGISTRY_KEY: &str = "test-ids";

/// Persistent test identifier: a random 128-bit UUID rendered in canonical
/// hyphenated lowercase form.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(Uuid);

impl TestId {
    /// Mint a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for TestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Last-known content fingerprint.
    #[serde(rename = "hash")]
    pub fingerprint: Fingerprint,
    /// Last-known location string (debugging aid, not an identity key).
    #[serde(rename = "lastNodeId")]
    pub last_location: String,
    /// Character length of the last-seen normalized body.
    pub body_length: usize,
    /// Epoch milliseconds at first allocation.
    pub created_at: u64,
    /// Epoch milliseconds at the last match or update.
    pub last_seen: u64,
}

/// How the registry's initial state was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing was persisted yet.
    Fresh,
    /// Persisted state decoded; carries the entry count.
    Loaded(usize),
    /// Persisted state existed but could not be read or decoded; the registry
    /// started empty.
    Reset,
}

/// Error type for registry persistence.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Entries could not be encoded.
    #[error("failed to encode registry: {0}")]
    Encode(#[from] serde_json::Error),
    /// The store rejected the write.
    #[error("failed to persist registry under `{key}`: {source}")]
    Store {
        /// Store key the registry lives under.
        key: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },
}

/// Milliseconds since the Unix epoch, read from the system clock.
pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// In-memory identifier → entry map bracketed by a load at construction and an
/// explicit [`save`](Registry::save).
///
/// `add`, `update` and `cleanup` touch memory only. A secondary
/// fingerprint → identifier index keeps exact lookups O(1).
pub struct Registry<S> {
    store: S,
    key: String,
    entries: IndexMap<TestId, RegistryEntry>,
    by_fingerprint: HashMap<Fingerprint, TestId>,
    clock: fn() -> u64,
    status: LoadStatus,
}

impl<S: Store> Registry<S> {
    /// Load the registry stored under `key`, stamping times with the system
    /// clock.
    pub fn open(store: S, key: impl Into<String>) -> Self {
        Self::with_clock(store, key, system_clock)
    }

    /// Load the registry stored under `key` with a custom millisecond clock.
    ///
    /// Never fails: a missing blob yields an empty registry, an unreadable or
    /// undecodable one yields an empty registry plus a warning.
    pub fn with_clock(store: S, key: impl Into<String>, clock: fn() -> u64) -> Self {
        let key = key.into();
        let (entries, status) = match store.load_raw(&key) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                (IndexMap::new(), LoadStatus::Fresh)
            }
            Ok(bytes) => match serde_json::from_slice::<IndexMap<TestId, RegistryEntry>>(&bytes) {
                Ok(entries) => {
                    let n = entries.len();
                    (entries, LoadStatus::Loaded(n))
                }
                Err(err) => {
                    warn!(%key, %err, "registry state is malformed; starting empty");
                    (IndexMap::new(), LoadStatus::Reset)
                }
            },
            Err(StoreError::NotFound) => (IndexMap::new(), LoadStatus::Fresh),
            Err(err) => {
                warn!(%key, %err, "registry state is unreadable; starting empty");
                (IndexMap::new(), LoadStatus::Reset)
            }
        };
        debug!(%key, entries = entries.len(), ?status, "registry loaded");
        let mut registry = Self {
            store,
            key,
            entries,
            by_fingerprint: HashMap::new(),
            clock,
            status,
        };
        registry.rebuild_index();
        registry
    }

    /// Serialize every entry back to the store.
    ///
    /// Failures are logged and returned; in-memory state is untouched either
    /// way.
    pub fn save(&self) -> Result<(), RegistryError> {
        let data = serde_json::to_vec_pretty(&self.entries).map_err(|err| {
            warn!(key = %self.key, %err, "failed to encode registry");
            RegistryError::Encode(err)
        })?;
        self.store.save_raw(&self.key, &data).map_err(|source| {
            warn!(key = %self.key, err = %source, "failed to persist registry");
            RegistryError::Store {
                key: self.key.clone(),
                source,
            }
        })?;
        debug!(key = %self.key, entries = self.entries.len(), "registry saved");
        Ok(())
    }
}

impl<S> Registry<S> {
    /// How the initial state was obtained.
    pub fn load_status(&self) -> LoadStatus {
        self.status
    }

    /// Store key this registry persists under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Earliest-inserted entry carrying `fingerprint`.
    pub fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<(TestId, &RegistryEntry)> {
        let id = self.by_fingerprint.get(fingerprint)?;
        self.entries.get(id).map(|entry| (*id, entry))
    }

    /// Direct lookup.
    pub fn find_by_id(&self, id: &TestId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    /// Mint a fresh identifier and insert a new entry with
    /// `created_at == last_seen == now`.
    pub fn add(&mut self, fingerprint: Fingerprint, location: &str, body_length: usize) -> TestId {
        let mut id = TestId::random();
        while self.entries.contains_key(&id) {
            id = TestId::random();
        }
        let now = (self.clock)();
        self.entries.insert(
            id,
            RegistryEntry {
                fingerprint: fingerprint.clone(),
                last_location: location.to_owned(),
                body_length,
                created_at: now,
                last_seen: now,
            },
        );
        self.by_fingerprint.entry(fingerprint).or_insert(id);
        id
    }

    /// Overwrite fingerprint, location and body length of `id` and bump
    /// `last_seen`. Returns `false` (and does nothing) if `id` is absent.
    pub fn update(
        &mut self,
        id: &TestId,
        fingerprint: Fingerprint,
        location: &str,
        body_length: usize,
    ) -> bool {
        let now = (self.clock)();
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        let previous = std::mem::replace(&mut entry.fingerprint, fingerprint.clone());
        entry.last_location = location.to_owned();
        entry.body_length = body_length;
        entry.last_seen = now;
        if previous != fingerprint {
            self.unindex(&previous, id);
            self.index(fingerprint, *id);
        }
        true
    }

    /// Delete every entry whose identifier is not in `active`. Returns the
    /// number removed.
    pub fn cleanup(&mut self, active: &HashSet<TestId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| active.contains(id));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.rebuild_index();
        }
        debug!(removed, remaining = self.entries.len(), "registry cleanup");
        removed
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&TestId, &RegistryEntry)> + '_ {
        self.entries.iter()
    }

    /// All fingerprints in insertion order.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> + '_ {
        self.entries.values().map(|e| &e.fingerprint)
    }

    fn rebuild_index(&mut self) {
        self.by_fingerprint.clear();
        for (id, entry) in &self.entries {
            self.by_fingerprint
                .entry(entry.fingerprint.clone())
                .or_insert(*id);
        }
    }

    fn position(&self, id: &TestId) -> usize {
        self.entries.get_index_of(id).unwrap_or(usize::MAX)
    }

    fn index(&mut self, fingerprint: Fingerprint, id: TestId) {
        let keep_holder = self
            .by_fingerprint
            .get(&fingerprint)
            .is_some_and(|holder| self.position(holder) < self.position(&id));
        if !keep_holder {
            self.by_fingerprint.insert(fingerprint, id);
        }
    }

    fn unindex(&mut self, fingerprint: &Fingerprint, id: &TestId) {
        if self.by_fingerprint.get(fingerprint) != Some(id) {
            return;
        }
        self.by_fingerprint.remove(fingerprint);
        let next = self
            .entries
            .iter()
            .find(|(_, e)| e.fingerprint == *fingerprint)
            .map(|(other, _)| *other);
        if let Some(other) = next {
            self.by_fingerprint.insert(fingerprint.clone(), other);
        }
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("key", &self.key)
            .field("entries", &self.entries.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
