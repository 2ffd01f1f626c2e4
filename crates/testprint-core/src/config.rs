// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine configuration, persisted as JSON behind the same [`Store`] port as the
//! registry (key [`EngineConfig::KEY`]).
//!
//! ```json
//! {
//!   "algorithm": "sha1",
//!   "preserveIdentifiers": false,
//!   "similarityThreshold": 0.8,
//!   "registryKey": "test-ids",
//!   "testKeywords": ["test", "it"],
//!   "suiteKeywords": ["describe", "suite"],
//!   "qualifiers": ["skip", "only", "todo"]
//! }
//! ```
//!
//! Every field is optional. A missing blob means defaults; an undecodable one
//! means defaults plus a warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extract::Extractor;
use crate::fingerprint::{Fingerprinter, HashAlgorithm};
use crate::matcher::DEFAULT_SIMILARITY_THRESHOLD;
use crate::normalize::NormalizeOptions;
use crate::registry::DEFAULT_REGISTRY_KEY;
use crate::store::{Store, StoreError};

/// Call names the extractor recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vocabulary {
    /// Callees that declare a test (`test("name", fn)`).
    pub test_keywords: Vec<String>,
    /// Callees that declare a container (`describe("name", fn)`).
    pub suite_keywords: Vec<String>,
    /// Member qualifiers accepted on either keyword (`test.skip`, `describe.only`).
    pub qualifiers: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| (*w).to_owned()).collect();
        Self {
            test_keywords: owned(&["test", "it"]),
            suite_keywords: owned(&["describe", "suite"]),
            qualifiers: owned(&["skip", "only", "todo"]),
        }
    }
}

impl Vocabulary {
    /// Whether `name` declares a test.
    pub fn is_test(&self, name: &str) -> bool {
        self.test_keywords.iter().any(|k| k == name)
    }

    /// Whether `name` declares a suite.
    pub fn is_suite(&self, name: &str) -> bool {
        self.suite_keywords.iter().any(|k| k == name)
    }

    /// Whether `name` is an accepted member qualifier.
    pub fn is_qualifier(&self, name: &str) -> bool {
        self.qualifiers.iter().any(|k| k == name)
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Fingerprint digest. Changing it invalidates every stored fingerprint.
    pub algorithm: HashAlgorithm,
    /// Keep local identifier names verbatim during normalization.
    pub preserve_identifiers: bool,
    /// Minimum composite score for a fuzzy match, in `[0, 1]`.
    pub similarity_threshold: f64,
    /// Store key the registry persists under.
    pub registry_key: String,
    /// Extractor vocabulary.
    #[serde(flatten)]
    pub vocabulary: Vocabulary,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            preserve_identifiers: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            registry_key: DEFAULT_REGISTRY_KEY.to_owned(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl EngineConfig {
    /// Store key the config is read from.
    pub const KEY: &'static str = "testprint";

    /// Decode a config from JSON and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Self>(bytes).map(Self::validated)
    }

    /// Load the config stored under [`EngineConfig::KEY`], falling back to
    /// defaults when it is missing or unreadable.
    pub fn load<S: Store>(store: &S) -> Self {
        match store.load_raw(Self::KEY) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Self::default(),
            Ok(bytes) => Self::from_json(&bytes).unwrap_or_else(|err| {
                warn!(key = Self::KEY, %err, "config is malformed; using defaults");
                Self::default()
            }),
            Err(StoreError::NotFound) => Self::default(),
            Err(err) => {
                warn!(key = Self::KEY, %err, "config is unreadable; using defaults");
                Self::default()
            }
        }
    }

    /// Persist this config under [`EngineConfig::KEY`].
    pub fn save<S: Store>(&self, store: &S) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(self)?;
        store.save_raw(Self::KEY, &data)
    }

    /// Clamp out-of-range values, warning about each.
    pub fn validated(mut self) -> Self {
        let t = self.similarity_threshold;
        if t.is_nan() {
            warn!("similarity threshold is NaN; using default");
            self.similarity_threshold = DEFAULT_SIMILARITY_THRESHOLD;
        } else if !(0.0..=1.0).contains(&t) {
            warn!(threshold = t, "similarity threshold outside [0, 1]; clamping");
            self.similarity_threshold = t.clamp(0.0, 1.0);
        }
        if self.registry_key.trim().is_empty() {
            warn!("empty registry key; using default");
            self.registry_key = DEFAULT_REGISTRY_KEY.to_owned();
        }
        self
    }

    /// Normalization options implied by this config.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            preserve_identifiers: self.preserve_identifiers,
        }
    }

    /// Fingerprinter for this config.
    pub fn fingerprinter(&self) -> Fingerprinter {
        Fingerprinter::new(self.algorithm, self.normalize_options())
    }

    /// Extractor for this config.
    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.vocabulary.clone())
    }
}
