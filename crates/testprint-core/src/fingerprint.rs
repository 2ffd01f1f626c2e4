// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Content fingerprints of normalized test bodies.
//!
//! # Hash Domain Policy
//!
//! The digest is content-only: `H(normalize(body))` with no domain prefix and
//! no algorithm tag. Fingerprints recorded under one [`HashAlgorithm`] never
//! exact-match fingerprints produced under the other; switching algorithms
//! forces existing entries through fuzzy matching or re-allocation.
//!
//! Fingerprints are identity hints, not security primitives.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::matcher::TestOccurrence;
use crate::normalize::{normalize, NormalizeOptions};

/// Digest algorithm used for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, 40 hex characters.
    #[default]
    Sha1,
    /// BLAKE3, 64 hex characters.
    Blake3,
}

impl HashAlgorithm {
    /// Width of the rendered hex digest.
    pub const fn hex_width(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Blake3 => 64,
        }
    }
}

/// Lowercase hex digest of a normalized body.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-rendered hex digest (e.g. one read back from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint plus the signals the matcher derives from the same
/// normalization pass.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BodyPrint {
    /// Digest of the normalized body.
    pub fingerprint: Fingerprint,
    /// Character length of the normalized body.
    pub body_length: usize,
}

/// Normalizes and hashes test bodies.
///
/// The algorithm is fixed per instance; it is configuration, not a per-call
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fingerprinter {
    algorithm: HashAlgorithm,
    options: NormalizeOptions,
}

impl Fingerprinter {
    /// Create a fingerprinter.
    pub fn new(algorithm: HashAlgorithm, options: NormalizeOptions) -> Self {
        Self { algorithm, options }
    }

    /// Configured algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Configured normalization options.
    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    /// Fingerprint of an occurrence's body.
    pub fn fingerprint(&self, occurrence: &TestOccurrence<'_>) -> Fingerprint {
        self.fingerprint_body(occurrence.body)
    }

    /// Fingerprint of raw body text.
    pub fn fingerprint_body(&self, body: &str) -> Fingerprint {
        self.digest(&self.normalize(body))
    }

    /// Canonical form of `body` under this fingerprinter's options.
    pub fn normalize(&self, body: &str) -> String {
        normalize(body, self.options)
    }

    /// Normalize once and return both the fingerprint and the body length.
    pub fn analyze(&self, body: &str) -> BodyPrint {
        let normalized = self.normalize(body);
        BodyPrint {
            fingerprint: self.digest(&normalized),
            body_length: normalized.chars().count(),
        }
    }

    /// Hash already-normalized text.
    pub fn digest(&self, normalized: &str) -> Fingerprint {
        let hex = match self.algorithm {
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(normalized.as_bytes())),
            HashAlgorithm::Blake3 => hex::encode(blake3::hash(normalized.as_bytes()).as_bytes()),
        };
        Fingerprint(hex)
    }
}
