// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Similarity scores in `[0, 1]` used by the fuzzy matcher.
//!
//! The composite score uses one fixed weighting:
//!
//! | factor | weight |
//! |---|---|
//! | declared name vs. name derived from the entry's last location | 0.5 |
//! | location string vs. the entry's last location | 0.3 |
//! | normalized body length | 0.2 |
//!
//! Name and location together carry 0.8, which is the default threshold. A test
//! that keeps both therefore always clears it, however much its body grew or
//! shrank. The length factor decides only once name or location drifted: a
//! moved test of similar size still matches, a moved test whose body changed
//! size drastically does not.

use crate::location::{derive_name, loosen_name};

/// Weight of the declared-name factor.
pub const NAME_WEIGHT: f64 = 0.5;
/// Weight of the location-string factor.
pub const LOCATION_WEIGHT: f64 = 0.3;
/// Weight of the body-length factor.
pub const LENGTH_WEIGHT: f64 = 0.2;

/// Normalized Levenshtein similarity: `1 - distance / max_len`, in characters.
///
/// Equal strings score 1.0. If exactly one side is empty (or both differ and
/// either is empty) the score is 0.0.
#[allow(clippy::cast_precision_loss)]
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    let distance = strsim::levenshtein(a, b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// `1 - |a - b| / max(a, b)`; two zero lengths score 1.0.
#[allow(clippy::cast_precision_loss)]
pub fn length_similarity(a: usize, b: usize) -> f64 {
    let max = a.max(b);
    if max == 0 {
        return 1.0;
    }
    1.0 - a.abs_diff(b) as f64 / max as f64
}

/// Per-factor breakdown of a composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Declared-name factor.
    pub name: f64,
    /// Location-string factor.
    pub location: f64,
    /// Body-length factor.
    pub length: f64,
}

impl Similarity {
    /// Score a fresh occurrence (`name`, `location`, `body_length`) against a
    /// registry entry's last-known location and body length.
    ///
    /// The entry's name is re-derived from its last location and the declared
    /// name goes through the same loosening, so `parseConfig` and
    /// `parse_config` compare equal. When nothing can be derived for the entry,
    /// the occurrence's own name stands in.
    pub fn between(
        name: &str,
        location: &str,
        body_length: usize,
        entry_location: &str,
        entry_body_length: usize,
    ) -> Self {
        let name = loosen_name(name).unwrap_or_else(|| name.to_lowercase());
        let entry_name = derive_name(entry_location).unwrap_or_else(|| name.clone());
        Self {
            name: levenshtein_similarity(&name, &entry_name),
            location: levenshtein_similarity(location, entry_location),
            length: length_similarity(body_length, entry_body_length),
        }
    }

    /// Weighted composite score.
    pub fn score(&self) -> f64 {
        self.name * NAME_WEIGHT + self.location * LOCATION_WEIGHT + self.length * LENGTH_WEIGHT
    }
}
