// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolve a test occurrence to a registry identifier.
//!
//! 1. **Exact**: an entry already carries the occurrence's fingerprint.
//!    Confidence 1.0; name and location are ignored.
//! 2. **Fuzzy**: otherwise every entry is scored with
//!    [`Similarity`](crate::similarity::Similarity). Candidates at or above the
//!    threshold compete; the highest score wins and ties go to the entry
//!    inserted first.
//! 3. **Created**: nothing cleared the threshold; [`Matcher::assign`] mints a
//!    new identifier.
//!
//! `assign` refreshes the matched entry (fingerprint, location, body length,
//! `last_seen`) so the registry always reflects the latest sighting. A repeat of
//! an exact occurrence therefore always lands on the same entry and no
//! fingerprint is ever minted twice.

use tracing::debug;

use crate::fingerprint::{BodyPrint, Fingerprint, Fingerprinter};
use crate::registry::{Registry, TestId};
use crate::similarity::Similarity;

/// Default minimum composite score for a fuzzy match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// A test as seen during one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestOccurrence<'a> {
    /// Declared test name.
    pub name: &'a str,
    /// Callback body source text.
    pub body: &'a str,
}

impl<'a> TestOccurrence<'a> {
    /// Borrow a name and body as an occurrence.
    pub fn new(name: &'a str, body: &'a str) -> Self {
        Self { name, body }
    }
}

/// Outcome of [`Matcher::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Matched identifier.
    pub id: TestId,
    /// 1.0 for exact matches, the composite score otherwise.
    pub confidence: f64,
    /// Whether the match came from the fingerprint index.
    pub is_exact: bool,
}

/// How an assignment was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Fingerprint hit.
    Exact,
    /// Similarity above threshold.
    Fuzzy,
    /// New identifier minted.
    Created,
}

/// Outcome of [`Matcher::assign`], handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Stable identifier for the occurrence.
    pub id: TestId,
    /// Fingerprint of the occurrence's body.
    pub fingerprint: Fingerprint,
    /// Decision path.
    pub kind: MatchKind,
    /// 1.0 for exact and created assignments, the composite score for fuzzy.
    pub confidence: f64,
}

/// Identity resolver borrowing a registry for the duration of a run.
pub struct Matcher<'r, S> {
    registry: &'r mut Registry<S>,
    fingerprinter: Fingerprinter,
    threshold: f64,
}

impl<'r, S> Matcher<'r, S> {
    /// Create a matcher over `registry`. `threshold` is clamped to `[0, 1]`.
    pub fn new(registry: &'r mut Registry<S>, fingerprinter: Fingerprinter, threshold: f64) -> Self {
        Self {
            registry,
            fingerprinter,
            threshold: if threshold.is_nan() {
                DEFAULT_SIMILARITY_THRESHOLD
            } else {
                threshold.clamp(0.0, 1.0)
            },
        }
    }

    /// Registry being matched against.
    pub fn registry(&self) -> &Registry<S> {
        self.registry
    }

    /// Effective similarity threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Find the identifier for `occurrence` at `location` without touching the
    /// registry.
    pub fn resolve(&self, occurrence: &TestOccurrence<'_>, location: &str) -> Option<Resolution> {
        let print = self.fingerprinter.analyze(occurrence.body);
        self.resolve_print(occurrence, location, &print)
    }

    /// Resolve, then record the sighting: refresh the matched entry or add a
    /// new one.
    pub fn assign(&mut self, occurrence: &TestOccurrence<'_>, location: &str) -> Assignment {
        let print = self.fingerprinter.analyze(occurrence.body);
        let hit = self.resolve_print(occurrence, location, &print);
        let BodyPrint {
            fingerprint,
            body_length,
        } = print;
        match hit {
            Some(hit) => {
                self.registry
                    .update(&hit.id, fingerprint.clone(), location, body_length);
                Assignment {
                    id: hit.id,
                    fingerprint,
                    kind: if hit.is_exact {
                        MatchKind::Exact
                    } else {
                        MatchKind::Fuzzy
                    },
                    confidence: hit.confidence,
                }
            }
            None => {
                let id = self.registry.add(fingerprint.clone(), location, body_length);
                debug!(%id, %location, "allocated new test id");
                Assignment {
                    id,
                    fingerprint,
                    kind: MatchKind::Created,
                    confidence: 1.0,
                }
            }
        }
    }

    fn resolve_print(
        &self,
        occurrence: &TestOccurrence<'_>,
        location: &str,
        print: &BodyPrint,
    ) -> Option<Resolution> {
        if let Some((id, _)) = self.registry.find_by_fingerprint(&print.fingerprint) {
            debug!(%id, %location, "exact fingerprint match");
            return Some(Resolution {
                id,
                confidence: 1.0,
                is_exact: true,
            });
        }

        let mut best: Option<Resolution> = None;
        for (id, entry) in self.registry.entries() {
            if entry.fingerprint == print.fingerprint {
                continue;
            }
            let score = Similarity::between(
                occurrence.name,
                location,
                print.body_length,
                &entry.last_location,
                entry.body_length,
            )
            .score();
            if score < self.threshold {
                continue;
            }
            // strict `>` keeps the earliest-inserted entry on ties
            if best.map_or(true, |b| score > b.confidence) {
                best = Some(Resolution {
                    id: *id,
                    confidence: score,
                    is_exact: false,
                });
            }
        }
        if let Some(hit) = &best {
            debug!(id = %hit.id, %location, confidence = hit.confidence, "fuzzy match");
        }
        best
    }
}
