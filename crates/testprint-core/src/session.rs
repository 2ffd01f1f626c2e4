// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One run of the engine, expressed as an explicit two-call contract:
//!
//! - during collection, the host calls [`RunSession::assign`] (or
//!   [`RunSession::assign_source`] for a whole file) for every test it sees;
//! - when the run ends, the host calls [`RunSession::finish`], which drops
//!   every entry not assigned during the run and then saves the registry.
//!
//! The session owns its registry for the run. Two sessions over the same
//! backing store race on the final write (last writer wins); that is not
//! guarded against.

use std::collections::HashSet;

use tracing::info;

use crate::config::EngineConfig;
use crate::extract::{Extractor, TestDeclaration};
use crate::fingerprint::Fingerprinter;
use crate::matcher::{Assignment, MatchKind, Matcher, TestOccurrence};
use crate::registry::{Registry, TestId};
use crate::store::Store;

/// A declaration found in a source file together with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedTest {
    /// Extracted declaration.
    pub declaration: TestDeclaration,
    /// Location string used for matching.
    pub location: String,
    /// Identity assigned to the declaration.
    pub assignment: Assignment,
}

/// Tally of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Occurrences assigned.
    pub assigned: usize,
    /// Exact fingerprint hits.
    pub exact: usize,
    /// Fuzzy matches.
    pub fuzzy: usize,
    /// New identifiers minted.
    pub created: usize,
    /// Entries removed by cleanup.
    pub removed: usize,
    /// Whether the final save succeeded.
    pub persisted: bool,
}

/// Registry, fingerprinter and extractor bound together for a single run.
pub struct RunSession<S> {
    registry: Registry<S>,
    fingerprinter: Fingerprinter,
    extractor: Extractor,
    threshold: f64,
    active: HashSet<TestId>,
    summary: RunSummary,
}

impl<S: Store> RunSession<S> {
    /// Load the registry from `store` and start a run configured by `config`.
    pub fn begin(store: S, config: &EngineConfig) -> Self {
        let registry = Registry::open(store, config.registry_key.clone());
        Self::with_registry(registry, config)
    }

    /// Start a run over an already-open registry.
    pub fn with_registry(registry: Registry<S>, config: &EngineConfig) -> Self {
        Self {
            registry,
            fingerprinter: config.fingerprinter(),
            extractor: config.extractor(),
            threshold: config.similarity_threshold,
            active: HashSet::new(),
            summary: RunSummary::default(),
        }
    }

    /// Resolve or mint the identifier for `occurrence` at `location` and mark
    /// it active for this run.
    pub fn assign(&mut self, occurrence: &TestOccurrence<'_>, location: &str) -> Assignment {
        let assignment =
            Matcher::new(&mut self.registry, self.fingerprinter, self.threshold).assign(occurrence, location);
        self.active.insert(assignment.id);
        self.summary.assigned += 1;
        match assignment.kind {
            MatchKind::Exact => self.summary.exact += 1,
            MatchKind::Fuzzy => self.summary.fuzzy += 1,
            MatchKind::Created => self.summary.created += 1,
        }
        assignment
    }

    /// Extract every declaration from `source` (a file at relative path
    /// `file`) and assign each one. An unparseable source assigns nothing.
    pub fn assign_source(&mut self, file: &str, source: &str) -> Vec<AttachedTest> {
        let declarations = self.extractor.extract(source);
        declarations
            .into_iter()
            .map(|declaration| {
                let location = declaration.location(file);
                let assignment = self.assign(&declaration.occurrence(), &location);
                AttachedTest {
                    declaration,
                    location,
                    assignment,
                }
            })
            .collect()
    }

    /// Identifiers assigned so far in this run.
    pub fn active(&self) -> &HashSet<TestId> {
        &self.active
    }

    /// Registry being updated by this run.
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// End the run: remove entries not assigned during it, then save.
    ///
    /// A failed save is logged and reported through
    /// [`RunSummary::persisted`].
    pub fn finish(mut self) -> RunSummary {
        self.summary.removed = self.registry.cleanup(&self.active);
        self.summary.persisted = self.registry.save().is_ok();
        let s = self.summary;
        info!(
            assigned = s.assigned,
            exact = s.exact,
            fuzzy = s.fuzzy,
            created = s.created,
            removed = s.removed,
            persisted = s.persisted,
            "test identity run finished"
        );
        s
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::LoadStatus;
    use crate::store::MemoryStore;

    const SOURCE: &str = r"
describe('Cart', () => {
  it('adds an item', () => {
    const cart = new Cart();
    cart.add('apple');
    expect(cart.size()).toBe(1);
  });
  it('starts empty', () => {
    expect(new Cart().size()).toBe(0);
  });
});
";

    #[test]
    fn ids_survive_a_second_run() {
        let store = MemoryStore::new();
        let config = EngineConfig::default();

        let mut first = RunSession::begin(store.clone(), &config);
        let run1 = first.assign_source("cart.test.js", SOURCE);
        assert_eq!(run1.len(), 2);
        assert_eq!(run1[0].location, "cart.test.js::Cart::adds an item");
        let summary = first.finish();
        assert_eq!(summary.created, 2);
        assert!(summary.persisted);

        let renamed = SOURCE.replace("adds an item", "adds one item");
        let mut second = RunSession::begin(store, &config);
        assert_eq!(second.registry().load_status(), LoadStatus::Loaded(2));
        let run2 = second.assign_source("shop/cart.test.js", &renamed);
        assert_eq!(run2[0].assignment.id, run1[0].assignment.id);
        assert_eq!(run2[0].assignment.kind, MatchKind::Exact);
        assert_eq!(run2[1].assignment.id, run1[1].assignment.id);
        let summary = second.finish();
        assert_eq!(summary.exact, 2);
        assert_eq!(summary.removed, 0);
    }

    #[test]
    fn finish_drops_tests_that_disappeared() {
        let store = MemoryStore::new();
        let config = EngineConfig::default();

        let mut first = RunSession::begin(store.clone(), &config);
        first.assign_source("cart.test.js", SOURCE);
        first.finish();

        let only_one = r"
describe('Cart', () => {
  it('starts empty', () => {
    expect(new Cart().size()).toBe(0);
  });
});
";
        let mut second = RunSession::begin(store.clone(), &config);
        second.assign_source("cart.test.js", only_one);
        let summary = second.finish();
        assert_eq!(summary.removed, 1);

        let third = RunSession::begin(store, &config);
        assert_eq!(third.registry().len(), 1);
    }

    #[test]
    fn unparseable_file_assigns_nothing() {
        let mut session = RunSession::begin(MemoryStore::new(), &EngineConfig::default());
        assert!(session.assign_source("bad.test.js", "it('x', () => {").is_empty());
        assert!(session.active().is_empty());
    }
}
