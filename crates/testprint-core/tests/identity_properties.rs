// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use testprint_core::{
    Fingerprinter, HashAlgorithm, MatchKind, Matcher, NormalizeOptions, Registry, TestOccurrence,
    DEFAULT_REGISTRY_KEY,
};
use testprint_dry_tests::{frozen_clock, registry_with, ticking_clock, FlakyStore, FROZEN_MS};

const BODY: &str = "{ expect(add(1, 2)).toBe(3) }";

fn matcher<S>(registry: &mut Registry<S>) -> Matcher<'_, S> {
    Matcher::new(registry, Fingerprinter::default(), 0.8)
}

#[test]
fn rename_keeps_identity_through_exact_match() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[("adds numbers", BODY, "math.test.js::adds numbers")],
    );

    let renamed = TestOccurrence::new("sums two values", BODY);
    let assignment = matcher(&mut registry).assign(&renamed, "math.test.js::sums two values");

    assert_eq!(assignment.id, ids[0]);
    assert_eq!(assignment.kind, MatchKind::Exact);
    assert!((assignment.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(registry.len(), 1);
}

#[test]
fn move_updates_last_location() {
    let mut registry = Registry::with_clock(FlakyStore::new(), DEFAULT_REGISTRY_KEY, ticking_clock);
    let occurrence = TestOccurrence::new("adds numbers", BODY);
    let first = matcher(&mut registry).assign(&occurrence, "math.test.js::adds numbers");
    let created = registry.find_by_id(&first.id).unwrap().clone();

    let moved = matcher(&mut registry).assign(&occurrence, "lib/arith.test.js::Arith::adds numbers");
    assert_eq!(moved.id, first.id);
    assert_eq!(moved.kind, MatchKind::Exact);

    let entry = registry.find_by_id(&first.id).unwrap();
    assert_eq!(entry.last_location, "lib/arith.test.js::Arith::adds numbers");
    assert_eq!(entry.created_at, created.created_at);
    assert!(entry.last_seen > created.last_seen);
}

#[test]
fn small_body_edit_is_accepted_as_fuzzy() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[(
            "should work correctly",
            "{expect(getValue()).toBe(42)}",
            "math.test.js::should_work_correctly",
        )],
    );

    let edited = TestOccurrence::new("should work correctly", "{expect(getValue()).toBe(43)}");
    let m = matcher(&mut registry);
    let resolution = m
        .resolve(&edited, "math.test.js::should_work_correctly")
        .unwrap();
    assert_eq!(resolution.id, ids[0]);
    assert!(!resolution.is_exact);
    assert!(resolution.confidence > 0.6);

    let before = registry.find_by_id(&ids[0]).unwrap().fingerprint.clone();
    let assignment = matcher(&mut registry).assign(&edited, "math.test.js::should_work_correctly");
    assert_eq!(assignment.kind, MatchKind::Fuzzy);
    assert_eq!(assignment.id, ids[0]);
    let after = &registry.find_by_id(&ids[0]).unwrap().fingerprint;
    assert_ne!(after, &before);
    assert_eq!(after, &assignment.fingerprint);
}

#[test]
fn unrelated_test_gets_a_new_id() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[("adds", BODY, "a.test.js::adds")],
    );

    let stranger = TestOccurrence::new(
        "renders the checkout page with a discount banner",
        "{ const page = render(Checkout, { discount: 10 }); expect(page.banner).toBeVisible(); }",
    );
    let m = matcher(&mut registry);
    assert!(m
        .resolve(&stranger, "ui/checkout.spec.js::Checkout::renders the checkout page with a discount banner")
        .is_none());

    let assignment = matcher(&mut registry).assign(
        &stranger,
        "ui/checkout.spec.js::Checkout::renders the checkout page with a discount banner",
    );
    assert_eq!(assignment.kind, MatchKind::Created);
    assert_ne!(assignment.id, ids[0]);
    assert_eq!(registry.len(), 2);
}

#[test]
fn repeated_assignment_never_duplicates_fingerprints() {
    let mut registry = Registry::with_clock(FlakyStore::new(), DEFAULT_REGISTRY_KEY, frozen_clock);
    let occurrence = TestOccurrence::new("adds", BODY);
    let ids: HashSet<_> = (0..5)
        .map(|_| matcher(&mut registry).assign(&occurrence, "a.test.js::adds").id)
        .collect();
    assert_eq!(ids.len(), 1);
    assert_eq!(registry.len(), 1);
    let prints: HashSet<_> = registry.fingerprints().collect();
    assert_eq!(prints.len(), registry.len());
}

#[test]
fn cleanup_is_idempotent() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[
            ("one", "{ expect(1).toBe(1) }", "a.test.js::one"),
            ("two", "{ expect(2).toBe(2) }", "a.test.js::two"),
            ("three", "{ expect(3).toBe(3) }", "a.test.js::three"),
        ],
    );
    let active: HashSet<_> = [ids[0], ids[2]].into_iter().collect();

    assert_eq!(registry.cleanup(&active), 1);
    let after_first: Vec<_> = registry.entries().map(|(id, e)| (*id, e.clone())).collect();
    assert_eq!(registry.cleanup(&active), 0);
    let after_second: Vec<_> = registry.entries().map(|(id, e)| (*id, e.clone())).collect();
    assert_eq!(after_first, after_second);
    assert!(registry.find_by_id(&ids[1]).is_none());
}

#[test]
fn reload_restores_every_field() {
    let store = FlakyStore::new();
    let (registry, ids) = registry_with(
        store.clone(),
        "ids",
        frozen_clock,
        &[
            ("one", "{ expect(1).toBe(1) }", "a.test.js::one"),
            ("two", "{ expect(2).toBe(2) }", "b.test.js::Suite::two"),
        ],
    );
    registry.save().unwrap();

    let reloaded = Registry::open(store, "ids");
    let saved: Vec<_> = registry.entries().collect();
    let restored: Vec<_> = reloaded.entries().collect();
    assert_eq!(saved, restored);
    assert_eq!(restored[0].0, &ids[0]);
    assert_eq!(restored[1].1.created_at, FROZEN_MS);
    assert_eq!(restored[1].1.last_location, "b.test.js::Suite::two");
}

#[test]
fn same_name_and_location_match_even_after_large_growth() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[("works", "{ expect(1).toBe(1) }", "a.test.js::works")],
    );
    let grown: String = std::iter::once("{".to_owned())
        .chain((0..200).map(|i| format!(" expect({i}).toBe({i});")))
        .chain(std::iter::once(" }".to_owned()))
        .collect();

    let assignment =
        matcher(&mut registry).assign(&TestOccurrence::new("works", &grown), "a.test.js::works");
    assert_eq!(assignment.kind, MatchKind::Fuzzy);
    assert_eq!(assignment.id, ids[0]);
    assert!(assignment.confidence >= 0.8 && assignment.confidence < 0.81);

    // Moved and shrunk back: length no longer makes up the difference.
    let moved = matcher(&mut registry).assign(
        &TestOccurrence::new("works", "{ expect(0).toBe(1) }"),
        "b.test.js::works",
    );
    assert_eq!(moved.kind, MatchKind::Created);
}

#[test]
fn switching_algorithm_misses_exact_path() {
    let (mut registry, ids) = registry_with(
        FlakyStore::new(),
        DEFAULT_REGISTRY_KEY,
        frozen_clock,
        &[("adds numbers", BODY, "math.test.js::adds numbers")],
    );
    let blake3 = Fingerprinter::new(HashAlgorithm::Blake3, NormalizeOptions::default());
    let occurrence = TestOccurrence::new("adds numbers", BODY);

    let m = Matcher::new(&mut registry, blake3, 0.8);
    let resolution = m.resolve(&occurrence, "math.test.js::adds numbers").unwrap();
    assert!(!resolution.is_exact);
    assert_eq!(resolution.id, ids[0]);

    let assignment =
        Matcher::new(&mut registry, blake3, 0.8).assign(&occurrence, "math.test.js::adds numbers");
    assert_eq!(assignment.kind, MatchKind::Fuzzy);
    assert_eq!(assignment.fingerprint.as_str().len(), 64);
    assert_eq!(
        registry.find_by_id(&ids[0]).unwrap().fingerprint,
        assignment.fingerprint
    );

    // Back on SHA-1, renamed and moved: no exact hit and no close candidate.
    let elsewhere = TestOccurrence::new("sums values", BODY);
    let created = Matcher::new(&mut registry, Fingerprinter::default(), 0.8)
        .assign(&elsewhere, "lib/other.spec.js::sums values");
    assert_eq!(created.kind, MatchKind::Created);
    assert_eq!(registry.len(), 2);
}
