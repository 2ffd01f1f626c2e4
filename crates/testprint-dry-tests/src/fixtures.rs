// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sample test sources and registry builders.

use testprint_core::{Fingerprinter, Registry, Store, TestId, TestOccurrence};

/// Two suites, three tests, one skipped.
pub const MATH_SOURCE: &str = r"
describe('Math', () => {
  test('adds numbers', () => {
    // simple sum
    expect(add(1, 2)).toBe(3);
  });

  test('multiplies numbers', () => {
    const product = multiply(3, 4);
    expect(product).toBe(12);
  });

  describe('division', () => {
    test.skip('divides by zero', () => {
      expect(() => divide(1, 0)).toThrow();
    });
  });
});
";

/// One suite with two tests of clearly different sizes.
pub const CART_SOURCE: &str = r"
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

/// Build a registry over `store` and assign `(name, body, location)` triples
/// into it in order, returning the minted identifiers.
pub fn registry_with<S: Store>(
    store: S,
    key: &str,
    clock: fn() -> u64,
    tests: &[(&str, &str, &str)],
) -> (Registry<S>, Vec<TestId>) {
    let mut registry = Registry::with_clock(store, key, clock);
    let fingerprinter = Fingerprinter::default();
    let ids = tests
        .iter()
        .map(|(name, body, location)| {
            let occurrence = TestOccurrence::new(name, body);
            let print = fingerprinter.analyze(occurrence.body);
            registry.add(print.fingerprint, location, print.body_length)
        })
        .collect();
    (registry, ids)
}
