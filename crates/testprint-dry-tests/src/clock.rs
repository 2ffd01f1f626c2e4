// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic millisecond clocks for [`Registry::with_clock`].
//!
//! [`Registry::with_clock`]: testprint_core::Registry::with_clock

use std::sync::atomic::{AtomicU64, Ordering};

/// Timestamp returned by [`frozen_clock`].
pub const FROZEN_MS: u64 = 1_700_000_000_000;

static TICKS: AtomicU64 = AtomicU64::new(FROZEN_MS);

/// Always returns [`FROZEN_MS`].
pub fn frozen_clock() -> u64 {
    FROZEN_MS
}

/// Strictly increasing clock starting at [`FROZEN_MS`].
///
/// The counter is process-wide, so only relative ordering is meaningful in
/// tests that run in parallel.
pub fn ticking_clock() -> u64 {
    TICKS.fetch_add(1, Ordering::SeqCst)
}
