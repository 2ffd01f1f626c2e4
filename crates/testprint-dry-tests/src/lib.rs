// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for testprint crates.
//!
//! # Modules
//!
//! - [`store`] - Fault-injecting, call-counting wrapper around `MemoryStore`
//! - [`clock`] - Deterministic millisecond clocks for registries
//! - [`fixtures`] - Sample test sources and registry builders
#![forbid(unsafe_code)]

pub mod clock;
pub mod fixtures;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use clock::{frozen_clock, ticking_clock, FROZEN_MS};
pub use fixtures::{registry_with, CART_SOURCE, MATH_SOURCE};
pub use store::FlakyStore;
