// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! testprint-core: stable identities for test declarations.
//!
//! A test keeps its identifier across renames, file moves, and small edits
//! because the identifier is resolved from the *content* of the test body rather
//! than from where the test sits or what it is called.
//!
//! # Pipeline
//!
//! 1. [`Extractor`] parses JavaScript source with tree-sitter and slices out each
//!    `test(...)`/`it(...)` declaration.
//! 2. [`normalize`] canonicalizes the body text (comments, whitespace, operator
//!    spacing, optional identifier folding).
//! 3. [`Fingerprinter`] hashes the canonical text into a fixed-width hex
//!    [`Fingerprint`].
//! 4. [`Matcher`] resolves the fingerprint against a [`Registry`]: exact hit,
//!    fuzzy hit above the similarity threshold, or a freshly minted [`TestId`].
//!
//! [`RunSession`] wraps the whole pipeline in the two-call contract a host
//! embeds: `assign` per occurrence during collection, then `finish` at run end.
//!
//! # Failure Policy
//!
//! Nothing in this crate aborts a run. Unparseable sources extract to an empty
//! list, malformed persisted state resets to an empty registry, and failed
//! writes leave the in-memory registry intact. Each of these is reported through
//! `tracing`.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self
)]

/// Engine configuration (hash algorithm, threshold, extractor vocabulary).
pub mod config;
/// Test declaration extraction from JavaScript source.
pub mod extract;
/// Body fingerprinting.
pub mod fingerprint;
mod lexer;
/// `::`-joined location strings and the name heuristics built on them.
pub mod location;
/// Exact and fuzzy identity resolution.
pub mod matcher;
/// Body canonicalization.
pub mod normalize;
/// Persisted identifier → entry store.
pub mod registry;
/// Run lifecycle wrapper (assign during collection, cleanup + save at end).
pub mod session;
/// Similarity primitives used by fuzzy matching.
pub mod similarity;
/// Raw storage port and the in-memory store.
pub mod store;

pub use config::{EngineConfig, Vocabulary};
pub use extract::{Extractor, TestDeclaration};
pub use fingerprint::{BodyPrint, Fingerprint, Fingerprinter, HashAlgorithm};
pub use location::location_string;
pub use matcher::{
    Assignment, MatchKind, Matcher, Resolution, TestOccurrence, DEFAULT_SIMILARITY_THRESHOLD,
};
pub use normalize::{normalize, NormalizeOptions};
pub use registry::{
    LoadStatus, Registry, RegistryEntry, RegistryError, TestId, DEFAULT_REGISTRY_KEY,
};
pub use session::{AttachedTest, RunSession, RunSummary};
pub use store::{MemoryStore, Store, StoreError};
