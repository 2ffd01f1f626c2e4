// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical form of a test body.
//!
//! Rules, in order:
//!
//! 1. Comments are removed.
//! 2. Whitespace runs collapse to one space, and operator runs are padded with
//!    single spaces so `a+b` and `a + b` coincide.
//! 3. Leading/trailing whitespace is trimmed and one trailing `;` or `,` dropped.
//! 4. Unless identifiers are preserved, every local identifier is replaced by an
//!    ordinal placeholder (`$0`, `$1`, ...) in order of first appearance. Names in
//!    [`WELL_KNOWN_NAMES`] and property names after `.` are kept verbatim.
//!
//! Normalization works on the raw text span, so only textual differences
//! collapse. `a+b` and `b+a` stay distinct.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lexer::{Lexer, TokenKind};

/// Options controlling canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeOptions {
    /// Keep local identifier names verbatim (renaming a variable then changes
    /// the fingerprint).
    pub preserve_identifiers: bool,
}

/// Names left untouched by identifier folding: test/assert vocabulary, common
/// globals, and language keywords.
pub const WELL_KNOWN_NAMES: &[&str] = &[
    // test vocabulary
    "describe", "it", "test", "suite", "expect", "assert", "beforeEach", "afterEach",
    "beforeAll", "afterAll", "jest", "vi", "done", "skip", "only", "todo", "each",
    "not", "resolves", "rejects", "toBe", "toEqual", "toStrictEqual", "toThrow",
    "toThrowError", "toMatch", "toMatchObject", "toMatchSnapshot", "toContain",
    "toContainEqual", "toHaveLength", "toHaveProperty", "toHaveBeenCalled",
    "toHaveBeenCalledWith", "toHaveBeenCalledTimes", "toBeTruthy", "toBeFalsy",
    "toBeNull", "toBeUndefined", "toBeDefined", "toBeNaN", "toBeInstanceOf",
    "toBeCloseTo", "toBeGreaterThan", "toBeGreaterThanOrEqual", "toBeLessThan",
    "toBeLessThanOrEqual", "fn", "mock", "spyOn",
    // globals
    "console", "Math", "JSON", "Object", "Array", "Promise", "Number", "String",
    "Boolean", "Date", "Error", "TypeError", "RegExp", "Symbol", "Map", "Set",
    "WeakMap", "WeakSet", "BigInt", "undefined", "NaN", "Infinity", "globalThis",
    "window", "document", "global", "process", "require", "module", "exports",
    "setTimeout", "clearTimeout", "setInterval", "clearInterval", "parseInt",
    "parseFloat", "fetch",
    // keywords
    "async", "await", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "export", "extends", "false",
    "finally", "for", "from", "function", "if", "import", "in", "instanceof", "let",
    "new", "null", "of", "return", "static", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Canonicalize `body` according to `options`.
///
/// Pure and deterministic: the same input and options always produce the same
/// output.
pub fn normalize(body: &str, options: NormalizeOptions) -> String {
    let mut out = String::with_capacity(body.len());
    let mut pending_space = false;
    let mut after_dot = false;
    let mut placeholders: HashMap<&str, usize> = HashMap::new();

    for token in Lexer::new(body) {
        let text = match token.kind {
            TokenKind::Comment => continue,
            TokenKind::Space => {
                pending_space = true;
                continue;
            }
            TokenKind::Op => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(token.text);
                pending_space = true;
                after_dot = false;
                continue;
            }
            TokenKind::Ident if !options.preserve_identifiers && !after_dot => {
                if WELL_KNOWN_NAMES.contains(&token.text) {
                    token.text.to_owned()
                } else {
                    let next = placeholders.len();
                    let ordinal = *placeholders.entry(token.text).or_insert(next);
                    format!("${ordinal}")
                }
            }
            _ => token.text.to_owned(),
        };
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        after_dot = token.kind == TokenKind::Punct && token.text == ".";
        out.push_str(&text);
    }

    let trimmed = out.trim_end();
    let trimmed = trimmed
        .strip_suffix(';')
        .or_else(|| trimmed.strip_suffix(','))
        .unwrap_or(trimmed);
    trimmed.trim_end().to_owned()
}
