// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Location strings have the shape
//! `<relative-file-path>::<container-1>::...::<test-name>`.
//!
//! They say where a test sits during one run. They are not identity keys: the
//! matcher only uses them as a similarity signal.

/// Segment separator.
pub const SEPARATOR: &str = "::";

/// Collapse internal whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the location string for a test declared as `name` inside
/// `containers` (outermost first) in `file`.
///
/// Backslashes in `file` are rewritten to `/` so locations are stable across
/// platforms.
pub fn location_string<S: AsRef<str>>(file: &str, containers: &[S], name: &str) -> String {
    let mut segments = Vec::with_capacity(containers.len() + 2);
    segments.push(file.replace('\\', "/"));
    segments.extend(containers.iter().map(|c| collapse_whitespace(c.as_ref())));
    segments.push(collapse_whitespace(name));
    segments.join(SEPARATOR)
}

/// Final non-empty segment of a location string.
pub fn last_segment(location: &str) -> Option<&str> {
    location
        .rsplit(SEPARATOR)
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Re-derive a human test name from the final segment of `location`.
///
/// `math.test.js::should_work_correctly` → `should work correctly`.
pub fn derive_name(location: &str) -> Option<String> {
    loosen_name(last_segment(location)?)
}

/// Loosen snake, kebab and camel case into lowercase spaced words.
/// Returns `None` when nothing but separators remains.
pub fn loosen_name(segment: &str) -> Option<String> {
    let mut words = String::with_capacity(segment.len() + 4);
    let mut prev_lower = false;
    for ch in segment.chars() {
        if ch == '_' || ch == '-' {
            words.push(' ');
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            words.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        words.extend(ch.to_lowercase());
    }
    let name = collapse_whitespace(&words);
    (!name.is_empty()).then_some(name)
}
