// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use proptest::prelude::*;
use testprint_core::{Fingerprinter, HashAlgorithm, NormalizeOptions};

fn statement() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["value", "result", "cart", "total", "user"]),
        prop::sample::select(vec!["compute", "load", "render", "sum"]),
        0u32..1000,
    )
        .prop_map(|(var, func, n)| format!("const {var} = {func}({n});\nexpect({var}).toBe({n});"))
}

fn body() -> impl Strategy<Value = String> {
    prop::collection::vec(statement(), 1..5).prop_map(|stmts| format!("{{\n{}\n}}", stmts.join("\n")))
}

fn reformat(body: &str, indent: &str, comment: bool) -> String {
    let mut out = String::new();
    for line in body.lines() {
        out.push_str(indent);
        out.push_str(line.trim());
        if comment && line.ends_with(';') {
            out.push_str(" // note");
        }
        out.push_str("\n\n");
    }
    out
}

proptest! {
    #[test]
    fn fingerprint_is_deterministic(body in body()) {
        for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Blake3] {
            let fp = Fingerprinter::new(algorithm, NormalizeOptions::default());
            let a = fp.fingerprint_body(&body);
            prop_assert_eq!(&a, &fp.fingerprint_body(&body));
            prop_assert_eq!(a.as_str().len(), algorithm.hex_width());
        }
    }

    #[test]
    fn layout_and_comments_do_not_change_fingerprint(
        body in body(),
        indent in prop::sample::select(vec!["", "  ", "\t", "        "]),
        comment in any::<bool>(),
    ) {
        let fp = Fingerprinter::default();
        let reformatted = reformat(&body, indent, comment);
        prop_assert_eq!(fp.normalize(&body), fp.normalize(&reformatted));
        prop_assert_eq!(fp.fingerprint_body(&body), fp.fingerprint_body(&reformatted));
    }

    #[test]
    fn local_names_do_not_change_fingerprint(n in 0u32..1000) {
        let fp = Fingerprinter::default();
        let a = format!("{{ const first = compute({n}); expect(first).toBe({n}); }}");
        let b = format!("{{ const second = evaluate({n}); expect(second).toBe({n}); }}");
        prop_assert_eq!(fp.fingerprint_body(&a), fp.fingerprint_body(&b));
    }
}

#[test]
fn preserving_identifiers_distinguishes_names() {
    let fp = Fingerprinter::new(
        HashAlgorithm::Sha1,
        NormalizeOptions {
            preserve_identifiers: true,
        },
    );
    assert_ne!(
        fp.fingerprint_body("{ const a = f(); }"),
        fp.fingerprint_body("{ const b = f(); }")
    );
}

#[test]
fn spread_and_template_names_do_not_change_fingerprint() {
    let fp = Fingerprinter::default();
    assert_eq!(
        fp.fingerprint_body("{ const xs = build(...items); expect(`${xs}`).toBe('1,2') }"),
        fp.fingerprint_body("{ const ys = build(...others); expect(`${ys}`).toBe('1,2') }")
    );
}
