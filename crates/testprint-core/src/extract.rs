// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Test declaration extraction from JavaScript source using tree-sitter.
//!
//! A call qualifies when its callee is a test keyword (`test`, `it`) or a
//! qualified member of one (`test.skip`, `it.only`), its first argument is a
//! literal string, and its second argument is a function expression. The body
//! of that function is the test body.
//!
//! Suite calls (`describe`, `suite`, and their qualified forms) with the same
//! shape are not emitted; their names become the `containers` of every test
//! nested inside them.
//!
//! Anything else is skipped silently. A source that does not parse cleanly
//! yields no declarations at all.

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::config::Vocabulary;
use crate::location::location_string;
use crate::matcher::TestOccurrence;

const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// One extracted test declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDeclaration {
    /// Declared name (the literal's contents, quotes removed).
    pub name: String,
    /// Source text of the callback body.
    pub body: String,
    /// Source text of the whole declaring call.
    pub raw: String,
    /// Enclosing suite names, outermost first.
    pub containers: Vec<String>,
    /// 1-based line of the declaring call.
    pub line: usize,
}

impl TestDeclaration {
    /// Borrow as a matcher occurrence.
    pub fn occurrence(&self) -> TestOccurrence<'_> {
        TestOccurrence::new(&self.name, &self.body)
    }

    /// Location string for this declaration inside `file`.
    pub fn location(&self, file: &str) -> String {
        location_string(file, &self.containers, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Test,
    Suite,
}

/// Walks a syntax tree and collects test declarations in pre-order.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    vocabulary: Vocabulary,
}

impl Extractor {
    /// Create an extractor for the given vocabulary.
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Vocabulary in use.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Extract every qualifying declaration from `source`, in depth-first
    /// pre-order. Unparseable sources yield an empty list.
    pub fn extract(&self, source: &str) -> Vec<TestDeclaration> {
        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
            debug!(%err, "javascript grammar unavailable");
            return Vec::new();
        }
        let Some(tree) = parser.parse(source, None) else {
            debug!("parser produced no tree");
            return Vec::new();
        };
        let root = tree.root_node();
        if root.has_error() {
            debug!("source has syntax errors; skipping extraction");
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut containers = Vec::new();
        self.visit(root, source.as_bytes(), &mut containers, &mut out);
        debug!(declarations = out.len(), "extracted test declarations");
        out
    }

    fn visit(
        &self,
        node: Node<'_>,
        src: &[u8],
        containers: &mut Vec<String>,
        out: &mut Vec<TestDeclaration>,
    ) {
        if node.kind() == "call_expression" {
            if let Some((role, name, body)) = self.classify(node, src) {
                match role {
                    Role::Test => out.push(TestDeclaration {
                        name,
                        body,
                        raw: text(node, src).unwrap_or_default().to_owned(),
                        containers: containers.clone(),
                        line: node.start_position().row + 1,
                    }),
                    Role::Suite => {
                        containers.push(name);
                        self.visit_children(node, src, containers, out);
                        containers.pop();
                        return;
                    }
                }
            }
        }
        self.visit_children(node, src, containers, out);
    }

    fn visit_children(
        &self,
        node: Node<'_>,
        src: &[u8],
        containers: &mut Vec<String>,
        out: &mut Vec<TestDeclaration>,
    ) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, src, containers, out);
        }
    }

    /// `(role, declared name, body text)` for a qualifying call.
    fn classify(&self, call: Node<'_>, src: &[u8]) -> Option<(Role, String, String)> {
        let role = self.callee_role(call.child_by_field_name("function")?, src)?;
        let args = call.child_by_field_name("arguments")?;
        if args.kind() != "arguments" {
            return None;
        }
        let mut cursor = args.walk();
        let mut positional = args.named_children(&mut cursor).filter(|n| !n.is_extra());
        let name = literal_string(positional.next()?, src)?;
        let callback = positional.next()?;
        if !FUNCTION_KINDS.contains(&callback.kind()) {
            return None;
        }
        let body = text(callback.child_by_field_name("body")?, src)?;
        Some((role, name, body.to_owned()))
    }

    fn callee_role(&self, callee: Node<'_>, src: &[u8]) -> Option<Role> {
        let keyword = match callee.kind() {
            "identifier" => text(callee, src)?,
            "member_expression" => {
                let object = callee.child_by_field_name("object")?;
                let property = callee.child_by_field_name("property")?;
                if object.kind() != "identifier"
                    || !self.vocabulary.is_qualifier(text(property, src)?)
                {
                    return None;
                }
                text(object, src)?
            }
            _ => return None,
        };
        if self.vocabulary.is_test(keyword) {
            Some(Role::Test)
        } else if self.vocabulary.is_suite(keyword) {
            Some(Role::Suite)
        } else {
            None
        }
    }
}

fn text<'s>(node: Node<'_>, src: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(src).ok()
}

/// Contents of a quoted string or a substitution-free template literal.
fn literal_string(node: Node<'_>, src: &[u8]) -> Option<String> {
    let quoted = match node.kind() {
        "string" => text(node, src)?,
        "template_string" => {
            let mut cursor = node.walk();
            if node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution")
            {
                return None;
            }
            text(node, src)?
        }
        _ => return None,
    };
    let mut chars = quoted.chars();
    chars.next();
    chars.next_back();
    Some(unescape(chars.as_str()))
}

/// Resolve JavaScript string escapes. Malformed `\x`/`\u` escapes are kept
/// verbatim.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // line continuation
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' | 'u' => {
                let rest: String = chars.clone().collect();
                let (digits, consumed) = match (esc, rest.strip_prefix('{')) {
                    ('x', _) => (rest.get(..2).unwrap_or(""), 2),
                    ('u', Some(braced)) => match braced.find('}') {
                        Some(end) => (&braced[..end], end + 2),
                        None => ("", 0),
                    },
                    _ => (rest.get(..4).unwrap_or(""), 4),
                };
                match decode_hex(digits) {
                    Some(c) => {
                        out.push(c);
                        for _ in 0..consumed {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(esc);
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn decode_hex(digits: &str) -> Option<char> {
    if digits.is_empty() || digits.len() > 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> Vec<TestDeclaration> {
        Extractor::default().extract(src)
    }

    #[test]
    fn plain_test_and_it_calls() {
        let decls = extract(
            r#"
test('adds', () => { expect(1 + 1).toBe(2); });
it("subtracts", function () { expect(2 - 1).toBe(1); });
"#,
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "adds");
        assert_eq!(decls[0].body, "{ expect(1 + 1).toBe(2); }");
        assert_eq!(decls[0].line, 2);
        assert!(decls[0].raw.starts_with("test('adds'"));
        assert_eq!(decls[1].name, "subtracts");
        assert_eq!(decls[1].body, "{ expect(2 - 1).toBe(1); }");
    }

    #[test]
    fn qualified_calls_and_expression_bodies() {
        let decls = extract(
            "test.skip(`later`, () => expect(x).toBe(1));\nit.only('now', async () => {});",
        );
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["later", "now"]);
        assert_eq!(decls[0].body, "expect(x).toBe(1)");
        assert_eq!(decls[1].body, "{}");
    }

    #[test]
    fn suites_become_containers_in_preorder() {
        let decls = extract(
            r"
describe('Math', () => {
  test('outer', () => {});
  describe.only('nested  suite', () => {
    it('inner', () => {});
  });
});
test('top', () => {});
",
        );
        let got: Vec<_> = decls
            .iter()
            .map(|d| (d.name.as_str(), d.containers.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("outer", vec!["Math".to_owned()]),
                ("inner", vec!["Math".to_owned(), "nested  suite".to_owned()]),
                ("top", vec![]),
            ]
        );
        assert_eq!(decls[1].location("math.test.js"), "math.test.js::Math::nested suite::inner");
    }

    #[test]
    fn wrong_shapes_are_skipped() {
        let decls = extract(
            r"
test(name, () => {});
test('no callback');
test('not a function', helper);
test(`templ ${x}`, () => {});
foo('x', () => {});
test.each([1])('each', () => {});
test.weird('x', () => {});
",
        );
        assert!(decls.is_empty(), "{decls:?}");
    }

    #[test]
    fn escaped_names_are_unescaped() {
        let decls = extract(
            r#"
test('it\'s fine', () => {});
it("say \"hi\"", () => {});
test(`tab\there`, () => {});
test('caf\u00e9 \u{1F600} \x41', () => {});
"#,
        );
        let names: Vec<_> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["it's fine", "say \"hi\"", "tab\there", "café 😀 A"]);
        assert_eq!(decls[0].location("a.test.js"), "a.test.js::it's fine");
    }

    #[test]
    fn unescape_keeps_malformed_escapes() {
        assert_eq!(unescape(r"\xZZ"), r"\xZZ");
        assert_eq!(unescape(r"\u{zz}"), r"\u{zz}");
        assert_eq!(unescape(r"\q"), "q");
        assert_eq!(unescape("line\\\ncont"), "linecont");
    }

    #[test]
    fn comments_between_arguments_are_ignored() {
        let decls = extract("test(/* why */ 'c', /* how */ () => { run() });");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "c");
    }

    #[test]
    fn unparseable_source_yields_nothing() {
        assert!(extract("test('a', () => { expect(1).toBe(1) ").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn custom_vocabulary() {
        let vocab = Vocabulary {
            test_keywords: vec!["spec".into()],
            suite_keywords: vec!["context".into()],
            qualifiers: vec!["pending".into()],
        };
        let decls = Extractor::new(vocab).extract(
            "context('c', () => { spec.pending('s', () => {}); test('t', () => {}); });",
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "s");
        assert_eq!(decls[0].containers, vec!["c".to_owned()]);
    }
}
