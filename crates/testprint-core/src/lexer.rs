// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal JavaScript lexer backing the normalizer.
//!
//! Only separates what canonicalization needs to see: comments, whitespace,
//! string-like literals (kept verbatim), identifiers, numbers, operator runs,
//! and single punctuation characters. It never fails; unterminated literals and
//! comments run to the end of input.
//!
//! Template literals are split at their substitutions: the literal text pieces
//! (`` `a${ ``, `` }b${ ``, `` }c` ``) come out as [`TokenKind::Str`] and the
//! expressions between them are lexed like any other code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Space,
    Comment,
    /// Quoted string, or a literal piece of a template string.
    Str,
    Regex,
    Ident,
    Number,
    /// Run of binary/assignment operator characters (`+=`, `===`, `=>`, ...).
    Op,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: &'a str,
}

const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '%', '=', '<', '>', '!', '&', '|', '^', '?', ':', '~',
];

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
    "await",
];

pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    regex_allowed: bool,
    /// Open `{` count inside each enclosing template substitution.
    templates: Vec<usize>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            regex_allowed: true,
            templates: Vec::new(),
        }
    }

    fn scan_token(&mut self, rest: &str, c: char) -> (TokenKind, usize) {
        if c.is_whitespace() {
            return (TokenKind::Space, run_len(rest, char::is_whitespace));
        }
        if rest.starts_with("//") {
            return (TokenKind::Comment, rest.find('\n').unwrap_or(rest.len()));
        }
        if rest.starts_with("/*") {
            let len = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
            return (TokenKind::Comment, len);
        }
        match c {
            '"' | '\'' => return (TokenKind::Str, quoted_len(rest, c)),
            '`' => return (TokenKind::Str, self.template_piece(rest)),
            '{' => {
                if let Some(depth) = self.templates.last_mut() {
                    *depth += 1;
                }
            }
            '}' => match self.templates.last().copied() {
                Some(0) => {
                    self.templates.pop();
                    return (TokenKind::Str, self.template_piece(rest));
                }
                Some(_) => {
                    if let Some(depth) = self.templates.last_mut() {
                        *depth -= 1;
                    }
                }
                None => {}
            },
            '.' if rest.starts_with("...") => return (TokenKind::Punct, 3),
            '/' if self.regex_allowed => {
                if let Some(len) = regex_len(rest) {
                    return (TokenKind::Regex, len);
                }
            }
            _ => {}
        }
        if is_ident_start(c) {
            return (TokenKind::Ident, run_len(rest, is_ident_continue));
        }
        if c.is_ascii_digit() {
            let len = run_len(rest, |ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_');
            return (TokenKind::Number, len);
        }
        if OPERATOR_CHARS.contains(&c) {
            return (TokenKind::Op, operator_len(rest));
        }
        (TokenKind::Punct, c.len_utf8())
    }

    /// Template text from an opening `` ` `` or closing `}` up to and including
    /// the next `${` or closing `` ` ``. Entering a substitution pushes a
    /// fresh brace counter.
    fn template_piece(&mut self, rest: &str) -> usize {
        let mut chars = rest.char_indices().skip(1).peekable();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => {
                    chars.next();
                }
                '`' => return i + 1,
                '$' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    self.templates.push(0);
                    return i + 2;
                }
                _ => {}
            }
        }
        rest.len()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let src = self.src;
        let rest = &src[self.pos..];
        let c = rest.chars().next()?;
        let (kind, len) = self.scan_token(rest, c);
        let text = &rest[..len];
        self.pos += len;
        self.regex_allowed = match kind {
            TokenKind::Space | TokenKind::Comment => self.regex_allowed,
            TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&text),
            TokenKind::Str => text.ends_with("${"),
            TokenKind::Regex | TokenKind::Number => false,
            TokenKind::Op => true,
            TokenKind::Punct => !matches!(text, ")" | "]" | "}"),
        };
        Some(Token { kind, text })
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

fn run_len(rest: &str, pred: impl Fn(char) -> bool) -> usize {
    rest.char_indices()
        .find(|&(_, ch)| !pred(ch))
        .map_or(rest.len(), |(i, _)| i)
}

/// Length of a quoted literal including both quotes. Stops before an
/// unescaped newline.
fn quoted_len(rest: &str, quote: char) -> usize {
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' => return i,
            _ if ch == quote => return i + ch.len_utf8(),
            _ => {}
        }
    }
    rest.len()
}

/// Length of a regex literal (with flags), or `None` if the line ends first.
fn regex_len(rest: &str) -> Option<usize> {
    let mut in_class = false;
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' => return None,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let end = i + 1;
                return Some(end + run_len(&rest[end..], |f| f.is_ascii_alphabetic()));
            }
            _ => {}
        }
    }
    None
}

fn operator_len(rest: &str) -> usize {
    let mut len = 0;
    for (i, ch) in rest.char_indices() {
        if !OPERATOR_CHARS.contains(&ch) {
            break;
        }
        if i > 0 && (rest[i..].starts_with("//") || rest[i..].starts_with("/*")) {
            break;
        }
        len = i + ch.len_utf8();
    }
    len
}
