// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Splits raw pattern text into lexemes.
//!
//! Scanning is left to right. At each position the lexer tries, in order:
//!
//! 1. the escape character `\`, which copies the next character verbatim,
//! 2. a region bracket (`[` `]` `{` `}`),
//! 3. a single-character flag, but only inside a region,
//! 4. an operator or group bracket (`(` `)` `&` `|` `^` `->` `=>`).
//!
//! Anything else accumulates into a text run. Text runs are trimmed and
//! whitespace-only runs are dropped. The lexer never fails; structural
//! problems are reported by the classifier and the compiler.

use std::fmt;

/// Escape character. The following character loses any special meaning.
pub const ESCAPE: char = '\\';

/// Flag characters recognised inside `[...]` and `{...}`.
pub const FLAG_CHARS: [char; 8] = ['x', ':', '+', '-', '?', '*', '!', 's'];

/// A special token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `(`
    GroupOpen,
    /// `)`
    GroupClose,
    /// `[`, opens an occurrence region.
    FlagOpen,
    /// `]`
    FlagClose,
    /// `{`, opens a timing region.
    TimingOpen,
    /// `}`
    TimingClose,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`, reserved.
    Except,
    /// `->`, separates steps.
    Then,
    /// `=>`, separates the steps from the pattern name.
    Result,
    /// A single-character flag inside a region.
    Flag(char),
}

/// Region brackets, checked before anything else.
const REGION_BRACKETS: [(&str, Symbol); 4] = [
    ("[", Symbol::FlagOpen),
    ("]", Symbol::FlagClose),
    ("{", Symbol::TimingOpen),
    ("}", Symbol::TimingClose),
];

/// Operators and group brackets, checked last.
const SPLITTERS: [(&str, Symbol); 7] = [
    ("(", Symbol::GroupOpen),
    (")", Symbol::GroupClose),
    ("|", Symbol::Or),
    ("&", Symbol::And),
    ("^", Symbol::Except),
    ("->", Symbol::Then),
    ("=>", Symbol::Result),
];

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(c) => write!(f, "{c}"),
            other => {
                let text = REGION_BRACKETS
                    .iter()
                    .chain(SPLITTERS.iter())
                    .find(|(_, sym)| sym == other)
                    .map_or("?", |(text, _)| *text);
                f.write_str(text)
            }
        }
    }
}

/// What a lexeme holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexemeKind {
    /// A special token.
    Symbol(Symbol),
    /// A trimmed, unescaped text run: a behavior name or a region number.
    Text(String),
}

/// A lexeme and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    /// The lexeme itself.
    pub kind: LexemeKind,
    /// Byte offset in the source text.
    pub position: usize,
}

impl Lexeme {
    /// Returns true if this lexeme is the given symbol.
    #[inline]
    pub fn is(&self, symbol: Symbol) -> bool {
        self.kind == LexemeKind::Symbol(symbol)
    }
}

/// Splits `input` into lexemes.
///
/// # Examples
///
/// ```
/// use behavior_pattern::pattern::lexer::{tokenize, LexemeKind, Symbol};
///
/// let lexemes = tokenize("A[2+] | B");
/// let kinds: Vec<LexemeKind> = lexemes.into_iter().map(|l| l.kind).collect();
/// assert_eq!(kinds, vec![
///     LexemeKind::Text("A".into()),
///     LexemeKind::Symbol(Symbol::FlagOpen),
///     LexemeKind::Text("2".into()),
///     LexemeKind::Symbol(Symbol::Flag('+')),
///     LexemeKind::Symbol(Symbol::FlagClose),
///     LexemeKind::Symbol(Symbol::Or),
///     LexemeKind::Text("B".into()),
/// ]);
/// ```
pub fn tokenize(input: &str) -> Vec<Lexeme> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    in_region: bool,
    current: String,
    current_start: usize,
    out: Vec<Lexeme>,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            in_region: false,
            current: String::new(),
            current_start: 0,
            out: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Lexeme> {
        while let Some(c) = self.peek() {
            if c == ESCAPE {
                self.pos += c.len_utf8();
                if let Some(escaped) = self.peek() {
                    self.push_char(escaped);
                    self.pos += escaped.len_utf8();
                }
                continue;
            }

            if let Some((text, symbol)) = match_any(self.rest(), &REGION_BRACKETS) {
                self.in_region = matches!(symbol, Symbol::FlagOpen | Symbol::TimingOpen);
                self.emit_symbol(symbol, text.len());
                continue;
            }

            if self.in_region && FLAG_CHARS.contains(&c) {
                self.emit_symbol(Symbol::Flag(c), c.len_utf8());
                continue;
            }

            if let Some((text, symbol)) = match_any(self.rest(), &SPLITTERS) {
                self.emit_symbol(symbol, text.len());
                continue;
            }

            self.push_char(c);
            self.pos += c.len_utf8();
        }
        self.flush();
        self.out
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn push_char(&mut self, c: char) {
        if self.current.is_empty() {
            self.current_start = self.pos;
        }
        self.current.push(c);
    }

    fn emit_symbol(&mut self, symbol: Symbol, len: usize) {
        self.flush();
        self.out.push(Lexeme {
            kind: LexemeKind::Symbol(symbol),
            position: self.pos,
        });
        self.pos += len;
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            let leading = self.current.len() - self.current.trim_start().len();
            self.out.push(Lexeme {
                kind: LexemeKind::Text(trimmed.to_string()),
                position: self.current_start + leading,
            });
        }
        self.current.clear();
    }
}

fn match_any(rest: &str, table: &[(&'static str, Symbol)]) -> Option<(&'static str, Symbol)> {
    table
        .iter()
        .find(|(text, _)| rest.starts_with(*text))
        .copied()
}
