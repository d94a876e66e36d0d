// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Turns the lexemes of one step into typed tokens.
//!
//! Region contents are parsed here: `[...]` becomes a [`TokenKind::Flags`]
//! occurrence range and `{s...}` becomes a [`TokenKind::Timing`] window.
//!
//! # Occurrence regions
//!
//! | text | range |
//! |------|-------|
//! | `[n]`, `[nx]`, `[xn]` | exactly `n` |
//! | `[n:m]` | `n..=m` |
//! | `[n:]` | at least `n` |
//! | `[:m]` | at most `m` |
//! | `[+]`, `[n+]` | at least 1 / `n` |
//! | `[-]`, `[n-]` | at most 1 / `n` |
//! | `[?]` | `0..=1` |
//! | `[*]` | at least 0 |
//! | `[!]` | exactly 0 |
//!
//! # Timing regions
//!
//! `{s` followed by `n`, `n:m`, `n:` or `:m`, then `}`. A single non-zero
//! number means "within `n` seconds", so `{s5}` is `0..=5`, not exactly 5.

use crate::common::range::{Range, RangeError};
use crate::pattern::error::{ErrorKind, PatternError};
use crate::pattern::lexer::{Lexeme, LexemeKind, Symbol};

/// Binary step operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `&`: both operands must be satisfied.
    And,
    /// `|`: either operand suffices.
    Or,
}

impl Operator {
    /// Pattern text of the operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
        }
    }
}

/// What a token means to the expression compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A behavior name.
    Behavior(String),
    /// `(` when true, `)` when false.
    Group(bool),
    /// `&` or `|`.
    Operator(Operator),
    /// Occurrence range applied to the preceding operand.
    Flags(Range),
    /// Timing window applied to the preceding operand.
    Timing(Range),
}

/// A classified token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token itself.
    pub kind: TokenKind,
    /// Byte offset in the source text.
    pub position: usize,
}

impl Token {
    /// Operator precedence used by the infix → postfix rewrite.
    ///
    /// Zero marks operands and group brackets. `&` binds tighter than `|`,
    /// and the postfix modifiers bind tighter than either so they always
    /// attach to the operand directly before them.
    pub fn precedence(&self) -> u8 {
        match self.kind {
            TokenKind::Behavior(_) | TokenKind::Group(_) => 0,
            TokenKind::Operator(Operator::Or) => 1,
            TokenKind::Operator(Operator::And) => 2,
            TokenKind::Flags(_) | TokenKind::Timing(_) => 3,
        }
    }

    /// Returns true for `(`.
    pub fn is_group_open(&self) -> bool {
        matches!(self.kind, TokenKind::Group(true))
    }
}

/// One item inside a `[...]` or `{...}` region.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Item {
    Flag(char),
    Number(f64),
}

/// Classifies the lexemes of a single step.
///
/// `->` and `=>` must already have been split off by the caller.
pub fn classify(lexemes: &[Lexeme]) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::with_capacity(lexemes.len());
    let mut iter = lexemes.iter();

    while let Some(lexeme) = iter.next() {
        let position = lexeme.position;
        let kind = match &lexeme.kind {
            LexemeKind::Text(name) => TokenKind::Behavior(name.clone()),
            LexemeKind::Symbol(symbol) => match *symbol {
                Symbol::GroupOpen => TokenKind::Group(true),
                Symbol::GroupClose => TokenKind::Group(false),
                Symbol::And => TokenKind::Operator(Operator::And),
                Symbol::Or => TokenKind::Operator(Operator::Or),
                Symbol::FlagOpen => {
                    let items = collect_region(&mut iter, Symbol::FlagClose, position)?;
                    TokenKind::Flags(parse_occurrences(&items, position)?)
                }
                Symbol::TimingOpen => {
                    let items = collect_region(&mut iter, Symbol::TimingClose, position)?;
                    TokenKind::Timing(parse_timing(&items, position)?)
                }
                Symbol::Except => {
                    return Err(PatternError::new(
                        ErrorKind::ReservedOperator,
                        "operator '^' is reserved and not supported",
                        position,
                    ));
                }
                Symbol::FlagClose | Symbol::TimingClose => {
                    return Err(PatternError::new(
                        ErrorKind::UnbalancedRegion,
                        format!("'{symbol}' without a matching opening bracket"),
                        position,
                    ));
                }
                Symbol::Then | Symbol::Result | Symbol::Flag(_) => {
                    return Err(PatternError::new(
                        ErrorKind::MalformedExpression,
                        format!("unexpected '{symbol}'"),
                        position,
                    ));
                }
            },
        };
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

/// Consumes lexemes up to and including `close`, returning the region items.
fn collect_region<'a>(
    iter: &mut impl Iterator<Item = &'a Lexeme>,
    close: Symbol,
    open_position: usize,
) -> Result<Vec<(Item, usize)>, PatternError> {
    let mut items = Vec::new();
    for lexeme in iter.by_ref() {
        match &lexeme.kind {
            LexemeKind::Symbol(symbol) if *symbol == close => return Ok(items),
            LexemeKind::Symbol(Symbol::Flag(c)) => items.push((Item::Flag(*c), lexeme.position)),
            LexemeKind::Symbol(symbol) => {
                return Err(PatternError::new(
                    ErrorKind::UnbalancedRegion,
                    format!("unexpected '{symbol}' inside region, expected '{close}'"),
                    lexeme.position,
                ));
            }
            LexemeKind::Text(text) => {
                let value = text.parse::<f64>().map_err(|_| {
                    PatternError::new(
                        ErrorKind::InvalidNumber,
                        format!("expected a number inside region, got '{text}'"),
                        lexeme.position,
                    )
                })?;
                items.push((Item::Number(value), lexeme.position));
            }
        }
    }
    Err(PatternError::new(
        ErrorKind::UnbalancedRegion,
        format!("region is not closed, expected '{close}'"),
        open_position,
    ))
}

fn parse_occurrences(items: &[(Item, usize)], position: usize) -> Result<Range, PatternError> {
    let mut values: Vec<Item> = items.iter().map(|(item, _)| *item).collect();
    // `x` is an optional marker on either side: `[2x]`, `[x2]`
    if values.first() == Some(&Item::Flag('x')) {
        values.remove(0);
    } else if values.last() == Some(&Item::Flag('x')) {
        values.pop();
    }

    let range = match values.as_slice() {
        [Item::Flag('!')] => Ok(Range::ZERO),
        [Item::Flag('?')] => Range::new(0.0, 1.0),
        [Item::Flag('*')] => Range::at_least(0.0),
        [Item::Flag('+')] => Range::at_least(1.0),
        [Item::Number(n), Item::Flag('+')] => Range::at_least(*n),
        [Item::Flag('-')] => Range::at_most(1.0),
        [Item::Number(n), Item::Flag('-')] => Range::at_most(*n),
        other => match parse_range(other) {
            Some(range) => range,
            None => {
                return Err(PatternError::new(
                    ErrorKind::UnknownFlag,
                    format!("unrecognized occurrence flag '[{}]'", render_items(items)),
                    position,
                ));
            }
        },
    };
    range.map_err(|err| PatternError::from_range(err, position))
}

fn parse_timing(items: &[(Item, usize)], position: usize) -> Result<Range, PatternError> {
    let Some(((Item::Flag('s'), _), rest)) = items.split_first() else {
        return Err(PatternError::new(
            ErrorKind::InvalidTiming,
            format!(
                "timing region must start with 's', got '{{{}}}'",
                render_items(items)
            ),
            position,
        ));
    };
    let values: Vec<Item> = rest.iter().map(|(item, _)| *item).collect();
    let Some(range) = parse_range(&values) else {
        return Err(PatternError::new(
            ErrorKind::InvalidTiming,
            format!("expected a range after 's', got '{{{}}}'", render_items(items)),
            position,
        ));
    };
    let range = range.map_err(|err| PatternError::from_range(err, position))?;
    Ok(range.as_window())
}

/// Parses `n`, `n:m`, `n:` or `:m`. Returns `None` for any other shape.
fn parse_range(items: &[Item]) -> Option<Result<Range, RangeError>> {
    match items {
        [Item::Number(n)] => Some(Range::exactly(*n)),
        [Item::Number(n), Item::Flag(':'), Item::Number(m)] => Some(Range::new(*n, *m)),
        [Item::Number(n), Item::Flag(':')] => Some(Range::at_least(*n)),
        [Item::Flag(':'), Item::Number(m)] => Some(Range::at_most(*m)),
        _ => None,
    }
}

fn render_items(items: &[(Item, usize)]) -> String {
    items
        .iter()
        .map(|(item, _)| match item {
            Item::Flag(c) => c.to_string(),
            Item::Number(n) => n.to_string(),
        })
        .collect()
}
