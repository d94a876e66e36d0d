// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Compiles the tokens of one step into an [`Expression`].
//!
//! Compilation runs in three passes:
//!
//! 1. [`to_postfix`] reorders infix tokens with the shunting-yard algorithm.
//!    Occurrence and timing modifiers are postfix operators that bind
//!    tightest, `&` binds tighter than `|`, and both are left-associative.
//! 2. [`compile`] builds the node arena from the postfix stream with an
//!    operand stack. Modifiers apply to the operand on top of the stack;
//!    when the same kind of modifier appears twice, the first one wins.
//! 3. Default ranges from [`CompileOptions`] are filled into every leaf that
//!    has no explicit range of its own or above it.

use crate::common::behavior::BehaviorRegistry;
use crate::common::range::Range;
use crate::pattern::element::{Expression, Node, NodeId};
use crate::pattern::error::{ErrorKind, PatternError};
use crate::pattern::lexer::Lexeme;
use crate::pattern::step::Step;
use crate::pattern::token::{classify, Token, TokenKind};

/// Ranges applied to leaves the pattern text leaves unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    /// Occurrence range for leaves without one. Exactly one by default.
    pub default_occurrences: Range,
    /// Timing window, in seconds, for leaves without one. `0..=1` by default.
    /// `[n, n]` with `n > 0` is read as `0..=n`, the same as `{sn}` in text.
    pub default_timing: Range,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_occurrences: Range::ONE,
            default_timing: Range::UNIT,
        }
    }
}

/// Compiles the lexemes of one step (no `->` or `=>` inside).
pub fn compile_step(
    lexemes: &[Lexeme],
    registry: &mut BehaviorRegistry,
    options: &CompileOptions,
) -> Result<Step, PatternError> {
    let start = lexemes.first().map_or(0, |l| l.position);
    let postfix = to_postfix(classify(lexemes)?)?;
    if postfix.is_empty() {
        return Err(PatternError::new(
            ErrorKind::MalformedExpression,
            "step contains no behavior",
            start,
        ));
    }
    compile(postfix, registry, options).map(Step::new)
}

/// Rewrites infix tokens into postfix order.
///
/// # Errors
///
/// Returns [`ErrorKind::UnbalancedGroup`] if a `)` has no matching `(` or a
/// `(` is never closed, and [`ErrorKind::MalformedExpression`] if a flag
/// does not directly follow a behavior, a `)` or another flag.
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, PatternError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();
    // true right after a behavior, a `)` or a flag
    let mut after_operand = false;

    for token in tokens {
        let is_modifier = matches!(token.kind, TokenKind::Flags(_) | TokenKind::Timing(_));
        if is_modifier && !after_operand {
            return Err(PatternError::new(
                ErrorKind::MalformedExpression,
                "flag does not follow a behavior or group",
                token.position,
            ));
        }
        after_operand = matches!(token.kind, TokenKind::Behavior(_) | TokenKind::Group(false))
            || is_modifier;

        match token.kind {
            TokenKind::Behavior(_) => output.push(token),
            TokenKind::Group(true) => operators.push(token),
            TokenKind::Group(false) => loop {
                match operators.pop() {
                    Some(top) if top.is_group_open() => break,
                    Some(top) => output.push(top),
                    None => {
                        return Err(PatternError::new(
                            ErrorKind::UnbalancedGroup,
                            "missing opening '('",
                            token.position,
                        ));
                    }
                }
            },
            TokenKind::Operator(_) | TokenKind::Flags(_) | TokenKind::Timing(_) => {
                let precedence = token.precedence();
                while let Some(top) = operators.pop() {
                    if top.is_group_open() || top.precedence() < precedence {
                        operators.push(top);
                        break;
                    }
                    output.push(top);
                }
                operators.push(token);
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top.is_group_open() {
            return Err(PatternError::new(
                ErrorKind::UnbalancedGroup,
                "missing closing ')'",
                top.position,
            ));
        }
        output.push(top);
    }
    Ok(output)
}

/// Builds an expression from postfix tokens and fills in default ranges.
///
/// # Errors
///
/// Returns [`ErrorKind::MalformedExpression`] when an operator or modifier
/// lacks an operand, or when the stream does not reduce to exactly one
/// expression.
pub fn compile(
    postfix: Vec<Token>,
    registry: &mut BehaviorRegistry,
    options: &CompileOptions,
) -> Result<Expression, PatternError> {
    let mut nodes: Vec<Node> = Vec::with_capacity(postfix.len());
    // operand stack of (node, position of its first token)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for token in postfix {
        let position = token.position;
        match token.kind {
            TokenKind::Behavior(name) => {
                nodes.push(Node::behavior(registry.intern(&name), &name));
                stack.push((nodes.len() - 1, position));
            }
            TokenKind::Operator(operator) => {
                let (Some((right, _)), Some((left, left_position))) = (stack.pop(), stack.pop())
                else {
                    return Err(PatternError::new(
                        ErrorKind::MalformedExpression,
                        format!("operator '{}' needs two operands", operator.as_str()),
                        position,
                    ));
                };
                nodes.push(Node::conditional(operator, left, right));
                stack.push((nodes.len() - 1, left_position));
            }
            TokenKind::Flags(range) => {
                let Some(&(top, _)) = stack.last() else {
                    return Err(PatternError::new(
                        ErrorKind::MalformedExpression,
                        "occurrence flag does not follow a behavior or group",
                        position,
                    ));
                };
                nodes[top].set_occurrences(range);
            }
            TokenKind::Timing(range) => {
                let Some(&(top, _)) = stack.last() else {
                    return Err(PatternError::new(
                        ErrorKind::MalformedExpression,
                        "timing flag does not follow a behavior or group",
                        position,
                    ));
                };
                nodes[top].set_timing(range);
            }
            TokenKind::Group(_) => {
                return Err(PatternError::new(
                    ErrorKind::UnbalancedGroup,
                    "unexpected bracket",
                    position,
                ));
            }
        }
    }

    match stack.as_slice() {
        [(root, _)] => {
            let mut expression = Expression::from_nodes(nodes, *root);
            expression.fill_defaults(
                options.default_occurrences,
                options.default_timing.as_window(),
            );
            Ok(expression)
        }
        [] => Err(PatternError::new(
            ErrorKind::MalformedExpression,
            "step contains no behavior",
            0,
        )),
        [_, (_, position), ..] => Err(PatternError::new(
            ErrorKind::MalformedExpression,
            "missing operator between operands",
            *position,
        )),
    }
}
