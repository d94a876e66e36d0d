// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Parse errors for pattern text.
//!
//! Every failure is raised at compile time. Evaluation never fails: an event
//! sequence that does not fit the pattern simply produces no match.

use crate::common::range::RangeError;

/// Category of a [`PatternError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No `=>` result operator.
    MissingResult,
    /// More than one `=>` result operator.
    DuplicateResult,
    /// A step between `->` operators has no content.
    EmptyStep,
    /// A `(` without its `)` or the other way around.
    UnbalancedGroup,
    /// A `[`/`{` region that is not closed, nested, or closed without opening.
    UnbalancedRegion,
    /// An occurrence region (`[...]`) whose contents are not a known flag form.
    UnknownFlag,
    /// A timing region (`{...}`) that does not start with `s` or has no range.
    InvalidTiming,
    /// A region value that is not a number.
    InvalidNumber,
    /// A range whose bounds violate `0 <= min <= max`.
    InvalidRange,
    /// The reserved `^` operator.
    ReservedOperator,
    /// Operands and operators do not form a single expression.
    MalformedExpression,
}

/// Error returned when pattern text cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pattern error at position {position}: {message}")]
#[non_exhaustive]
pub struct PatternError {
    /// Category of the failure.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Byte offset in the pattern text where the error was detected.
    pub position: usize,
}

impl PatternError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }

    /// Wraps a [`RangeError`] raised while building a flag or timing range.
    pub fn from_range(err: RangeError, position: usize) -> Self {
        Self::new(ErrorKind::InvalidRange, err.to_string(), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_display() {
        let err = PatternError::new(ErrorKind::EmptyStep, "test error", 5);
        assert_eq!(err.to_string(), "pattern error at position 5: test error");
    }

    #[test]
    fn test_pattern_error_is_std_error() {
        let err = PatternError::new(ErrorKind::MissingResult, "test", 0);
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_from_range_keeps_message() {
        let err = PatternError::from_range(RangeError::NotANumber, 3);
        assert_eq!(err.kind, ErrorKind::InvalidRange);
        assert_eq!(err.position, 3);
        assert!(err.message.contains("must be numbers"));
    }
}
