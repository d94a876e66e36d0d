// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Inclusive numeric intervals.
//!
//! A [`Range`] serves two purposes on every expression node: an occurrence
//! range (how many distinct event indices the node must accumulate) and a
//! timing window (seconds elapsed since the step's timing baseline).
//!
//! Both bounds are inclusive and non-negative. The maximum may be
//! `f64::INFINITY` for open-ended ranges such as `[2+]` or `[*]`.

use std::fmt;

/// Error returned when a [`Range`] would violate its invariants.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum RangeError {
    /// One of the bounds was NaN.
    #[error("range bounds must be numbers")]
    NotANumber,
    /// One of the bounds was below zero.
    #[error("range {bound} must be greater than or equal to 0, got {value}")]
    Negative {
        /// Which bound was negative (`"minimum"` or `"maximum"`).
        bound: &'static str,
        /// The offending value.
        value: f64,
    },
    /// The maximum was below the minimum.
    #[error("range maximum {maximum} is below minimum {minimum}")]
    Inverted {
        /// Requested minimum.
        minimum: f64,
        /// Requested maximum.
        maximum: f64,
    },
}

/// An inclusive interval `[minimum, maximum]` with `0 <= minimum <= maximum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    minimum: f64,
    maximum: f64,
}

impl Range {
    /// `[0, 0]`: the node must not occur at all.
    pub const ZERO: Self = Self::new_unchecked(0.0, 0.0);

    /// `[1, 1]`: the default occurrence range.
    pub const ONE: Self = Self::new_unchecked(1.0, 1.0);

    /// `[0, 1]`: the default timing window, in seconds.
    pub const UNIT: Self = Self::new_unchecked(0.0, 1.0);

    /// Creates `[minimum, maximum]`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if either bound is NaN or negative, or if
    /// `maximum < minimum`.
    ///
    /// # Examples
    ///
    /// ```
    /// use behavior_pattern::common::range::Range;
    ///
    /// let r = Range::new(1.0, 3.0).unwrap();
    /// assert!(r.contains(2.0));
    /// assert!(Range::new(3.0, 1.0).is_err());
    /// ```
    pub fn new(minimum: f64, maximum: f64) -> Result<Self, RangeError> {
        if minimum.is_nan() || maximum.is_nan() {
            return Err(RangeError::NotANumber);
        }
        if minimum < 0.0 {
            return Err(RangeError::Negative {
                bound: "minimum",
                value: minimum,
            });
        }
        if maximum < 0.0 {
            return Err(RangeError::Negative {
                bound: "maximum",
                value: maximum,
            });
        }
        if maximum < minimum {
            return Err(RangeError::Inverted { minimum, maximum });
        }
        Ok(Self { minimum, maximum })
    }

    /// Bypasses validation. Only for compile-time constants known to be valid.
    const fn new_unchecked(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    /// `[n, n]`.
    pub fn exactly(n: f64) -> Result<Self, RangeError> {
        Self::new(n, n)
    }

    /// `[n, +inf]`.
    pub fn at_least(n: f64) -> Result<Self, RangeError> {
        Self::new(n, f64::INFINITY)
    }

    /// `[0, n]`.
    pub fn at_most(n: f64) -> Result<Self, RangeError> {
        Self::new(0.0, n)
    }

    /// Inclusive lower bound.
    #[inline]
    pub const fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Inclusive upper bound (possibly infinite).
    #[inline]
    pub const fn maximum(&self) -> f64 {
        self.maximum
    }

    /// `maximum - minimum`. Infinite for open-ended ranges.
    #[inline]
    pub fn width(&self) -> f64 {
        self.maximum - self.minimum
    }

    /// Returns true if the range has no upper bound.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.maximum.is_infinite()
    }

    /// Reads the range as a timing window: a zero-width range `[n, n]` with
    /// `n > 0` becomes `[0, n]` ("within `n` seconds"). Any other range is
    /// returned unchanged.
    #[must_use]
    pub fn as_window(self) -> Self {
        if self.width() == 0.0 && self.maximum != 0.0 {
            Self::new_unchecked(0.0, self.maximum)
        } else {
            self
        }
    }

    /// Returns true if `minimum <= value <= maximum`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.minimum && value <= self.maximum
    }

    /// Returns true if `count` lies inside the range.
    #[inline]
    pub fn contains_count(&self, count: usize) -> bool {
        self.contains(count as f64)
    }
}

/// Renders the bracket-free pattern syntax: `n`, `n:m`, or `n:` when
/// the maximum is unbounded.
impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}:", self.minimum)
        } else if self.minimum == self.maximum {
            write!(f, "{}", self.minimum)
        } else {
            write!(f, "{}:{}", self.minimum, self.maximum)
        }
    }
}
