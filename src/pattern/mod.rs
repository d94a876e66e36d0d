// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Behavior pattern language: parsing, compilation and matching.
//!
//! A pattern names an ordered chain of steps over timestamped behaviors:
//!
//! ```text
//! view[2+] -> (add_to_cart | wishlist){s:600} -> purchase => Converted
//! ```
//!
//! # Pattern Syntax
//!
//! ```text
//! name            Match an event whose behavior is `name`
//! a & b           Both a and b must be satisfied (binds tighter than |)
//! a | b           Either a or b
//! ( ... )         Grouping
//! x[n]            x must occur exactly n times (also [nx], [xn])
//! x[n:m]          Between n and m times; [n:] at least n, [:m] at most m
//! x[+] x[n+]      At least 1 / n times
//! x[-] x[n-]      At most 1 / n times
//! x[?] x[*] x[!]  0..=1 times, any number of times, never
//! x{s n:m}        x must complete within n..=m seconds of the step's
//!                 timing baseline; {s n} means {s 0:n}
//! a -> b          b follows a
//! ... => Name     Names the pattern (required, exactly once)
//! \c              c loses its special meaning
//! ```
//!
//! Unmodified leaves default to exactly one occurrence within one second
//! (see [`compiler::CompileOptions`]). The `^` operator is reserved.
//!
//! # Pipeline
//!
//! [`lexer`] → [`token`] → [`compiler`] → [`element`] / [`step`] →
//! [`matcher::Pattern`]. Every error surfaces at parse time as a
//! [`error::PatternError`]; evaluation never fails.

pub mod compiler;
pub mod element;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod outcome;
pub mod step;
pub mod token;
