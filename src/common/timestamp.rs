// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Timestamp normalization between `DuckDB` and the matcher.
//!
//! `DuckDB` stores timestamps internally as `i64` microseconds since Unix epoch.
//! Pattern timing windows (`{s...}`) are written in seconds, so the matcher
//! works on `f64` seconds. Conversion happens once per event when a group is
//! finalized.

/// Microseconds per second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Converts `DuckDB` microseconds into matcher seconds.
///
/// Whole seconds and the sub-second remainder are converted separately so
/// timestamps near the epoch keep full microsecond precision.
#[must_use]
#[inline]
pub fn micros_to_seconds(micros: i64) -> f64 {
    let whole = micros / MICROS_PER_SECOND;
    let frac = micros % MICROS_PER_SECOND;
    whole as f64 + frac as f64 / MICROS_PER_SECOND as f64
}
