// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! FFI bindings for registering the behavior pattern aggregates with `DuckDB`.
//!
//! `DuckDB` has no high-level Rust API for aggregate functions, so the raw
//! `libduckdb-sys` bindings register each one with the `state_size`, `init`,
//! `update`, `combine` and `finalize` callbacks plus a destructor. The
//! callbacks delegate to [`crate::behavior_pattern::BehaviorPatternState`].

pub mod behavior_pattern;

/// Registers every aggregate using a raw `duckdb_connection` handle.
///
/// Called from the C entry point in `lib.rs`, which opens the connection via
/// `duckdb_connect` and disconnects afterwards.
pub fn register_all_raw(raw_con: libduckdb_sys::duckdb_connection) {
    // Safety: raw_con comes from duckdb_connect in behavior_pattern_init_internal
    // and stays open until registration returns.
    unsafe {
        behavior_pattern::register_behavior_pattern_match(raw_con);
        behavior_pattern::register_behavior_pattern_count(raw_con);
        behavior_pattern::register_behavior_pattern_events(raw_con);
    }
}
