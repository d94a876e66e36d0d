// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! # `behavior_pattern`: Behavior Pattern Matching for `DuckDB`
//!
//! A small pattern language over timestamped behaviors, usable as a Rust
//! library and as a `DuckDB` loadable extension.
//!
//! ## Functions
//!
//! | Function | Type | Description |
//! |----------|------|-------------|
//! | `behavior_pattern_match(pattern, ts, behavior)` | Aggregate | True if the pattern matches |
//! | `behavior_pattern_count(pattern, ts, behavior)` | Aggregate | Number of non-overlapping matches |
//! | `behavior_pattern_events(pattern, ts, behavior)` | Aggregate | Timestamps of the first match |
//!
//! An invalid pattern yields NULL from `match` and `count` and an empty list
//! from `events`.
//!
//! ## Library Usage
//!
//! ```
//! use behavior_pattern::{BehaviorRegistry, Pattern};
//!
//! let mut registry = BehaviorRegistry::new();
//! let mut pattern = Pattern::parse("view[2] -> buy{s:60} => Buyer", &mut registry).unwrap();
//! let matches = pattern.evaluate_named(
//!     &mut registry,
//!     &["view", "view", "buy"],
//!     &[0.0, 0.5, 30.0],
//! );
//! assert_eq!(matches, vec![vec![0, 1, 2]]);
//! ```
//!
//! ## Installation
//!
//! ```sql
//! LOAD 'behavior_pattern.duckdb_extension';
//! ```

pub mod behavior_pattern;
pub mod common;
pub mod pattern;
pub mod pattern_set;

mod ffi;

pub use common::behavior::{BehaviorId, BehaviorRegistry};
pub use common::event::Event;
pub use common::range::Range;
pub use pattern::compiler::CompileOptions;
pub use pattern::error::{ErrorKind, PatternError};
pub use pattern::matcher::Pattern;
pub use pattern_set::PatternSet;

/// Extension entry point called by `DuckDB` when the extension is loaded.
///
/// Registers every function over a raw `duckdb_connection` obtained through
/// the C API, then disconnects.
///
/// # Safety
///
/// Called by `DuckDB`'s extension loading mechanism via FFI.
/// `info` and `access` must be valid pointers provided by `DuckDB`.
#[no_mangle]
pub unsafe extern "C" fn behavior_pattern_init_c_api(
    info: libduckdb_sys::duckdb_extension_info,
    access: *const libduckdb_sys::duckdb_extension_access,
) -> bool {
    match behavior_pattern_init_internal(info, access) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "behavior_pattern: extension init failed");
            let Some(set_error) = (*access).set_error else {
                return false;
            };
            if let Ok(err) = std::ffi::CString::new(e.to_string()) {
                set_error(info, err.as_ptr());
            } else {
                let fallback = c"Extension init failed and could not allocate error string";
                set_error(info, fallback.as_ptr());
            }
            false
        }
    }
}

unsafe fn behavior_pattern_init_internal(
    info: libduckdb_sys::duckdb_extension_info,
    access: *const libduckdb_sys::duckdb_extension_access,
) -> Result<bool, Box<dyn std::error::Error>> {
    // "v1.2.0" is the minimum C API version the callbacks rely on.
    let have_api = libduckdb_sys::duckdb_rs_extension_api_init(info, access, "v1.2.0")
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    if !have_api {
        return Ok(false);
    }

    let get_database = (*access)
        .get_database
        .ok_or("extension access provides no get_database")?;
    let db: libduckdb_sys::duckdb_database = *get_database(info);

    let mut raw_con: libduckdb_sys::duckdb_connection = std::ptr::null_mut();
    let rc = libduckdb_sys::duckdb_connect(db, &mut raw_con);
    if rc != libduckdb_sys::DuckDBSuccess {
        return Err("Failed to open DuckDB connection for extension registration".into());
    }

    ffi::register_all_raw(raw_con);

    libduckdb_sys::duckdb_disconnect(&mut raw_con);

    Ok(true)
}
