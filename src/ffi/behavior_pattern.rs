// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! FFI registration for the `behavior_pattern_*` aggregate functions.
//!
//! All three functions take `(VARCHAR pattern, TIMESTAMP ts, VARCHAR behavior)`
//! and share one state layout along with update, combine and destroy. Only
//! the return type and finalize differ.

use crate::behavior_pattern::BehaviorPatternState;
use libduckdb_sys::*;
use std::ffi::CString;

type FinalizeFn = unsafe extern "C" fn(
    duckdb_function_info,
    *mut duckdb_aggregate_state,
    duckdb_vector,
    idx_t,
    idx_t,
);

/// Registers one `behavior_pattern_*` aggregate with the given return type.
///
/// Takes ownership of `ret_type` and destroys it.
///
/// # Safety
///
/// Requires a valid `duckdb_connection` handle and a valid logical type.
unsafe fn register_behavior_pattern_function(
    con: duckdb_connection,
    func_name: &str,
    ret_type: duckdb_logical_type,
    finalize_fn: FinalizeFn,
) {
    unsafe {
        let Ok(name) = CString::new(func_name) else {
            tracing::warn!(function = func_name, "function name contains a NUL byte");
            duckdb_destroy_logical_type(&mut { ret_type });
            return;
        };
        let func = duckdb_create_aggregate_function();
        duckdb_aggregate_function_set_name(func, name.as_ptr());

        // Parameter 0: VARCHAR (pattern)
        let varchar_type = duckdb_create_logical_type(DUCKDB_TYPE_DUCKDB_TYPE_VARCHAR);
        duckdb_aggregate_function_add_parameter(func, varchar_type);

        // Parameter 1: TIMESTAMP
        let ts_type = duckdb_create_logical_type(DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP);
        duckdb_aggregate_function_add_parameter(func, ts_type);
        duckdb_destroy_logical_type(&mut { ts_type });

        // Parameter 2: VARCHAR (behavior)
        duckdb_aggregate_function_add_parameter(func, varchar_type);
        duckdb_destroy_logical_type(&mut { varchar_type });

        duckdb_aggregate_function_set_return_type(func, ret_type);
        duckdb_destroy_logical_type(&mut { ret_type });

        duckdb_aggregate_function_set_functions(
            func,
            Some(state_size),
            Some(state_init),
            Some(state_update),
            Some(state_combine),
            Some(finalize_fn),
        );
        duckdb_aggregate_function_set_destructor(func, Some(state_destroy));

        let result = duckdb_register_aggregate_function(con, func);
        if result == DuckDBSuccess {
            tracing::debug!(function = func_name, "registered aggregate");
        } else {
            tracing::warn!(function = func_name, "failed to register aggregate");
        }

        duckdb_destroy_aggregate_function(&mut { func });
    }
}

/// Registers `behavior_pattern_match(VARCHAR, TIMESTAMP, VARCHAR) -> BOOLEAN`.
///
/// # Safety
///
/// Requires a valid `duckdb_connection` handle.
pub unsafe fn register_behavior_pattern_match(con: duckdb_connection) {
    unsafe {
        register_behavior_pattern_function(
            con,
            "behavior_pattern_match",
            duckdb_create_logical_type(DUCKDB_TYPE_DUCKDB_TYPE_BOOLEAN),
            match_state_finalize,
        );
    }
}

/// Registers `behavior_pattern_count(VARCHAR, TIMESTAMP, VARCHAR) -> BIGINT`.
///
/// # Safety
///
/// Requires a valid `duckdb_connection` handle.
pub unsafe fn register_behavior_pattern_count(con: duckdb_connection) {
    unsafe {
        register_behavior_pattern_function(
            con,
            "behavior_pattern_count",
            duckdb_create_logical_type(DUCKDB_TYPE_DUCKDB_TYPE_BIGINT),
            count_state_finalize,
        );
    }
}

/// Registers `behavior_pattern_events(VARCHAR, TIMESTAMP, VARCHAR) -> LIST(TIMESTAMP)`.
///
/// # Safety
///
/// Requires a valid `duckdb_connection` handle.
pub unsafe fn register_behavior_pattern_events(con: duckdb_connection) {
    unsafe {
        let inner_type = duckdb_create_logical_type(DUCKDB_TYPE_DUCKDB_TYPE_TIMESTAMP);
        let list_type = duckdb_create_list_type(inner_type);
        duckdb_destroy_logical_type(&mut { inner_type });
        register_behavior_pattern_function(
            con,
            "behavior_pattern_events",
            list_type,
            events_state_finalize,
        );
    }
}

#[repr(C)]
struct FfiState {
    inner: *mut BehaviorPatternState,
}

/// Reads row `row` of a VARCHAR vector, or `None` if it is NULL or not UTF-8.
///
/// # Safety
///
/// `vec` must be a valid VARCHAR vector with more than `row` rows. The returned
/// slice borrows the vector's data and must not outlive the data chunk.
unsafe fn read_varchar<'a>(vec: duckdb_vector, row: usize) -> Option<&'a str> {
    unsafe {
        let validity = duckdb_vector_get_validity(vec);
        if !validity.is_null() && !duckdb_validity_row_is_valid(validity, row as idx_t) {
            return None;
        }
        let raw = duckdb_vector_get_data(vec);
        if raw.is_null() {
            return None;
        }
        let str_struct =
            raw.add(row * std::mem::size_of::<duckdb_string_t>()) as *const duckdb_string_t;
        let str_ptr = duckdb_string_t_data(str_struct.cast_mut());
        if str_ptr.is_null() {
            return None;
        }
        let len = duckdb_string_t_length(*str_struct);
        let bytes = std::slice::from_raw_parts(str_ptr as *const u8, len as usize);
        std::str::from_utf8(bytes).ok()
    }
}

// SAFETY: Pure computation returning byte size of FfiState.
unsafe extern "C" fn state_size(_info: duckdb_function_info) -> idx_t {
    std::mem::size_of::<FfiState>() as idx_t
}

// SAFETY: `state` is a DuckDB-allocated buffer of at least `state_size()` bytes.
unsafe extern "C" fn state_init(_info: duckdb_function_info, state: duckdb_aggregate_state) {
    unsafe {
        let ffi_state = &mut *(state as *mut FfiState);
        ffi_state.inner = Box::into_raw(Box::new(BehaviorPatternState::new()));
    }
}

// SAFETY: `input` is a valid DuckDB data chunk with columns (VARCHAR, TIMESTAMP,
// VARCHAR) as registered. `states` points to `row_count` aggregate state pointers.
// Rows with a NULL timestamp or behavior are skipped.
unsafe extern "C" fn state_update(
    _info: duckdb_function_info,
    input: duckdb_data_chunk,
    states: *mut duckdb_aggregate_state,
) {
    unsafe {
        let row_count = duckdb_data_chunk_get_size(input) as usize;

        let pattern_vec = duckdb_data_chunk_get_vector(input, 0);

        let ts_vec = duckdb_data_chunk_get_vector(input, 1);
        let ts_data = duckdb_vector_get_data(ts_vec) as *const i64;
        let ts_validity = duckdb_vector_get_validity(ts_vec);

        let behavior_vec = duckdb_data_chunk_get_vector(input, 2);

        for i in 0..row_count {
            let state_ptr = *states.add(i);
            let ffi_state = &mut *(state_ptr as *mut FfiState);
            if ffi_state.inner.is_null() {
                continue;
            }
            let state = &mut *ffi_state.inner;

            if state.pattern_str.is_none() {
                if let Some(pattern) = read_varchar(pattern_vec, i) {
                    state.set_pattern(pattern);
                }
            }

            if !ts_validity.is_null() && !duckdb_validity_row_is_valid(ts_validity, i as idx_t) {
                continue;
            }
            let Some(behavior) = read_varchar(behavior_vec, i) else {
                continue;
            };

            state.update(*ts_data.add(i), behavior);
        }
    }
}

// SAFETY: `source` and `target` point to `count` aggregate state pointers.
unsafe extern "C" fn state_combine(
    _info: duckdb_function_info,
    source: *mut duckdb_aggregate_state,
    target: *mut duckdb_aggregate_state,
    count: idx_t,
) {
    unsafe {
        for i in 0..count as usize {
            let src_ptr = *source.add(i);
            let tgt_ptr = *target.add(i);
            let src_ffi = &*(src_ptr as *const FfiState);
            let tgt_ffi = &mut *(tgt_ptr as *mut FfiState);

            if src_ffi.inner.is_null() || tgt_ffi.inner.is_null() {
                continue;
            }

            (*tgt_ffi.inner).combine_in_place(&*src_ffi.inner);
        }
    }
}

// SAFETY: `source` points to `count` aggregate state pointers. `result` is a
// valid DuckDB BOOLEAN vector. Pattern errors produce NULL output.
unsafe extern "C" fn match_state_finalize(
    _info: duckdb_function_info,
    source: *mut duckdb_aggregate_state,
    result: duckdb_vector,
    count: idx_t,
    offset: idx_t,
) {
    unsafe {
        duckdb_vector_ensure_validity_writable(result);
        let data = duckdb_vector_get_data(result) as *mut bool;
        let validity = duckdb_vector_get_validity(result);

        for i in 0..count as usize {
            let state_ptr = *source.add(i);
            let ffi_state = &mut *(state_ptr as *mut FfiState);
            let idx = offset as usize + i;

            if ffi_state.inner.is_null() {
                duckdb_validity_set_row_invalid(validity, idx as idx_t);
                continue;
            }
            match (*ffi_state.inner).finalize_match() {
                Ok(matched) => *data.add(idx) = matched,
                Err(e) => {
                    tracing::debug!(error = %e, "behavior_pattern_match: invalid pattern");
                    duckdb_validity_set_row_invalid(validity, idx as idx_t);
                }
            }
        }
    }
}

// SAFETY: `source` points to `count` aggregate state pointers. `result` is a
// valid DuckDB BIGINT vector. Pattern errors produce NULL output.
unsafe extern "C" fn count_state_finalize(
    _info: duckdb_function_info,
    source: *mut duckdb_aggregate_state,
    result: duckdb_vector,
    count: idx_t,
    offset: idx_t,
) {
    unsafe {
        duckdb_vector_ensure_validity_writable(result);
        let data = duckdb_vector_get_data(result) as *mut i64;
        let validity = duckdb_vector_get_validity(result);

        for i in 0..count as usize {
            let state_ptr = *source.add(i);
            let ffi_state = &mut *(state_ptr as *mut FfiState);
            let idx = offset as usize + i;

            if ffi_state.inner.is_null() {
                duckdb_validity_set_row_invalid(validity, idx as idx_t);
                continue;
            }
            match (*ffi_state.inner).finalize_count() {
                Ok(n) => *data.add(idx) = n,
                Err(e) => {
                    tracing::debug!(error = %e, "behavior_pattern_count: invalid pattern");
                    duckdb_validity_set_row_invalid(validity, idx as idx_t);
                }
            }
        }
    }
}

// SAFETY: `source` points to `count` aggregate state pointers. `result` is a
// valid DuckDB LIST(TIMESTAMP) vector. Pattern errors and missing matches both
// produce an empty list.
unsafe extern "C" fn events_state_finalize(
    _info: duckdb_function_info,
    source: *mut duckdb_aggregate_state,
    result: duckdb_vector,
    count: idx_t,
    offset: idx_t,
) {
    unsafe {
        let list_child = duckdb_list_vector_get_child(result);
        let mut list_offset: idx_t = duckdb_list_vector_get_size(result);

        for i in 0..count as usize {
            let state_ptr = *source.add(i);
            let ffi_state = &mut *(state_ptr as *mut FfiState);
            let idx = offset as usize + i;

            let timestamps = if ffi_state.inner.is_null() {
                Vec::new()
            } else {
                (*ffi_state.inner).finalize_events().unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "behavior_pattern_events: invalid pattern");
                    Vec::new()
                })
            };
            let ts_count = timestamps.len() as idx_t;

            duckdb_list_vector_reserve(result, list_offset + ts_count);

            // reserve may reallocate the child buffer
            let child_data = duckdb_vector_get_data(list_child) as *mut i64;
            for (j, &ts) in timestamps.iter().enumerate() {
                *child_data.add(list_offset as usize + j) = ts;
            }

            let list_data = duckdb_vector_get_data(result) as *mut duckdb_list_entry;
            (*list_data.add(idx)).offset = list_offset;
            (*list_data.add(idx)).length = ts_count;

            list_offset += ts_count;
            duckdb_list_vector_set_size(result, list_offset);
        }
    }
}

// SAFETY: `state` points to `count` aggregate state pointers. Each inner pointer
// was allocated by `Box::into_raw` in `state_init`.
unsafe extern "C" fn state_destroy(state: *mut duckdb_aggregate_state, count: idx_t) {
    unsafe {
        for i in 0..count as usize {
            let state_ptr = *state.add(i);
            let ffi_state = &mut *(state_ptr as *mut FfiState);
            if !ffi_state.inner.is_null() {
                drop(Box::from_raw(ffi_state.inner));
                ffi_state.inner = std::ptr::null_mut();
            }
        }
    }
}
