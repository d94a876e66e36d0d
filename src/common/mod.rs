// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Types shared by the pattern compiler, the matcher, and the SQL aggregates.

pub mod behavior;
pub mod event;
pub mod range;
pub mod timestamp;
