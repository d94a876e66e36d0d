// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! `behavior_pattern_match`, `behavior_pattern_count` and
//! `behavior_pattern_events`: behavior patterns as SQL aggregates.
//!
//! Each group collects `(timestamp, behavior)` rows, then evaluates the
//! pattern once at finalize.
//!
//! # SQL Usage
//!
//! ```sql
//! -- Did the user add to cart within 10 minutes of viewing twice?
//! SELECT user_id,
//!   behavior_pattern_match(
//!     'view[2] -> add_to_cart{s:600} => Engaged', event_time, event_type
//!   ) AS engaged
//! FROM events
//! GROUP BY user_id
//!
//! -- How many separate sessions of the pattern occurred?
//! SELECT user_id,
//!   behavior_pattern_count('login -> purchase => Buyer', event_time, event_type)
//! FROM events
//! GROUP BY user_id
//! ```

use crate::common::behavior::{BehaviorId, BehaviorRegistry};
use crate::common::event::Event;
use crate::common::timestamp::micros_to_seconds;
use crate::pattern::error::PatternError;
use crate::pattern::matcher::Pattern;

/// One collected row: a `DuckDB` timestamp and the interned behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedBehavior {
    /// Microseconds since the Unix epoch.
    pub timestamp_us: i64,
    /// Behavior interned in the owning state's registry.
    pub behavior: BehaviorId,
}

/// State shared by the three behavior pattern aggregates.
///
/// Rows are collected during `update`, merged during `combine`, and matched
/// during `finalize`. The pattern is compiled lazily and cached.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct BehaviorPatternState {
    /// Collected rows. Sorted by timestamp in finalize.
    pub events: Vec<TimedBehavior>,
    /// Pattern text (taken from the first row that carries one).
    pub pattern_str: Option<String>,
    registry: BehaviorRegistry,
    compiled_pattern: Option<Pattern>,
}

impl BehaviorPatternState {
    /// Creates a new empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pattern text. Only the first call has any effect.
    pub fn set_pattern(&mut self, pattern: &str) {
        if self.pattern_str.is_none() {
            self.pattern_str = Some(pattern.to_string());
        }
    }

    /// Records one row.
    pub fn update(&mut self, timestamp_us: i64, behavior: &str) {
        let behavior = self.registry.intern(behavior);
        self.events.push(TimedBehavior {
            timestamp_us,
            behavior,
        });
    }

    /// Registry the collected behaviors are interned in.
    pub const fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Combines two states into a new one.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut combined = self.clone();
        combined.combine_in_place(other);
        combined
    }

    /// Merges `other` into `self` in place.
    ///
    /// `other`'s behaviors are re-interned into `self`'s registry, so the two
    /// states may have been built independently. The registry is append-only,
    /// so a pattern already compiled against it stays valid.
    pub fn combine_in_place(&mut self, other: &Self) {
        self.events.reserve(other.events.len());
        for event in &other.events {
            if let Some(name) = other.registry.name(event.behavior) {
                let behavior = self.registry.intern(name);
                self.events.push(TimedBehavior {
                    timestamp_us: event.timestamp_us,
                    behavior,
                });
            }
        }
        if self.pattern_str.is_none() {
            self.pattern_str.clone_from(&other.pattern_str);
            self.compiled_pattern = None;
        }
    }

    /// Sorts the rows, compiles the pattern if needed and evaluates it.
    fn execute(&mut self) -> Result<Vec<Vec<usize>>, PatternError> {
        if !self
            .events
            .windows(2)
            .all(|w| w[0].timestamp_us <= w[1].timestamp_us)
        {
            self.events.sort_by_key(|e| e.timestamp_us);
        }

        let mut pattern = match self.compiled_pattern.take() {
            Some(pattern) => pattern,
            None => Pattern::parse(
                self.pattern_str.as_deref().unwrap_or(""),
                &mut self.registry,
            )?,
        };
        let events: Vec<Event> = self
            .events
            .iter()
            .map(|e| Event::new(e.behavior, micros_to_seconds(e.timestamp_us)))
            .collect();
        let matches = pattern.evaluate(&events);
        self.compiled_pattern = Some(pattern);
        Ok(matches)
    }

    /// `behavior_pattern_match`: true if the pattern matches at least once.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern text is invalid.
    pub fn finalize_match(&mut self) -> Result<bool, PatternError> {
        Ok(!self.execute()?.is_empty())
    }

    /// `behavior_pattern_count`: number of non-overlapping matches.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern text is invalid.
    pub fn finalize_count(&mut self) -> Result<i64, PatternError> {
        Ok(self.execute()?.len() as i64)
    }

    /// `behavior_pattern_events`: timestamps of the rows in the first match,
    /// in ascending order. Empty if there is no match.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern text is invalid.
    pub fn finalize_events(&mut self) -> Result<Vec<i64>, PatternError> {
        let matches = self.execute()?;
        Ok(matches.first().map_or_else(Vec::new, |indices| {
            indices
                .iter()
                .map(|&i| self.events[i].timestamp_us)
                .collect()
        }))
    }
}
