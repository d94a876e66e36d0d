// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Timestamped behavior events.
//!
//! The matcher consumes a materialized slice of [`Event`]s. Each event pairs
//! an interned [`BehaviorId`] with a timestamp in seconds. The slice is
//! expected in ascending time order; this is assumed, not enforced.
//!
//! `Event` is 16 bytes with `Copy` semantics, so scanning never allocates
//! per event.

use crate::common::behavior::{BehaviorId, BehaviorRegistry};

/// One timestamped occurrence of a behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Interned behavior this event represents.
    pub behavior: BehaviorId,
    /// Timestamp in seconds. Only differences between timestamps matter.
    pub time: f64,
}

impl Event {
    /// Creates an event for an already-interned behavior.
    #[must_use]
    pub const fn new(behavior: BehaviorId, time: f64) -> Self {
        Self { behavior, time }
    }

    /// Interns `name` in `registry` and creates the event.
    pub fn named(registry: &mut BehaviorRegistry, name: &str, time: f64) -> Self {
        Self::new(registry.intern(name), time)
    }
}

/// Builds events from parallel arrays of behavior names and timestamps.
///
/// Pairs up `names[i]` with `times[i]`. If the arrays differ in length the
/// extra tail of the longer one is ignored.
///
/// # Examples
///
/// ```
/// use behavior_pattern::common::behavior::BehaviorRegistry;
/// use behavior_pattern::common::event::events_from_names;
///
/// let mut registry = BehaviorRegistry::new();
/// let events = events_from_names(&mut registry, &["A", "B", "A"], &[0.0, 0.5]);
/// assert_eq!(events.len(), 2);
/// assert_eq!(events[0].behavior, registry.intern("A"));
/// ```
pub fn events_from_names<S: AsRef<str>>(
    registry: &mut BehaviorRegistry,
    names: &[S],
    times: &[f64],
) -> Vec<Event> {
    names
        .iter()
        .zip(times)
        .map(|(name, &time)| Event::named(registry, name.as_ref(), time))
        .collect()
}
