// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! A group of patterns sharing one behavior registry.
//!
//! Patterns and the events evaluated against them must intern behavior names
//! in the same [`BehaviorRegistry`]. [`PatternSet`] owns that registry, so
//! callers working with names never handle ids directly.
//!
//! ```
//! use behavior_pattern::PatternSet;
//!
//! let mut set = PatternSet::new();
//! set.add("login -> purchase => Buyer").unwrap();
//! set.add("login -> logout => Bounce").unwrap();
//!
//! let results = set.evaluate_named(&["login", "purchase"], &[0.0, 0.4]);
//! assert_eq!(results, vec![vec![vec![0, 1]], vec![]]);
//! ```

use crate::common::behavior::BehaviorRegistry;
use crate::common::event::{events_from_names, Event};
use crate::pattern::compiler::CompileOptions;
use crate::pattern::error::PatternError;
use crate::pattern::matcher::{evaluate_all, Pattern};

/// Patterns compiled against a registry they share.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    registry: BehaviorRegistry,
    patterns: Vec<Pattern>,
    options: CompileOptions,
}

impl PatternSet {
    /// Creates an empty set with default compile options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set whose patterns compile with `options`.
    #[must_use]
    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Parses and appends one pattern, returning its position in the set.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the text is malformed. The set is left
    /// unchanged apart from any behavior names interned before the failure.
    pub fn add(&mut self, text: &str) -> Result<usize, PatternError> {
        let pattern = Pattern::parse_with(text, &mut self.registry, &self.options)?;
        self.patterns.push(pattern);
        Ok(self.patterns.len() - 1)
    }

    /// Parses every text, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first [`PatternError`]. Patterns parsed before it stay in
    /// the set.
    pub fn parse_all<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<(), PatternError> {
        for text in texts {
            self.add(text.as_ref())?;
        }
        Ok(())
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern has been added.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compiled patterns, in insertion order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// The shared registry.
    pub const fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    /// Compile options used by [`add`](Self::add).
    pub const fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Creates an event whose behavior is interned in this set's registry.
    pub fn event(&mut self, name: &str, time: f64) -> Event {
        Event::named(&mut self.registry, name, time)
    }

    /// Evaluates every pattern against `events`, one result per pattern.
    pub fn evaluate(&mut self, events: &[Event]) -> Vec<Vec<Vec<usize>>> {
        evaluate_all(&mut self.patterns, events)
    }

    /// Builds events from parallel name/time arrays and evaluates every
    /// pattern against them.
    pub fn evaluate_named<S: AsRef<str>>(
        &mut self,
        names: &[S],
        times: &[f64],
    ) -> Vec<Vec<Vec<usize>>> {
        let events = events_from_names(&mut self.registry, names, times);
        self.evaluate(&events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::range::Range;
    use crate::pattern::error::ErrorKind;

    #[test]
    fn test_empty_set() {
        let mut set = PatternSet::new();
        assert!(set.is_empty());
        assert!(set.evaluate_named(&["A"], &[0.0]).is_empty());
    }

    #[test]
    fn test_add_returns_positions() {
        let mut set = PatternSet::new();
        assert_eq!(set.add("A => First").unwrap(), 0);
        assert_eq!(set.add("B => Second").unwrap(), 1);
        assert_eq!(set.len(), 2);
        assert_eq!(set.patterns()[1].name(), "Second");
    }

    #[test]
    fn test_add_error_leaves_patterns_unchanged() {
        let mut set = PatternSet::new();
        set.add("A => Ok").unwrap();
        let err = set.add("A -> B").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingResult);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parse_all_stops_at_first_error() {
        let mut set = PatternSet::new();
        let err = set
            .parse_all(&["A => One", "(B => Two", "C => Three"])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnbalancedGroup);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_events_share_registry_with_patterns() {
        let mut set = PatternSet::new();
        set.add("A -> B => Seq").unwrap();
        let events = vec![set.event("A", 0.0), set.event("B", 0.5)];
        assert_eq!(set.evaluate(&events), vec![vec![vec![0, 1]]]);
        assert_eq!(set.registry().len(), 2);
    }

    #[test]
    fn test_with_options() {
        let options = CompileOptions {
            default_timing: Range::at_most(100.0).unwrap(),
            ..CompileOptions::default()
        };
        let mut set = PatternSet::with_options(options);
        set.add("A -> B => Slow").unwrap();
        assert_eq!(set.options(), &options);
        assert_eq!(
            set.evaluate_named(&["A", "B"], &[0.0, 50.0]),
            vec![vec![vec![0, 1]]]
        );
    }

    #[test]
    fn test_results_follow_pattern_order() {
        let mut set = PatternSet::new();
        set.parse_all(&["A | B => Either", "A & B => Both", "C => Never"])
            .unwrap();
        let results = set.evaluate_named(&["A", "B"], &[0.0, 0.5]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], vec![vec![0, 1]]);
        assert_eq!(results[1], vec![vec![0, 1]]);
        assert!(results[2].is_empty());
    }
}
