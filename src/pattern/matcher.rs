// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Named, multi-step patterns and the scan that finds them.
//!
//! A [`Pattern`] is parsed from text of the form
//! `step -> step -> ... => name`. Matching walks the event slice left to
//! right. Each step scans forward from where the previous one left off,
//! carrying the attempt's timing baseline, deadline and matched indices. When the last
//! step is satisfied the accumulated indices are recorded as one match and
//! every step is reset; when any step fails the attempt is discarded. In
//! both cases the next attempt starts strictly after the previous attempt's
//! start, and after a match it also starts past the match's last index, so
//! matches never overlap and come out in ascending order. An attempt that
//! completes without any contributing index is not reported.

use std::fmt;

use tracing::debug;

use crate::common::behavior::BehaviorRegistry;
use crate::common::event::{events_from_names, Event};
use crate::pattern::compiler::{compile_step, CompileOptions};
use crate::pattern::error::{ErrorKind, PatternError};
use crate::pattern::lexer::{tokenize, Symbol, ESCAPE};
use crate::pattern::step::{Attempt, Step, StepResult};

/// A compiled, named pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    name: String,
    steps: Vec<Step>,
}

impl Pattern {
    /// Parses pattern text with the default [`CompileOptions`].
    ///
    /// Behavior names are interned into `registry`. Events evaluated against
    /// the pattern must use ids from the same registry.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the text is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use behavior_pattern::common::behavior::BehaviorRegistry;
    /// use behavior_pattern::pattern::matcher::Pattern;
    ///
    /// let mut registry = BehaviorRegistry::new();
    /// let mut pattern = Pattern::parse("A -> B => Seq", &mut registry).unwrap();
    /// assert_eq!(pattern.name(), "Seq");
    ///
    /// let matches = pattern.evaluate_named(&mut registry, &["A", "B"], &[0.0, 0.5]);
    /// assert_eq!(matches, vec![vec![0, 1]]);
    /// ```
    pub fn parse(text: &str, registry: &mut BehaviorRegistry) -> Result<Self, PatternError> {
        Self::parse_with(text, registry, &CompileOptions::default())
    }

    /// Parses pattern text with explicit compile options.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the text is malformed.
    pub fn parse_with(
        text: &str,
        registry: &mut BehaviorRegistry,
        options: &CompileOptions,
    ) -> Result<Self, PatternError> {
        let lexemes = tokenize(text);
        let results: Vec<usize> = lexemes
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is(Symbol::Result))
            .map(|(i, _)| i)
            .collect();
        let split = match results.as_slice() {
            [] => {
                return Err(PatternError::new(
                    ErrorKind::MissingResult,
                    "missing result operator '=>'",
                    text.len(),
                ));
            }
            [split] => *split,
            [_, second, ..] => {
                return Err(PatternError::new(
                    ErrorKind::DuplicateResult,
                    "more than one result operator '=>'",
                    lexemes[*second].position,
                ));
            }
        };

        let name_start = lexemes[split].position + Symbol::Result.to_string().len();
        let name = unescape(text[name_start..].trim());

        let body = &lexemes[..split];
        let separators = body
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is(Symbol::Then))
            .map(|(i, _)| i)
            .chain(std::iter::once(split));
        let mut steps = Vec::new();
        let mut start = 0;
        for end in separators {
            let segment = &body[start..end];
            if segment.is_empty() {
                return Err(PatternError::new(
                    ErrorKind::EmptyStep,
                    "empty step",
                    lexemes[end].position,
                ));
            }
            steps.push(compile_step(segment, registry, options)?);
            start = end + 1;
        }

        debug!(pattern = %name, steps = steps.len(), "compiled pattern");
        Ok(Self { name, steps })
    }

    /// Text after the `=>` operator, trimmed and unescaped.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled steps, in order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Forgets all progress in every step.
    pub fn reset(&mut self) {
        for step in &mut self.steps {
            step.reset();
        }
    }

    /// Finds every non-overlapping match in `events`.
    ///
    /// Each match is the ascending list of event indices that satisfied the
    /// pattern. Matches are returned in discovery order, which is also
    /// ascending order. `events` is expected sorted by time.
    ///
    /// The pattern is reset before scanning, so repeated calls on the same
    /// input give the same result.
    pub fn evaluate(&mut self, events: &[Event]) -> Vec<Vec<usize>> {
        let mut matches = Vec::new();
        if self.steps.is_empty() {
            return matches;
        }
        self.reset();

        let last_step = self.steps.len() - 1;
        let mut attempt = Attempt::default();
        let mut step_index = 0;
        let mut attempt_start = 0;
        let mut position = 0;

        while position < events.len() {
            let is_last = step_index == last_step;
            let result = self.steps[step_index].scan(events, position, &mut attempt, is_last);
            let resume_at = match result {
                StepResult::Satisfied { resume_at } if !is_last => {
                    step_index += 1;
                    position = resume_at;
                    continue;
                }
                StepResult::Satisfied { resume_at } => {
                    let indices = std::mem::take(&mut attempt.indices);
                    // the next attempt may not reuse any index of this match
                    let after_match = indices.last().map_or(resume_at, |&i| resume_at.max(i + 1));
                    if !indices.is_empty() {
                        debug!(pattern = %self.name, indices = ?indices, "recorded match");
                        matches.push(indices.into_iter().collect());
                    }
                    after_match
                }
                StepResult::Failed { resume_at } => resume_at,
            };

            self.reset();
            attempt = Attempt::default();
            step_index = 0;
            position = resume_at.max(attempt_start + 1);
            attempt_start = position;
        }
        matches
    }

    /// Builds events from parallel name/time arrays and evaluates them.
    ///
    /// `registry` must be the one the pattern was parsed with. If the
    /// arrays differ in length the longer one is truncated.
    pub fn evaluate_named<S: AsRef<str>>(
        &mut self,
        registry: &mut BehaviorRegistry,
        names: &[S],
        times: &[f64],
    ) -> Vec<Vec<usize>> {
        let events = events_from_names(registry, names, times);
        self.evaluate(&events)
    }
}

/// Evaluates every pattern against the same events.
///
/// The result holds one entry per pattern, in input order.
pub fn evaluate_all(patterns: &mut [Pattern], events: &[Event]) -> Vec<Vec<Vec<usize>>> {
    patterns.iter_mut().map(|p| p.evaluate(events)).collect()
}

/// Renders canonical pattern text that parses back to an equal pattern.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", Symbol::Then)?;
            }
            write!(f, "{step}")?;
        }
        write!(f, " {} ", Symbol::Result)?;
        let mut chars = self.name.chars().peekable();
        while let Some(c) = chars.next() {
            if c == ESCAPE || (c == '=' && chars.peek() == Some(&'>')) {
                write!(f, "{ESCAPE}")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == ESCAPE {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = String> {
        let names = prop::sample::select(vec!["A", "B", "C", "page view", r"x\|y", r"go\->on"]);
        let flags = prop::sample::select(vec![
            "", "", "[2]", "[1:3]", "[2+]", "[-]", "[?]", "[*]", "[!]", "[3x]", "{s:2}",
            "{s1:4}", "{s5}", "{s2:}", "[2]{s:3}", "{s3:3}",
        ]);
        (names, flags).prop_map(|(n, f)| format!("{n}{f}"))
    }

    fn expression() -> impl Strategy<Value = String> {
        leaf().prop_recursive(3, 12, 2, |inner| {
            let operator = prop::sample::select(vec!["&", "|"]);
            let suffix = prop::sample::select(vec!["", "", "[2]", "{s:3}", "[1:2]{s4}"]);
            (inner.clone(), operator, inner, suffix, any::<bool>()).prop_map(
                |(l, op, r, suffix, grouped)| {
                    if grouped {
                        format!("({l} {op} {r}){suffix}")
                    } else {
                        format!("{l} {op} {r}")
                    }
                },
            )
        })
    }

    fn pattern_text() -> impl Strategy<Value = String> {
        prop::collection::vec(expression(), 1..4).prop_map(|steps| {
            format!("{} => Generated", steps.join(" -> "))
        })
    }

    fn events() -> impl Strategy<Value = (Vec<&'static str>, Vec<f64>)> {
        prop::collection::vec((prop::sample::select(vec!["A", "B", "C"]), 0u32..30), 0..40)
            .prop_map(|items| {
                let mut time = 0.0;
                let mut names = Vec::with_capacity(items.len());
                let mut times = Vec::with_capacity(items.len());
                for (name, gap) in items {
                    time += f64::from(gap) / 10.0;
                    names.push(name);
                    times.push(time);
                }
                (names, times)
            })
    }

    fn patterns() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "A -> B => P",
            "A[2] -> B => P",
            "A{s:2} -> B | C => P",
            "A & B => P",
            "(A | B)[2] -> C[1:3] => P",
            "A[*] -> B{s:5} => P",
            "A[+] => P",
        ])
    }

    proptest! {
        #[test]
        fn render_reparse_round_trip(text in pattern_text()) {
            let mut registry = BehaviorRegistry::new();
            let pattern = Pattern::parse(&text, &mut registry).unwrap();
            let rendered = pattern.to_string();
            let reparsed = Pattern::parse(&rendered, &mut registry).unwrap();
            prop_assert_eq!(&pattern, &reparsed);
            prop_assert_eq!(rendered, reparsed.to_string());
        }

        #[test]
        fn timing_window_bounds_gap(window in 1u32..20, tenths in 1u32..250) {
            let mut registry = BehaviorRegistry::new();
            let text = format!("A{{s:{window}}} -> B => Window");
            let mut pattern = Pattern::parse(&text, &mut registry).unwrap();
            let gap = f64::from(tenths) / 10.0;
            let matches = pattern.evaluate_named(&mut registry, &["A", "B"], &[0.0, gap]);
            if tenths <= window * 10 {
                prop_assert_eq!(matches, vec![vec![0, 1]]);
            } else {
                prop_assert!(matches.is_empty());
            }
        }

        #[test]
        fn evaluation_is_deterministic(text in patterns(), (names, times) in events()) {
            let mut registry = BehaviorRegistry::new();
            let mut pattern = Pattern::parse(text, &mut registry).unwrap();
            let first = pattern.evaluate_named(&mut registry, &names, &times);
            let second = pattern.evaluate_named(&mut registry, &names, &times);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn matches_are_ascending_and_disjoint(text in patterns(), (names, times) in events()) {
            let mut registry = BehaviorRegistry::new();
            let mut pattern = Pattern::parse(text, &mut registry).unwrap();
            let matches = pattern.evaluate_named(&mut registry, &names, &times);
            for m in &matches {
                prop_assert!(!m.is_empty());
                prop_assert!(m.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(m.iter().all(|&i| i < names.len()));
            }
            for pair in matches.windows(2) {
                prop_assert!(pair[0][pair[0].len() - 1] < pair[1][0]);
            }
        }
    }
}
