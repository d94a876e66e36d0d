// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! One `->`-separated stage of a pattern.
//!
//! A [`Step`] drives its [`Expression`] forward through the event slice from
//! a start position. It remembers the last position where the expression
//! made occurrence progress (the rollback anchor). On failure, and on
//! success of any step but the last, scanning resumes just past that anchor.
//!
//! A satisfied step hands two times to the next one: the baseline (the
//! time of its last contributing event) and a deadline (its own baseline
//! plus the widest window in its expression). Windows in the next step
//! reach at least as far as that deadline, so `A{s:2} -> B` accepts a `B`
//! up to two seconds after the `A`.

use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;

use crate::common::event::Event;
use crate::pattern::element::Expression;
use crate::pattern::outcome::Outcome;

/// State shared by every step of one match attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attempt {
    /// Time (seconds) that timing windows are measured from. Unset until the
    /// attempt's first matching event.
    pub baseline: Option<f64>,
    /// Latest time (seconds) the previous step's window allows. Timing
    /// windows in the current step never expire before it.
    pub deadline: Option<f64>,
    /// Event indices accumulated by the steps satisfied so far.
    pub indices: BTreeSet<usize>,
}

/// How a step scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The step's expression was satisfied. Scanning continues at `resume_at`.
    Satisfied {
        /// Where the next scan starts.
        resume_at: usize,
    },
    /// The step could not be satisfied. The attempt restarts at `resume_at`.
    Failed {
        /// Where the next attempt starts.
        resume_at: usize,
    },
}

/// A compiled step: one expression plus its scan logic.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    expression: Expression,
}

impl Step {
    /// Wraps a compiled expression.
    pub const fn new(expression: Expression) -> Self {
        Self { expression }
    }

    /// The compiled expression.
    pub const fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Forgets all progress.
    pub fn reset(&mut self) {
        self.expression.reset();
    }

    /// Scans `events[start..]` until the expression completes, fails, or the
    /// slice runs out.
    ///
    /// On success the satisfied indices are added to `attempt.indices`, the
    /// deadline moves to the end of this step's window and the baseline
    /// moves to the time of the last event that advanced this step.
    /// Reaching the end of the slice counts as success when the final
    /// outcome was an acceptable stopping point.
    pub fn scan(
        &mut self,
        events: &[Event],
        start: usize,
        attempt: &mut Attempt,
        is_last: bool,
    ) -> StepResult {
        let mut anchor = start;
        let mut progressed = false;
        let mut last = Outcome::Invalid;

        for (index, event) in events.iter().enumerate().skip(start) {
            last = self.expression.evaluate(index, event, attempt);
            trace!(index, outcome = ?last, "step evaluated event");
            if last.is_failure() {
                trace!(start, anchor, "step failed");
                return StepResult::Failed {
                    resume_at: anchor + 1,
                };
            }
            if last.is_stepped() {
                anchor = index;
                progressed = true;
            } else if last == Outcome::Completed {
                if progressed {
                    self.hand_over(events[anchor].time, attempt);
                }
                let resume_at = if is_last { index } else { anchor + 1 };
                return StepResult::Satisfied { resume_at };
            }
        }

        if !last.is_acceptable() {
            trace!(start, anchor, outcome = ?last, "step ran out of events");
            return StepResult::Failed {
                resume_at: anchor + 1,
            };
        }
        attempt.indices.extend(self.expression.indices());
        if progressed {
            self.hand_over(events[anchor].time, attempt);
        }
        let resume_at = if is_last { events.len() } else { anchor + 1 };
        StepResult::Satisfied { resume_at }
    }

    /// Moves the attempt's timing state on to the next step.
    fn hand_over(&self, anchor_time: f64, attempt: &mut Attempt) {
        if let (Some(baseline), Some(ceiling)) =
            (attempt.baseline, self.expression.timing_ceiling())
        {
            attempt.deadline = Some(baseline + ceiling);
        }
        attempt.baseline = Some(anchor_time);
        trace!(baseline = anchor_time, deadline = ?attempt.deadline, "step handed over");
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expression, f)
    }
}
