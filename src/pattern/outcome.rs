// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! The ranked result of feeding one event to an expression node.
//!
//! Outcomes form a total order from best ([`Outcome::Completed`]) to worst
//! ([`Outcome::Invalid`]). The order is defined once, by a private rank,
//! and drives how conditionals combine their children:
//!
//! - `&` keeps the worse of the two outcomes, because both sides must
//!   eventually succeed.
//! - `|` keeps the better of the two, because either side is enough.

use std::cmp::Ordering;

/// Result of evaluating one event against one expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Occurrence and timing constraints are fully satisfied. The node's
    /// matched indices have been handed to the match being built.
    Completed,
    /// This event matched and the occurrence count is already acceptable.
    /// The node may still extend.
    SteppedAndTechnicallyComplete,
    /// The occurrence count is acceptable although this event did not match.
    /// A valid stopping point.
    TechnicallyComplete,
    /// This event matched but the occurrence count is still below its minimum.
    Stepped,
    /// This event is irrelevant to the node.
    Skipped,
    /// Less time than the timing window's minimum has elapsed.
    BeforeTime,
    /// The occurrence count is below its minimum and this event did not match.
    NotEnoughOccurrences,
    /// The occurrence or timing ceiling was exceeded without completing. The
    /// node's matched indices were discarded.
    Canceled,
    /// Nothing has matched and no timing baseline exists: the attempt fails.
    Invalid,
}

impl Outcome {
    /// Every outcome, best first.
    pub const ALL: [Self; 9] = [
        Self::Completed,
        Self::SteppedAndTechnicallyComplete,
        Self::TechnicallyComplete,
        Self::Stepped,
        Self::Skipped,
        Self::BeforeTime,
        Self::NotEnoughOccurrences,
        Self::Canceled,
        Self::Invalid,
    ];

    /// Position in the lattice, 0 (best) through 8 (worst).
    const fn rank(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::SteppedAndTechnicallyComplete => 1,
            Self::TechnicallyComplete => 2,
            Self::Stepped => 3,
            Self::Skipped => 4,
            Self::BeforeTime => 5,
            Self::NotEnoughOccurrences => 6,
            Self::Canceled => 7,
            Self::Invalid => 8,
        }
    }

    /// Combines the outcomes of the two sides of an `&`: the worse one wins.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.max(other)
    }

    /// Combines the outcomes of the two sides of an `|`: the better one wins.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.min(other)
    }

    /// Returns true if this event advanced the node's occurrence count.
    pub const fn is_stepped(self) -> bool {
        matches!(self, Self::Stepped | Self::SteppedAndTechnicallyComplete)
    }

    /// Returns true for outcomes that are a valid place to stop scanning:
    /// [`Completed`](Self::Completed),
    /// [`SteppedAndTechnicallyComplete`](Self::SteppedAndTechnicallyComplete)
    /// and [`TechnicallyComplete`](Self::TechnicallyComplete).
    pub const fn is_acceptable(self) -> bool {
        self.rank() <= Self::TechnicallyComplete.rank()
    }

    /// Returns true for outcomes that end the current step attempt.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Canceled | Self::Invalid)
    }
}

/// Orders outcomes from best (least) to worst (greatest).
impl Ord for Outcome {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Outcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
