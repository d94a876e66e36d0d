// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tom F. (https://github.com/tomtom215/duckdb-behavioral)

//! Arena-allocated expression tree for one step.
//!
//! Nodes live in a flat `Vec` owned by the [`Expression`] and refer to their
//! children by index. A node is either a behavior leaf or an `&`/`|`
//! conditional over two children. Every node carries:
//!
//! - an optional occurrence range, the number of distinct event indices it
//!   must accumulate,
//! - an optional timing window, the seconds allowed since the step's
//!   timing baseline,
//! - the set of event indices it has matched so far.
//!
//! Resetting is a single pass over the arena, and cloning an expression
//! yields an independent scanner.
//!
//! # Evaluation
//!
//! Feeding event `i` to a node runs three phases:
//!
//! 1. **Timing.** With a baseline and a window, elapsed time below the
//!    window is [`Outcome::BeforeTime`]. The window's upper end is pushed
//!    out to the attempt's deadline when that is later. Elapsed time above
//!    it is
//!    [`Outcome::Completed`] if the occurrence range is already satisfied
//!    (the subtree's indices are handed to the attempt) and
//!    [`Outcome::Canceled`] otherwise (the node forgets its indices).
//! 2. **Match test.** A leaf yields `Stepped` or `Skipped`. A conditional
//!    evaluates left then right and combines them by rank. A `Stepped`
//!    result records `i` and sets the baseline if none exists. Any result
//!    other than `Stepped` or `Completed` without a baseline is
//!    [`Outcome::Invalid`].
//! 3. **Occurrence refinement** against the node's matched-index count.

use std::collections::BTreeSet;
use std::fmt;

use crate::common::behavior::BehaviorId;
use crate::common::event::Event;
use crate::common::range::Range;
use crate::pattern::outcome::Outcome;
use crate::pattern::step::Attempt;
use crate::pattern::token::Operator;

/// Index of a node inside its [`Expression`].
pub type NodeId = usize;

/// What a node tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Matches events of one behavior.
    Behavior {
        /// Interned behavior.
        id: BehaviorId,
        /// Name as written in the pattern, kept for rendering.
        name: Box<str>,
    },
    /// Combines two child nodes.
    Conditional {
        /// `&` or `|`.
        operator: Operator,
        /// Evaluated first.
        left: NodeId,
        /// Evaluated second.
        right: NodeId,
    },
}

/// One node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    occurrences: Option<Range>,
    timing: Option<Range>,
    matched: BTreeSet<usize>,
}

impl Node {
    pub(crate) fn behavior(id: BehaviorId, name: &str) -> Self {
        Self::with_kind(NodeKind::Behavior {
            id,
            name: name.into(),
        })
    }

    pub(crate) fn conditional(operator: Operator, left: NodeId, right: NodeId) -> Self {
        Self::with_kind(NodeKind::Conditional {
            operator,
            left,
            right,
        })
    }

    const fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            occurrences: None,
            timing: None,
            matched: BTreeSet::new(),
        }
    }

    /// What this node tests.
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Occurrence range, if one was written or defaulted onto this node.
    pub const fn occurrences(&self) -> Option<Range> {
        self.occurrences
    }

    /// Timing window, if one was written or defaulted onto this node.
    pub const fn timing(&self) -> Option<Range> {
        self.timing
    }

    /// Number of distinct event indices matched so far.
    pub fn occurrence_count(&self) -> usize {
        self.matched.len()
    }

    /// Sets the occurrence range unless one is already set.
    pub(crate) fn set_occurrences(&mut self, range: Range) {
        self.occurrences.get_or_insert(range);
    }

    /// Sets the timing window unless one is already set.
    pub(crate) fn set_timing(&mut self, range: Range) {
        self.timing.get_or_insert(range);
    }
}

/// The compiled tree of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Expression {
    /// `root` must index into `nodes`, and every conditional's children must
    /// too.
    pub(crate) fn from_nodes(nodes: Vec<Node>, root: NodeId) -> Self {
        debug_assert!(root < nodes.len());
        Self { nodes, root }
    }

    /// Root node id.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, in the order the compiler created them.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Feeds event `index` to the tree and returns the root's outcome.
    pub fn evaluate(&mut self, index: usize, event: &Event, attempt: &mut Attempt) -> Outcome {
        self.evaluate_node(self.root, index, event, attempt)
    }

    /// Forgets every matched index in the tree.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.matched.clear();
        }
    }

    /// Union of the matched indices of every node in the tree.
    pub fn indices(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.collect_indices(self.root, &mut out);
        out
    }

    /// Upper end of the widest timing window that governs the tree: the
    /// root's window if it has one, otherwise the widest one below it.
    /// `None` when no node carries a window.
    pub fn timing_ceiling(&self) -> Option<f64> {
        self.node_ceiling(self.root)
    }

    fn node_ceiling(&self, id: NodeId) -> Option<f64> {
        let node = &self.nodes[id];
        if let Some(timing) = node.timing {
            return Some(timing.maximum());
        }
        match node.kind {
            NodeKind::Behavior { .. } => None,
            NodeKind::Conditional { left, right, .. } => {
                match (self.node_ceiling(left), self.node_ceiling(right)) {
                    (Some(l), Some(r)) => Some(l.max(r)),
                    (l, r) => l.or(r),
                }
            }
        }
    }

    /// Applies default ranges to every leaf that has no range of its own
    /// and no ancestor carrying one.
    ///
    /// Conditionals never receive defaults. An explicit range on a node
    /// stops the corresponding default from reaching anything below it.
    pub(crate) fn fill_defaults(&mut self, occurrences: Range, timing: Range) {
        let mut pending = vec![(self.root, true, true)];
        while let Some((id, occurrences_open, timing_open)) = pending.pop() {
            let node = &mut self.nodes[id];
            let occurrences_open = occurrences_open && node.occurrences.is_none();
            let timing_open = timing_open && node.timing.is_none();
            match node.kind {
                NodeKind::Behavior { .. } => {
                    if occurrences_open {
                        node.occurrences = Some(occurrences);
                    }
                    if timing_open {
                        node.timing = Some(timing);
                    }
                }
                NodeKind::Conditional { left, right, .. } => {
                    if occurrences_open || timing_open {
                        pending.push((right, occurrences_open, timing_open));
                        pending.push((left, occurrences_open, timing_open));
                    }
                }
            }
        }
    }

    fn evaluate_node(
        &mut self,
        id: NodeId,
        index: usize,
        event: &Event,
        attempt: &mut Attempt,
    ) -> Outcome {
        if let (Some(baseline), Some(timing)) = (attempt.baseline, self.nodes[id].timing) {
            let elapsed = event.time - baseline;
            if elapsed < timing.minimum() {
                return Outcome::BeforeTime;
            }
            let maximum = attempt
                .deadline
                .map_or(timing.maximum(), |deadline| timing.maximum().max(deadline - baseline));
            if elapsed > maximum {
                if self.is_completed(id) {
                    self.collect_indices(id, &mut attempt.indices);
                    return Outcome::Completed;
                }
                self.nodes[id].matched.clear();
                return Outcome::Canceled;
            }
        }

        let raw = match self.nodes[id].kind {
            NodeKind::Behavior { id: behavior, .. } => {
                if behavior == event.behavior {
                    Outcome::Stepped
                } else {
                    Outcome::Skipped
                }
            }
            NodeKind::Conditional {
                operator,
                left,
                right,
            } => {
                let left = self.evaluate_node(left, index, event, attempt);
                let right = self.evaluate_node(right, index, event, attempt);
                match operator {
                    Operator::And => left.and(right),
                    Operator::Or => left.or(right),
                }
            }
        };

        let node = &mut self.nodes[id];
        match raw {
            Outcome::Stepped => {
                node.matched.insert(index);
                attempt.baseline.get_or_insert(event.time);
            }
            Outcome::Completed => attempt.indices.extend(node.matched.iter().copied()),
            _ if attempt.baseline.is_none() => return Outcome::Invalid,
            _ => {}
        }

        let Some(occurrences) = node.occurrences else {
            return raw;
        };
        let count = node.matched.len() as f64;
        if count < occurrences.minimum() {
            if raw == Outcome::Stepped {
                Outcome::Stepped
            } else {
                Outcome::NotEnoughOccurrences
            }
        } else if count > occurrences.maximum() {
            node.matched.clear();
            Outcome::Canceled
        } else if raw == Outcome::Stepped {
            Outcome::SteppedAndTechnicallyComplete
        } else {
            Outcome::TechnicallyComplete
        }
    }

    fn is_completed(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        if let Some(occurrences) = node.occurrences {
            return occurrences.contains_count(node.matched.len());
        }
        match node.kind {
            NodeKind::Behavior { .. } => false,
            NodeKind::Conditional {
                operator: Operator::And,
                left,
                right,
            } => self.is_completed(left) && self.is_completed(right),
            NodeKind::Conditional {
                operator: Operator::Or,
                left,
                right,
            } => self.is_completed(left) || self.is_completed(right),
        }
    }

    fn collect_indices(&self, id: NodeId, out: &mut BTreeSet<usize>) {
        let node = &self.nodes[id];
        out.extend(node.matched.iter().copied());
        if let NodeKind::Conditional { left, right, .. } = node.kind {
            self.collect_indices(left, out);
            self.collect_indices(right, out);
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::Behavior { name, .. } => write_escaped(f, name)?,
            NodeKind::Conditional {
                operator,
                left,
                right,
            } => {
                f.write_str("(")?;
                self.fmt_node(*left, f)?;
                write!(f, " {} ", operator.as_str())?;
                self.fmt_node(*right, f)?;
                f.write_str(")")?;
            }
        }
        if let Some(timing) = node.timing {
            write!(f, "{{s{timing}}}")?;
        }
        if let Some(occurrences) = node.occurrences {
            write!(f, "[{occurrences}]")?;
        }
        Ok(())
    }
}

/// Renders the tree as pattern text that compiles back to an equal tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

/// Characters that always need a backslash inside a behavior name.
const RESERVED: [char; 10] = ['\\', '(', ')', '[', ']', '{', '}', '&', '|', '^'];

fn write_escaped(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        let arrow = matches!(c, '-' | '=') && chars.peek() == Some(&'>');
        if arrow || RESERVED.contains(&c) {
            write!(f, "\\{c}")?;
        } else {
            write!(f, "{c}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::behavior::BehaviorRegistry;

    /// Builds `left OP right` over two fresh leaves.
    fn pair(
        registry: &mut BehaviorRegistry,
        operator: Operator,
        left: &str,
        right: &str,
    ) -> Expression {
        let nodes = vec![
            Node::behavior(registry.intern(left), left),
            Node::behavior(registry.intern(right), right),
            Node::conditional(operator, 0, 1),
        ];
        Expression::from_nodes(nodes, 2)
    }

    fn leaf(registry: &mut BehaviorRegistry, name: &str) -> Expression {
        Expression::from_nodes(vec![Node::behavior(registry.intern(name), name)], 0)
    }

    #[test]
    fn test_leaf_without_baseline_is_invalid_on_mismatch() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "A");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let other = Event::named(&mut registry, "B", 0.0);
        assert_eq!(expr.evaluate(0, &other, &mut attempt), Outcome::Invalid);
        assert!(attempt.baseline.is_none());
    }

    #[test]
    fn test_leaf_step_sets_baseline() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "A");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let a = Event::named(&mut registry, "A", 4.0);
        assert_eq!(
            expr.evaluate(3, &a, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );
        assert_eq!(attempt.baseline, Some(4.0));
        assert_eq!(expr.indices().into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_occurrence_minimum_keeps_stepping() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "A");
        expr.nodes[0].set_occurrences(Range::exactly(2.0).unwrap());
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let a0 = Event::named(&mut registry, "A", 0.0);
        let a1 = Event::named(&mut registry, "A", 0.5);
        let a2 = Event::named(&mut registry, "A", 0.7);
        assert_eq!(expr.evaluate(0, &a0, &mut attempt), Outcome::Stepped);
        assert_eq!(
            expr.evaluate(1, &a1, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );
        // third occurrence breaks the ceiling
        assert_eq!(expr.evaluate(2, &a2, &mut attempt), Outcome::Canceled);
        assert!(expr.indices().is_empty());
    }

    #[test]
    fn test_not_enough_occurrences_after_baseline() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt {
            baseline: Some(0.0),
            ..Attempt::default()
        };
        let other = Event::named(&mut registry, "X", 0.5);
        assert_eq!(
            expr.evaluate(0, &other, &mut attempt),
            Outcome::NotEnoughOccurrences
        );
    }

    #[test]
    fn test_timing_before_and_after_window() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "A");
        expr.nodes[0].set_timing(Range::new(1.0, 2.0).unwrap());
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt {
            baseline: Some(10.0),
            ..Attempt::default()
        };
        let early = Event::named(&mut registry, "A", 10.5);
        assert_eq!(expr.evaluate(0, &early, &mut attempt), Outcome::BeforeTime);

        let in_window = Event::named(&mut registry, "A", 11.5);
        assert_eq!(
            expr.evaluate(1, &in_window, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );

        let late = Event::named(&mut registry, "X", 13.0);
        assert_eq!(expr.evaluate(2, &late, &mut attempt), Outcome::Completed);
        assert_eq!(attempt.indices.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_timing_expiry_without_occurrences_cancels() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "A");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt {
            baseline: Some(0.0),
            ..Attempt::default()
        };
        let late = Event::named(&mut registry, "A", 5.0);
        assert_eq!(expr.evaluate(0, &late, &mut attempt), Outcome::Canceled);
        assert!(attempt.indices.is_empty());
    }

    #[test]
    fn test_deadline_extends_window() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt {
            baseline: Some(0.0),
            deadline: Some(2.0),
            ..Attempt::default()
        };
        let b = Event::named(&mut registry, "B", 1.9);
        assert_eq!(
            expr.evaluate(1, &b, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );
    }

    #[test]
    fn test_earlier_deadline_keeps_own_window() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = leaf(&mut registry, "B");
        expr.nodes[0].set_timing(Range::at_most(5.0).unwrap());
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt {
            baseline: Some(10.0),
            deadline: Some(1.0),
            ..Attempt::default()
        };
        let b = Event::named(&mut registry, "B", 14.0);
        assert_eq!(
            expr.evaluate(1, &b, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );
    }

    #[test]
    fn test_timing_ceiling() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::And, "A", "B");
        expr.nodes[1].set_timing(Range::at_most(5.0).unwrap());
        expr.fill_defaults(Range::ONE, Range::UNIT);
        assert_eq!(expr.timing_ceiling(), Some(5.0));

        let mut grouped = pair(&mut registry, Operator::Or, "A", "B");
        grouped.nodes[2].set_timing(Range::at_most(3.0).unwrap());
        grouped.nodes[1].set_timing(Range::at_most(9.0).unwrap());
        grouped.fill_defaults(Range::ONE, Range::UNIT);
        assert_eq!(grouped.timing_ceiling(), Some(3.0));

        assert_eq!(leaf(&mut registry, "C").timing_ceiling(), None);
    }

    #[test]
    fn test_or_takes_better_child() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::Or, "A", "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let b = Event::named(&mut registry, "B", 1.0);
        assert_eq!(
            expr.evaluate(1, &b, &mut attempt),
            Outcome::SteppedAndTechnicallyComplete
        );
        assert_eq!(expr.indices().into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_and_takes_worse_child() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::And, "A", "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let a = Event::named(&mut registry, "A", 0.0);
        let b = Event::named(&mut registry, "B", 0.5);
        assert_eq!(
            expr.evaluate(0, &a, &mut attempt),
            Outcome::NotEnoughOccurrences
        );
        assert_eq!(
            expr.evaluate(1, &b, &mut attempt),
            Outcome::TechnicallyComplete
        );
        assert_eq!(expr.indices().into_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_defaults_reach_leaves_only() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::And, "A", "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let root = expr.node(expr.root()).unwrap();
        assert_eq!(root.occurrences(), None);
        assert_eq!(root.timing(), None);
        for id in [0, 1] {
            let leaf = expr.node(id).unwrap();
            assert_eq!(leaf.occurrences(), Some(Range::ONE));
            assert_eq!(leaf.timing(), Some(Range::UNIT));
        }
    }

    #[test]
    fn test_explicit_range_on_conditional_blocks_default() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::Or, "A", "B");
        let two = Range::exactly(2.0).unwrap();
        expr.nodes[2].set_occurrences(two);
        expr.fill_defaults(Range::ONE, Range::UNIT);
        assert_eq!(expr.node(2).unwrap().occurrences(), Some(two));
        for id in [0, 1] {
            let leaf = expr.node(id).unwrap();
            assert_eq!(leaf.occurrences(), None);
            assert_eq!(leaf.timing(), Some(Range::UNIT));
        }
    }

    #[test]
    fn test_set_is_first_write_wins() {
        let mut registry = BehaviorRegistry::new();
        let mut node = Node::behavior(registry.intern("A"), "A");
        node.set_occurrences(Range::exactly(3.0).unwrap());
        node.set_occurrences(Range::ONE);
        assert_eq!(node.occurrences(), Some(Range::exactly(3.0).unwrap()));
    }

    #[test]
    fn test_reset_clears_all_nodes() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::Or, "A", "B");
        expr.fill_defaults(Range::ONE, Range::UNIT);
        let mut attempt = Attempt::default();
        let a = Event::named(&mut registry, "A", 0.0);
        expr.evaluate(0, &a, &mut attempt);
        assert!(!expr.indices().is_empty());
        expr.reset();
        assert!(expr.indices().is_empty());
        assert!(expr.nodes().iter().all(|n| n.occurrence_count() == 0));
    }

    #[test]
    fn test_display() {
        let mut registry = BehaviorRegistry::new();
        let mut expr = pair(&mut registry, Operator::And, "A", "B");
        expr.nodes[2].set_occurrences(Range::at_least(2.0).unwrap());
        expr.fill_defaults(Range::ONE, Range::UNIT);
        assert_eq!(expr.to_string(), "(A{s0:1} & B{s0:1})[2:]");
    }

    #[test]
    fn test_display_escapes_names() {
        let mut registry = BehaviorRegistry::new();
        let name = "a->b (x|y)";
        let expr = Expression::from_nodes(vec![Node::behavior(registry.intern(name), name)], 0);
        assert_eq!(expr.to_string(), r"a\->b \(x\|y\)");
    }

    #[test]
    fn test_display_keeps_plain_dashes() {
        let mut registry = BehaviorRegistry::new();
        let name = "sign-up";
        let expr = Expression::from_nodes(vec![Node::behavior(registry.intern(name), name)], 0);
        assert_eq!(expr.to_string(), "sign-up");
    }
}
