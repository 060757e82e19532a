//! This module contains the subtree reachability counter, which summarises
//! the outcomes of every branch occurrence below a node.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::tree::{
    location::{Direction, SignedId},
    node::{ChildLabel, NodeId},
    ExecutionTree,
    Phase,
};

/// The outcome counts for a single signed location id within a subtree.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReachabilityCounts {
    /// Untaken directions at nodes that are still open to analysis.
    pub not_visited_pending: u32,

    /// Untaken directions at nodes that have been closed.
    pub not_visited_rest: u32,

    pub end_exceptional: u32,
    pub end_normal: u32,
    pub visited: u32,
}

impl ReachabilityCounts {
    /// Gets the total number of directions counted.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.not_visited_pending
            + self.not_visited_rest
            + self.end_exceptional
            + self.end_normal
            + self.visited
    }

    /// Gets the number of untaken directions, pending or not.
    #[must_use]
    pub fn not_visited(&self) -> u32 {
        self.not_visited_pending + self.not_visited_rest
    }

    /// Adds the counts in `other` to `self`.
    pub fn merge(&mut self, other: &ReachabilityCounts) {
        self.not_visited_pending += other.not_visited_pending;
        self.not_visited_rest += other.not_visited_rest;
        self.end_exceptional += other.end_exceptional;
        self.end_normal += other.end_normal;
        self.visited += other.visited;
    }
}

/// The per-signed-id outcome counts of a subtree.
pub type Reachability = BTreeMap<SignedId, ReachabilityCounts>;

/// Aggregates the outcomes of the branches in a subtree.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubTreeReachability;

impl SubTreeReachability {
    /// Computes the outcome counts for every signed id observed in the subtree
    /// rooted at `node`, as of `as_of`.
    ///
    /// Each node contributes one count for each of its two directions, and the
    /// subtrees behind `Visited` directions are merged in additively. Children
    /// that had not been discovered as of `as_of` are not descended into.
    #[must_use]
    pub fn compute(tree: &ExecutionTree, node: NodeId, as_of: Phase) -> Reachability {
        let mut result = Reachability::new();
        let mut stack = vec![node];

        while let Some(id) = stack.pop() {
            let current = tree.node(id);
            let pending = !current.is_closed(as_of);

            for direction in Direction::ALL {
                let counts = result.entry(current.signed_id(direction)).or_default();
                match current.child_label(as_of, direction) {
                    ChildLabel::NotVisited if pending => counts.not_visited_pending += 1,
                    ChildLabel::NotVisited => counts.not_visited_rest += 1,
                    ChildLabel::EndExceptional => counts.end_exceptional += 1,
                    ChildLabel::EndNormal => counts.end_normal += 1,
                    ChildLabel::Visited => {
                        counts.visited += 1;
                        if let Some(child) = tree.visible_child(id, direction, as_of) {
                            stack.push(child);
                        }
                    }
                }
            }
        }

        result
    }
}
