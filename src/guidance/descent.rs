//! This module contains the greedy root-to-frontier descent shared by the
//! guidance engines, and the recommendation that it produces.
//!
//! The descent starts at the root and, at every node, scores each open
//! direction with a [`NodeEvaluator`]. It follows the best-scoring direction
//! until that direction leads to a child that had not been discovered, at
//! which point the node and direction are recommended to the fuzzer.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    constant::DEFICIT_TIE_EPSILON,
    error::guidance::{Error, Result},
    tree::{
        location::{Direction, LocationId, SignedId},
        node::NodeId,
        ExecutionTree,
        Guid,
        Phase,
    },
};

/// The number of times each signed id has been taken on the way down from the
/// root.
pub type ObservedCounts = BTreeMap<SignedId, usize>;

/// A node and direction that the fuzzer should try to exercise next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    /// The node at which the recommended direction should be taken.
    pub node: NodeId,

    /// The guid of that node.
    pub guid: Guid,

    /// The location of that node.
    pub location: LocationId,

    /// The direction that should be taken.
    pub direction: Direction,

    /// The signed id of the recommended branch.
    pub signed_id: SignedId,

    /// The position of the node within the traces that pass through it.
    pub trace_index: u32,
}

/// The score of a single open direction during the descent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Choice {
    /// How far the occurrences of the direction's signed id lag behind what
    /// is expected at this depth. Higher is more urgent.
    pub deficit: f64,

    /// How many more occurrences of the signed id are expected below this
    /// point. Used to break ties between equal deficits.
    pub remaining: f64,

    /// Whether this direction must be taken regardless of its deficit.
    pub forced: bool,
}

/// A strategy for scoring the directions available during the descent.
pub trait NodeEvaluator {
    /// Scores taking `direction` at `node`, given the `observed` signed id
    /// counts on the path from the root down to (but excluding) `node`.
    fn evaluate(
        &self,
        tree: &ExecutionTree,
        node: NodeId,
        direction: Direction,
        observed: &ObservedCounts,
    ) -> Choice;
}

/// Descends the `tree` as of `as_of`, following the directions preferred by
/// the `evaluator`.
///
/// Only open directions (not yet taken, or taken into a discovered child) are
/// considered. A forced direction always wins, after which the largest deficit
/// wins, and then the largest remaining count. Any remaining tie goes to the
/// left direction.
///
/// # Errors
///
/// Returns [`Err`] if the tree has no root as of `as_of`, or if the descent
/// reaches a node that has no open direction.
pub fn descend(
    tree: &ExecutionTree,
    as_of: Phase,
    evaluator: &impl NodeEvaluator,
) -> Result<Recommendation> {
    let mut current = tree
        .root()
        .filter(|root| tree.node(*root).is_visible(as_of))
        .ok_or(Error::EmptyTree)?;
    let mut observed = ObservedCounts::new();

    loop {
        let node = tree.node(current);
        let direction = Direction::ALL
            .into_iter()
            .filter(|direction| node.child_label(as_of, *direction).is_open())
            .map(|direction| {
                (
                    direction,
                    evaluator.evaluate(tree, current, direction, &observed),
                )
            })
            .reduce(|best, candidate| {
                if prefers(&candidate.1, &best.1) {
                    candidate
                } else {
                    best
                }
            })
            .map(|(direction, _)| direction)
            .ok_or(Error::NoAdvanceableDirection { guid: node.guid() })?;

        let signed_id = node.signed_id(direction);
        match tree.visible_child(current, direction, as_of) {
            Some(child) => {
                trace!(guid = node.guid(), %signed_id, "Descending");
                *observed.entry(signed_id).or_default() += 1;
                current = child;
            }
            None => {
                let recommendation = Recommendation {
                    node: current,
                    guid: node.guid(),
                    location: node.location(),
                    direction,
                    signed_id,
                    trace_index: node.trace_index(),
                };
                debug!(
                    guid = recommendation.guid,
                    %signed_id,
                    trace_index = recommendation.trace_index,
                    "Selected node for guidance"
                );
                return Ok(recommendation);
            }
        }
    }
}

/// Checks whether `candidate` should be taken in preference to `best`.
fn prefers(candidate: &Choice, best: &Choice) -> bool {
    if candidate.forced != best.forced {
        return candidate.forced;
    }
    if (candidate.deficit - best.deficit).abs() > DEFICIT_TIE_EPSILON {
        return candidate.deficit > best.deficit;
    }
    candidate.remaining > best.remaining + DEFICIT_TIE_EPSILON
}
