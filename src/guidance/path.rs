//! This module contains the root-to-node paths that both guidance engines use
//! as their samples, along with the input-use deduplication they share.

use std::{cmp::Reverse, collections::HashMap};

use itertools::Itertools;
use serde::Serialize;

use crate::tree::{
    location::SignedId,
    node::NodeId,
    ExecutionTree,
};

/// A path from the root of the tree to a node at the guidance target.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidatePath {
    /// The nodes on the path, from the root to the terminal node inclusive.
    pub nodes: Vec<NodeId>,

    /// The value of the ordering metric at the terminal node.
    pub metric: f64,

    /// The best objective value of the terminal node, used as the regressor
    /// for every extrapolation.
    pub objective: f64,
}

impl CandidatePath {
    /// Constructs a candidate path from the root of `tree` to `terminal`.
    #[must_use]
    pub fn to(tree: &ExecutionTree, terminal: NodeId, metric: f64, objective: f64) -> Self {
        let nodes = tree.path_to(terminal);
        Self {
            nodes,
            metric,
            objective,
        }
    }

    /// Gets the node at the end of the path.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty, which cannot happen for paths built with
    /// [`Self::to`].
    #[must_use]
    pub fn terminal(&self) -> NodeId {
        *self.nodes.last().expect("Candidate paths always contain their terminal node")
    }

    /// Gets the number of nodes on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks if the path has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gets the signed id for each node on the path.
    ///
    /// Every node but the last contributes the direction taken toward the next
    /// node. The terminal node contributes `arrival`, the direction that the
    /// guidance is trying to reach.
    ///
    /// # Panics
    ///
    /// Panics if consecutive nodes on the path are not parent and child.
    #[must_use]
    pub fn occurrences(&self, tree: &ExecutionTree, arrival: SignedId) -> Vec<SignedId> {
        self.nodes
            .iter()
            .tuple_windows()
            .map(|(parent, child)| {
                let direction = tree
                    .direction_between(*parent, *child)
                    .expect("Consecutive path nodes are always parent and child");
                tree.node(*parent).signed_id(direction)
            })
            .chain(std::iter::once(arrival))
            .collect()
    }

    /// Gets the relative position of the node at `index` along the path.
    #[must_use]
    pub fn relative_position(&self, index: usize) -> f64 {
        let span = self.len().saturating_sub(1).max(1);
        index as f64 / span as f64
    }

    /// Scores how far the path's length is from twice the position just past
    /// its largest-input node. Lower is better.
    #[must_use]
    pub fn input_use_score(&self, tree: &ExecutionTree) -> usize {
        let largest_input = self
            .nodes
            .iter()
            .position_min_by_key(|id| Reverse(tree.node(**id).input_bytes()))
            .unwrap_or_default();
        self.len().abs_diff(2 * (largest_input + 1))
    }
}

/// Keeps a single path for every distinct terminal metric value: the one whose
/// [`CandidatePath::input_use_score`] is lowest, with the earliest path winning
/// ties.
///
/// The relative order of the surviving paths is preserved.
#[must_use]
pub fn keep_closest_input_use(tree: &ExecutionTree, paths: Vec<CandidatePath>) -> Vec<CandidatePath> {
    let mut best_for_metric: HashMap<u64, (usize, usize)> = HashMap::new();
    for (index, path) in paths.iter().enumerate() {
        let key = metric_key(path.metric);
        let score = path.input_use_score(tree);
        best_for_metric
            .entry(key)
            .and_modify(|best| {
                if score < best.1 {
                    *best = (index, score);
                }
            })
            .or_insert((index, score));
    }

    let mut keep = vec![false; paths.len()];
    for (index, _) in best_for_metric.values() {
        keep[*index] = true;
    }

    paths
        .into_iter()
        .zip(keep)
        .filter_map(|(path, keep)| keep.then_some(path))
        .collect()
}

/// Groups metric values by identity, treating both zeroes as the same value.
fn metric_key(metric: f64) -> u64 {
    if metric == 0.0 {
        0.0f64.to_bits()
    } else {
        metric.to_bits()
    }
}
