//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use std::{fs::File, io::Read};

use anyhow::anyhow;
use serde::Deserialize;
use trace_guidance::{
    guidance::Recommendation,
    tree::{
        node::ChildLabel,
        trace::{Termination, Trace, TraceRecord},
        ExecutionTree,
        Guid,
        Phase,
    },
};

/// The path to the recorded campaign used by most of the integration tests.
#[allow(unused)] // It is actually
pub const CAMPAIGN_PATH: &str = "./asset/campaign.json";

/// The traces recorded during a single phase of a campaign, as stored on disk.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RecordedPhase {
    pub phase:  Phase,
    pub traces: Vec<Trace>,
}

/// Loads the recorded campaign at the provided `path`.
///
/// The file at `path` must be a JSON array of phases, each holding the traces
/// recorded during that phase.
#[allow(unused)] // It is actually
pub fn load_campaign(path: impl Into<String>) -> anyhow::Result<Vec<RecordedPhase>> {
    let path = path.into();
    let mut file = File::open(path).map_err(|_| anyhow!("File not available"))?;
    let mut contents = vec![];
    file.read_to_end(&mut contents)
        .map_err(|_| anyhow!("File could not be read"))?;

    let phases: Vec<RecordedPhase> = serde_json::from_slice(contents.as_slice())
        .map_err(|_| anyhow!("Could not parse recorded campaign."))?;

    Ok(phases)
}

/// Replays every phase of the recorded campaign at `path` into a new tree.
#[allow(unused)] // It is actually
pub fn new_tree_from_campaign(path: impl Into<String>) -> anyhow::Result<ExecutionTree> {
    let mut tree = ExecutionTree::new();
    for recorded in load_campaign(path)? {
        tree.replay(recorded.phase, recorded.traces)?;
    }

    Ok(tree)
}

/// Builds a trace whose records are `(location, direction, guid)` triples that
/// all share the same objective `value` and input size.
#[allow(unused)] // It is actually
pub fn trace(
    id: u32,
    steps: &[(i32, bool, Guid)],
    value: f64,
    input_bytes: u32,
    termination: Termination,
) -> Trace {
    let records = steps
        .iter()
        .map(|(location, direction, guid)| {
            TraceRecord::new(*location, *direction, input_bytes, value, *guid)
        })
        .collect();
    Trace::new(id, records, termination)
}

/// Checks that `recommendation` was reached only through visited edges as of
/// `as_of`, and that it names an open direction that leads nowhere yet.
#[allow(unused)] // It is actually
pub fn check_recommendation(
    tree: &ExecutionTree,
    recommendation: &Recommendation,
    as_of: Phase,
) -> anyhow::Result<()> {
    let path = tree.path_to(recommendation.node);
    for pair in path.windows(2) {
        let direction = tree
            .direction_between(pair[0], pair[1])
            .ok_or_else(|| anyhow!("Path nodes are not linked"))?;
        if tree.node(pair[0]).child_label(as_of, direction) != ChildLabel::Visited {
            return Err(anyhow!("Path to the recommendation crosses an unvisited edge"));
        }
    }

    let node = tree.node(recommendation.node);
    if !node.child_label(as_of, recommendation.direction).is_open() {
        return Err(anyhow!("Recommended direction is not open"));
    }
    if tree.visible_child(recommendation.node, recommendation.direction, as_of).is_some() {
        return Err(anyhow!("Recommended direction leads to a discovered node"));
    }
    if node.signed_id(recommendation.direction) != recommendation.signed_id {
        return Err(anyhow!("Recommendation has an inconsistent signed id"));
    }

    Ok(())
}
