//! This module is an integration test that checks the replay of recorded
//! campaigns into the execution tree, and the coverage and historical queries
//! that the tree answers.
#![cfg(test)]

use trace_guidance::tree::{
    location::{Direction, LocationId, SignedId},
    node::ChildLabel,
    reachability::SubTreeReachability,
    trace::Termination,
    ExecutionTree,
};

mod common;

#[test]
fn covers_both_directions_across_phases() -> anyhow::Result<()> {
    let mut tree = ExecutionTree::new();
    tree.replay(0, vec![common::trace(0, &[(5, false, 1)], 10.0, 4, Termination::Normal)])?;
    tree.replay(1, vec![common::trace(0, &[(5, true, 1)], 2.0, 4, Termination::Normal)])?;

    let location = LocationId::new(5);
    assert!(tree.is_covered(1, location, Direction::Left));
    assert!(tree.is_covered(1, location, Direction::Right));
    assert_eq!(tree.uncovered_signed_id(location), SignedId::NONE);

    // As of the first phase exactly direction zero had been taken, so the
    // location's frontier id is negative and the right direction is still open.
    assert!(tree.is_covered(0, location, Direction::Left));
    assert!(!tree.is_covered(0, location, Direction::Right));
    let frontier = tree.uncovered_signed_id_as_of(0, location);
    assert_eq!(frontier, SignedId::new(-5));
    assert_eq!(frontier.sibling().direction(), Some(Direction::Right));
    assert_eq!(tree.frontier(0), vec![SignedId::new(-5)]);
    assert!(tree.frontier(1).is_empty());

    // The single node remembers the best value of each phase.
    let root = tree.root().unwrap();
    assert_eq!(tree.node(root).best_value(0), 10.0);
    assert_eq!(tree.node(root).best_value(1), 2.0);
    assert_eq!(tree.node(root).hit_count(1), 2);
    assert!(tree.fully_covered_at(1).unwrap().contains(&location));

    Ok(())
}

#[test]
fn replays_the_recorded_campaign() -> anyhow::Result<()> {
    let tree = common::new_tree_from_campaign(common::CAMPAIGN_PATH)?;

    assert_eq!(tree.len(), 8);
    assert_eq!(tree.current_phase(), 1);
    assert_eq!(tree.visible_node_count(0), 6);
    assert_eq!(tree.visible_node_count(1), 8);
    assert_eq!(tree.depth_first(0).len(), 6);

    // Only the left direction of location 3 has ever been taken.
    assert_eq!(tree.frontier(1), vec![SignedId::new(-3)]);
    assert_eq!(tree.frontier(0), vec![SignedId::new(-3)]);

    let fully_covered = tree.fully_covered_at(0).unwrap();
    assert!(fully_covered.contains(&LocationId::new(1)));
    assert!(fully_covered.contains(&LocationId::new(2)));
    assert!(tree.fully_covered_at(1).is_none());

    // The second trace of the first phase ended with an exception.
    let exceptional = tree.node_by_guid(6).unwrap();
    assert_eq!(
        tree.node(exceptional).child_label(0, Direction::Left),
        ChildLabel::EndExceptional
    );

    Ok(())
}

#[test]
fn history_is_monotonic_across_phases() -> anyhow::Result<()> {
    let tree = common::new_tree_from_campaign(common::CAMPAIGN_PATH)?;

    for id in tree.depth_first(0) {
        let node = tree.node(id);
        assert!(node.best_value(1) <= node.best_value(0));
        assert!(node.hit_count(1) >= node.hit_count(0));
        for direction in Direction::ALL {
            assert!(
                node.child_label(1, direction).rank() >= node.child_label(0, direction).rank()
            );
        }
    }

    for location in [1, 2, 3].map(LocationId::new) {
        for direction in Direction::ALL {
            if tree.is_covered(0, location, direction) {
                assert!(tree.is_covered(1, location, direction));
            }
        }
    }

    // Nodes discovered in the second phase did not exist in the first.
    let late = tree.node_by_guid(7).unwrap();
    assert!(!tree.node(late).is_visible(0));
    assert_eq!(tree.node(late).best_value(0), f64::INFINITY);
    assert_eq!(tree.node(late).hit_count(0), 0);

    Ok(())
}

#[test]
fn replaying_a_phase_twice_keeps_the_shape() -> anyhow::Result<()> {
    let traces = vec![
        common::trace(0, &[(1, true, 1), (2, false, 2)], 4.0, 4, Termination::Normal),
        common::trace(1, &[(1, false, 1), (3, true, 3)], 6.0, 4, Termination::Exceptional),
    ];

    let mut once = ExecutionTree::new();
    once.replay(0, traces.clone())?;

    let mut twice = ExecutionTree::new();
    twice.replay(0, traces.clone())?;
    let summary = twice.replay(0, traces)?;
    assert_eq!(summary.new_nodes, 0);
    assert_eq!(summary.newly_covered, 0);

    let guids = |tree: &ExecutionTree| -> Vec<i64> {
        tree.depth_first(0).into_iter().map(|id| tree.node(id).guid()).collect()
    };
    assert_eq!(guids(&once), guids(&twice));
    assert_eq!(once.len(), twice.len());

    let root = twice.root().unwrap();
    assert_eq!(twice.node(root).hit_count(0), 4);

    Ok(())
}

#[test]
fn inconsistent_traces_abort_the_load() -> anyhow::Result<()> {
    let mut tree = common::new_tree_from_campaign(common::CAMPAIGN_PATH)?;
    let result = tree.replay(
        2,
        vec![common::trace(4, &[(1, true, 1), (9, true, 2)], 1.0, 4, Termination::Normal)],
    );

    let error = result.unwrap_err();
    assert_eq!(error.location.phase, 2);
    assert_eq!(error.location.trace, 4);
    assert_eq!(error.location.record, 1);
    assert!(error.to_string().starts_with("[phase 2, trace 4, record 1]"));

    let interface: trace_guidance::Error = error.into();
    assert!(matches!(interface, trace_guidance::Error::Replay(_)));

    Ok(())
}

#[test]
fn reachability_summarises_the_campaign() -> anyhow::Result<()> {
    let tree = common::new_tree_from_campaign(common::CAMPAIGN_PATH)?;
    let root = tree.root().unwrap();

    let counts = SubTreeReachability::compute(&tree, root, 1);
    let frontier = counts[&SignedId::new(3)];
    assert_eq!(frontier.not_visited_pending, 4);
    assert_eq!(counts[&SignedId::new(-3)].end_normal, 3);
    assert_eq!(counts[&SignedId::new(-3)].end_exceptional, 1);

    // As of the first phase the subtree was smaller.
    let counts = SubTreeReachability::compute(&tree, root, 0);
    assert_eq!(counts[&SignedId::new(3)].not_visited_pending, 2);

    Ok(())
}
