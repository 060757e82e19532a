//! This module contains the historical execution tree and the replay of
//! recorded traces into it.
//!
//! # Versioning
//!
//! The tree is append-only. Nodes are never removed, and every attribute that
//! changes over the course of a campaign is recorded against the phase in
//! which it changed. Queries take an "as of" phase, which allows the tree to
//! be inspected as it was at the end of any earlier phase.

pub mod location;
pub mod node;
pub mod reachability;
pub mod trace;

use std::collections::{hash_map::Entry, BTreeMap, BTreeSet, HashMap};

use bimap::BiMap;
use derivative::Derivative;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    constant::INITIAL_PHASE,
    data::timeline::Timeline,
    error::{
        container::{Locatable, RecordLocation},
        replay::{Error, Result},
    },
    tree::{
        location::{Direction, LocationId, SignedId},
        node::{ChildLabel, Node, NodeId},
        trace::{Termination, Trace, TraceRecord},
    },
};

/// The index of an analysis phase of the campaign.
pub type Phase = u32;

/// The identifier assigned to a branch occurrence by the instrumented target.
pub type Guid = i64;

/// The binary tree of every branch occurrence seen over the campaign.
///
/// Nodes live in an arena owned by the tree and refer to each other by
/// [`NodeId`]. A node's children are owned through the arena, and its parent
/// link is a plain index, so no reference cycles exist.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ExecutionTree {
    /// The arena of nodes, in discovery order.
    #[derivative(Debug = "ignore")]
    nodes: Vec<Node>,

    root: Option<NodeId>,

    /// The bijection between target-assigned guids and arena slots.
    #[derivative(Debug = "ignore")]
    guids: BiMap<Guid, NodeId>,

    /// For each direction, the first phase at which each location was covered
    /// in that direction.
    #[derivative(Debug = "ignore")]
    coverage: [HashMap<LocationId, Phase>; 2],

    /// The locations that became covered in both directions at each phase.
    fully_covered: BTreeMap<Phase, BTreeSet<LocationId>>,

    /// The number of nodes that existed at the end of each replayed phase.
    visibility: Timeline<u32>,

    /// The default phase for queries.
    current_phase: Phase,

    /// The latest phase replayed into the tree, independent of where the
    /// query cursor has been moved.
    last_replayed: Option<Phase>,
}

impl ExecutionTree {
    /// Constructs a new, empty, execution tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            guids: BiMap::new(),
            coverage: [HashMap::new(), HashMap::new()],
            fully_covered: BTreeMap::new(),
            visibility: Timeline::new(),
            current_phase: INITIAL_PHASE,
            last_replayed: None,
        }
    }

    /// Replays the `traces` recorded during `phase` into the tree, and moves
    /// the "as of" cursor to `phase`.
    ///
    /// Traces are replayed in ascending order of their [`Trace::id`]. Phases
    /// must be replayed in non-decreasing order, though the latest phase may
    /// be replayed more than once. Moving the cursor back with
    /// [`Self::set_current_phase`] does not reopen earlier phases.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if a trace disagrees with the structure of the tree, if
    /// a guid is reused at a different position, if a location id cannot be
    /// encoded, if the tree or a trace outgrows 32-bit indices, or if `phase`
    /// precedes an already-replayed phase. The load
    /// should be abandoned in that case, as the tree will contain the part of
    /// the data replayed before the error.
    pub fn replay(
        &mut self,
        phase: Phase,
        traces: impl IntoIterator<Item = Trace>,
    ) -> Result<ReplaySummary> {
        if let Some(last) = self.last_replayed.filter(|last| phase < *last) {
            return Err(Error::PhaseRegression {
                requested: phase,
                current:   last,
            }
            .locate(RecordLocation::new(phase, 0, 0)));
        }

        let mut summary = ReplaySummary::new(phase);
        let node_count_before = self.nodes.len();

        for trace in traces.into_iter().sorted_by_key(|trace| trace.id) {
            self.replay_trace(phase, &trace, &mut summary)?;
        }

        summary.new_nodes = self.nodes.len() - node_count_before;
        let node_count = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.visibility.set(phase, node_count);
        self.current_phase = phase;
        self.last_replayed = Some(phase);

        info!(
            phase,
            traces = summary.traces,
            records = summary.records,
            new_nodes = summary.new_nodes,
            newly_covered = summary.newly_covered,
            newly_fully_covered = summary.newly_fully_covered,
            "Replayed phase into the execution tree"
        );

        Ok(summary)
    }

    /// Replays a single `trace` from the root of the tree.
    fn replay_trace(
        &mut self,
        phase: Phase,
        trace: &Trace,
        summary: &mut ReplaySummary,
    ) -> Result<()> {
        let Some(first) = trace.records.first() else {
            warn!(phase, trace = trace.id, "Skipping trace without any records");
            return Ok(());
        };

        u32::try_from(trace.records.len())
            .map_err(|_| Error::TraceTooLong {
                records: trace.records.len(),
            })
            .locate(RecordLocation::new(phase, trace.id, 0))?;

        let mut current = match self.root {
            Some(root) => root,
            None => {
                let root = self
                    .create_node(phase, None, 0, first)
                    .locate(RecordLocation::new(phase, trace.id, 0))?;
                self.root = Some(root);
                root
            }
        };

        let mut records = trace.records.iter().zip(0u32..).peekable();
        while let Some((record, index)) = records.next() {
            let record_location = RecordLocation::new(phase, trace.id, index);
            self.check_consistency(current, record).locate(record_location)?;

            let direction = record.direction;
            {
                let node = &mut self.nodes[current.index()];
                node.update_best_value(phase, record.objective_value);
                node.increment_hit_count(phase);
            }
            self.cover(phase, record.location, direction, summary);

            if let Some(&(next, next_index)) = records.peek() {
                self.nodes[current.index()].update_child_label(
                    phase,
                    direction,
                    ChildLabel::Visited,
                );

                current = match self.nodes[current.index()].child(direction) {
                    Some(child) => child,
                    None => {
                        let next_location = RecordLocation::new(phase, trace.id, next_index);
                        let child = self
                            .create_node(phase, Some(current), next_index, next)
                            .locate(next_location)?;
                        self.nodes[current.index()].set_child(direction, child);
                        child
                    }
                };
            } else {
                let label = match trace.termination {
                    Termination::Normal => ChildLabel::EndNormal,
                    Termination::Exceptional => ChildLabel::EndExceptional,
                };
                self.nodes[current.index()].update_child_label(phase, direction, label);
            }
        }

        summary.traces += 1;
        summary.records += trace.records.len();
        debug!(
            phase,
            trace = trace.id,
            records = trace.records.len(),
            termination = ?trace.termination,
            "Replayed trace"
        );

        Ok(())
    }

    /// Checks that the `record` describes the node at `current`.
    fn check_consistency(
        &self,
        current: NodeId,
        record: &TraceRecord,
    ) -> std::result::Result<(), Error> {
        let node = &self.nodes[current.index()];
        if node.location() == record.location && node.guid() == record.guid {
            Ok(())
        } else {
            Err(Error::Inconsistency {
                expected_location: record.location,
                expected_guid:     record.guid,
                found_location:    node.location(),
                found_guid:        node.guid(),
            })
        }
    }

    /// Allocates a new node for `record`, found at `trace_index` in its trace.
    fn create_node(
        &mut self,
        phase: Phase,
        parent: Option<NodeId>,
        trace_index: u32,
        record: &TraceRecord,
    ) -> std::result::Result<NodeId, Error> {
        if !record.location.is_valid() {
            return Err(Error::InvalidLocation {
                location: record.location,
            });
        }
        if self.guids.contains_left(&record.guid) {
            return Err(Error::DuplicateGuid { guid: record.guid });
        }

        let discovery_index = u32::try_from(self.nodes.len()).map_err(|_| Error::TooManyNodes)?;
        let id = NodeId::new(self.nodes.len());
        let node = Node::new(
            record.guid,
            parent,
            record.location,
            record.objective_value,
            trace_index,
            record.input_bytes,
            phase,
            discovery_index,
        );
        self.nodes.push(node);
        self.guids.insert(record.guid, id);

        Ok(id)
    }

    /// Records that `location` was covered in `direction` during `phase`.
    fn cover(
        &mut self,
        phase: Phase,
        location: LocationId,
        direction: Direction,
        summary: &mut ReplaySummary,
    ) {
        let newly_covered = match self.coverage[direction.index()].entry(location) {
            Entry::Vacant(entry) => {
                entry.insert(phase);
                true
            }
            Entry::Occupied(_) => false,
        };
        if !newly_covered {
            return;
        }

        summary.newly_covered += 1;
        if self.coverage[direction.sibling().index()].contains_key(&location) {
            self.fully_covered.entry(phase).or_default().insert(location);
            summary.newly_fully_covered += 1;
        }
    }
}

/// Coverage queries.
impl ExecutionTree {
    /// Checks whether `location` had been covered in `direction` as of
    /// `as_of`.
    #[must_use]
    pub fn is_covered(&self, as_of: Phase, location: LocationId, direction: Direction) -> bool {
        self.covered_at(location, direction).is_some_and(|phase| phase <= as_of)
    }

    /// Gets the first phase at which `location` was covered in `direction`.
    #[must_use]
    pub fn covered_at(&self, location: LocationId, direction: Direction) -> Option<Phase> {
        self.coverage[direction.index()].get(&location).copied()
    }

    /// Gets the frontier id of `location` as of the current phase.
    ///
    /// See [`Self::uncovered_signed_id_as_of`].
    #[must_use]
    pub fn uncovered_signed_id(&self, location: LocationId) -> SignedId {
        self.uncovered_signed_id_as_of(self.current_phase, location)
    }

    /// Gets the frontier id of `location` when exactly one direction is
    /// covered as of `as_of`.
    ///
    /// The id carries the sign of the single covered direction, so a location
    /// where only the left direction has been taken yields a negative id. The
    /// direction still to be reached is the [`SignedId::sibling`] of the
    /// result, and the guidance engines take their target in this form.
    ///
    /// Returns [`SignedId::NONE`] if both or neither directions are covered.
    #[must_use]
    pub fn uncovered_signed_id_as_of(&self, as_of: Phase, location: LocationId) -> SignedId {
        let left = self.is_covered(as_of, location, Direction::Left);
        let right = self.is_covered(as_of, location, Direction::Right);
        match (left, right) {
            (true, false) => location.signed(Direction::Left),
            (false, true) => location.signed(Direction::Right),
            _ => SignedId::NONE,
        }
    }

    /// Gets the frontier ids of every partially covered location as of
    /// `as_of`, in ascending order.
    #[must_use]
    pub fn frontier(&self, as_of: Phase) -> Vec<SignedId> {
        self.coverage
            .iter()
            .flat_map(HashMap::keys)
            .unique()
            .map(|location| self.uncovered_signed_id_as_of(as_of, *location))
            .filter(|sid| !sid.is_none())
            .sorted()
            .collect()
    }

    /// Gets the locations that became covered in both directions during
    /// `phase`.
    #[must_use]
    pub fn fully_covered_at(&self, phase: Phase) -> Option<&BTreeSet<LocationId>> {
        self.fully_covered.get(&phase)
    }
}

/// Structural queries.
impl ExecutionTree {
    /// Gets the root of the tree, if any trace has been replayed.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Gets the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Gets the node for `id` for modification, for recording the results of
    /// external analyses.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Gets the node for `id` if it exists in this tree.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Looks up the arena identifier of the node with the provided `guid`.
    #[must_use]
    pub fn node_by_guid(&self, guid: Guid) -> Option<NodeId> {
        self.guids.get_by_left(&guid).copied()
    }

    /// Gets the total number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Checks whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gets the number of nodes that had been discovered as of `as_of`.
    #[must_use]
    pub fn visible_node_count(&self, as_of: Phase) -> usize {
        self.visibility.floor_or(as_of, 0) as usize
    }

    /// Gets the phase used as the default for queries.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    /// Moves the default query phase to `phase`, for example to run guidance
    /// against the tree as it was at an earlier point in the campaign.
    pub fn set_current_phase(&mut self, phase: Phase) {
        self.current_phase = phase;
    }

    /// Gets the child of `id` in `direction` if it exists and had been
    /// discovered as of `as_of`.
    #[must_use]
    pub fn visible_child(&self, id: NodeId, direction: Direction, as_of: Phase) -> Option<NodeId> {
        self.node(id)
            .child(direction)
            .filter(|child| self.node(*child).is_visible(as_of))
    }

    /// Gets the path from the root to `id`, inclusive at both ends.
    #[must_use]
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent() {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Gets the direction taken from `parent` to reach `child`, if `child` is
    /// a child of `parent`.
    #[must_use]
    pub fn direction_between(&self, parent: NodeId, child: NodeId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.node(parent).child(*direction) == Some(child))
    }

    /// Gets every node discovered as of `as_of` in depth-first pre-order,
    /// visiting left children before right children.
    #[must_use]
    pub fn depth_first(&self, as_of: Phase) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = self
            .root
            .filter(|root| self.node(*root).is_visible(as_of))
            .into_iter()
            .collect();

        while let Some(id) = stack.pop() {
            order.push(id);
            for direction in [Direction::Right, Direction::Left] {
                if let Some(child) = self.visible_child(id, direction, as_of) {
                    stack.push(child);
                }
            }
        }

        order
    }
}

impl Default for ExecutionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about a single call to [`ExecutionTree::replay`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ReplaySummary {
    /// The phase that was replayed.
    pub phase: Phase,

    /// The number of non-empty traces that were replayed.
    pub traces: usize,

    /// The total number of records across those traces.
    pub records: usize,

    /// The number of nodes created by the replay.
    pub new_nodes: usize,

    /// The number of (location, direction) pairs covered for the first time.
    pub newly_covered: usize,

    /// The number of locations that became covered in both directions.
    pub newly_fully_covered: usize,
}

impl ReplaySummary {
    /// Constructs an empty summary for `phase`.
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }
}
