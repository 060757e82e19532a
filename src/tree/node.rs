//! This module contains the definition of the [`Node`] type, a single branch
//! occurrence in the historical execution tree, along with the per-phase
//! attributes that are recorded for it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    data::timeline::Timeline,
    tree::{
        location::{Direction, LocationId, SignedId},
        Guid,
        Phase,
    },
};

/// The index of a node in the arena owned by the
/// [`crate::tree::ExecutionTree`].
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Constructs a node identifier for the arena slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`u32::MAX`], which would mean the tree holds
    /// more nodes than can be addressed.
    #[must_use]
    pub fn new(index: usize) -> Self {
        let index = index
            .try_into()
            .unwrap_or_else(|_| panic!("Node count should not exceed {}", u32::MAX));
        Self(index)
    }

    /// Gets the arena slot that this identifier refers to.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What is known about the edge from a node in a given direction.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ChildLabel {
    /// No trace has taken this direction.
    #[default]
    NotVisited,

    /// A trace took this direction and then terminated with an exception.
    EndExceptional,

    /// A trace took this direction and then terminated normally.
    EndNormal,

    /// A trace took this direction and continued to another branch.
    Visited,
}

impl ChildLabel {
    /// Gets the position of the label in the upgrade order.
    ///
    /// Both terminal labels share a rank, so neither replaces the other.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            ChildLabel::NotVisited => 0,
            ChildLabel::EndExceptional | ChildLabel::EndNormal => 1,
            ChildLabel::Visited => 2,
        }
    }

    /// Checks whether a descent may still pass through or stop at this edge.
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, ChildLabel::NotVisited | ChildLabel::Visited)
    }
}

/// The kinds of per-node analysis whose first application is recorded.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum AnalysisKind {
    Bitshare,
    LocalSearch,
    Bitflip,
    SensitivityApplied,
}

impl AnalysisKind {
    /// All analysis kinds.
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Bitshare,
        AnalysisKind::LocalSearch,
        AnalysisKind::Bitflip,
        AnalysisKind::SensitivityApplied,
    ];

    fn slot(self) -> usize {
        match self {
            AnalysisKind::Bitshare => 0,
            AnalysisKind::LocalSearch => 1,
            AnalysisKind::Bitflip => 2,
            AnalysisKind::SensitivityApplied => 3,
        }
    }
}

/// A node in the execution tree.
///
/// The structural data of a node (its identity, position and links) never
/// changes once it is created. Everything learned about the node afterwards is
/// recorded in [`Timeline`]s so that the tree can be inspected as it was at
/// any earlier phase of the campaign.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    guid: Guid,
    parent: Option<NodeId>,
    children: [Option<NodeId>; 2],
    location: LocationId,

    /// The position of this node within the trace that discovered it, which
    /// is also its depth in the tree.
    trace_index: u32,
    input_bytes: u32,

    /// The global creation ordinal of the node.
    discovery_index: u32,
    discovery_phase: Phase,

    child_labels: [Timeline<ChildLabel>; 2],
    best_value: Timeline<f64>,
    hit_count: Timeline<u32>,
    sensitive_bits: Timeline<BTreeSet<u32>>,

    /// The first phase at which each [`AnalysisKind`] ran, indexed by
    /// [`AnalysisKind::slot`].
    watermarks: [Option<Phase>; 4],
    closed: Option<Phase>,
}

impl Node {
    /// Constructs a new node discovered at `phase`.
    #[allow(clippy::too_many_arguments)] // Mirrors the data carried by a trace record
    #[must_use]
    pub fn new(
        guid: Guid,
        parent: Option<NodeId>,
        location: LocationId,
        initial_best_value: f64,
        trace_index: u32,
        input_bytes: u32,
        phase: Phase,
        discovery_index: u32,
    ) -> Self {
        Self {
            guid,
            parent,
            children: [None, None],
            location,
            trace_index,
            input_bytes,
            discovery_index,
            discovery_phase: phase,
            child_labels: [Timeline::new(), Timeline::new()],
            best_value: Timeline::starting_at(phase, initial_best_value),
            hit_count: Timeline::new(),
            sensitive_bits: Timeline::new(),
            watermarks: [None; 4],
            closed: None,
        }
    }

    /// Gets the globally-unique identifier assigned by the instrumented target.
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// Gets the parent of this node, or [`None`] for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Gets the child in `direction`, if one has been discovered.
    #[must_use]
    pub fn child(&self, direction: Direction) -> Option<NodeId> {
        self.children[direction.index()]
    }

    /// Records `child` as the child in `direction`.
    pub(crate) fn set_child(&mut self, direction: Direction, child: NodeId) {
        self.children[direction.index()] = Some(child);
    }

    /// Gets the branch location this node represents.
    #[must_use]
    pub fn location(&self) -> LocationId {
        self.location
    }

    /// Gets the signed identifier of taking `direction` at this node.
    #[must_use]
    pub fn signed_id(&self, direction: Direction) -> SignedId {
        self.location.signed(direction)
    }

    /// Gets the position of this node in its discovery trace.
    #[must_use]
    pub fn trace_index(&self) -> u32 {
        self.trace_index
    }

    /// Gets the input size of the trace that discovered this node.
    #[must_use]
    pub fn input_bytes(&self) -> u32 {
        self.input_bytes
    }

    /// Gets the global creation ordinal of this node.
    #[must_use]
    pub fn discovery_index(&self) -> u32 {
        self.discovery_index
    }

    /// Gets the phase in which this node was discovered.
    #[must_use]
    pub fn discovery_phase(&self) -> Phase {
        self.discovery_phase
    }

    /// Checks whether the node had been discovered as of `as_of`.
    #[must_use]
    pub fn is_visible(&self, as_of: Phase) -> bool {
        self.discovery_phase <= as_of
    }

    /// Gets the label of the edge in `direction` as of `as_of`.
    #[must_use]
    pub fn child_label(&self, as_of: Phase, direction: Direction) -> ChildLabel {
        self.child_labels[direction.index()].floor_or(as_of, ChildLabel::NotVisited)
    }

    /// Writes `label` for `direction` at `phase` without any ordering checks.
    pub fn set_child_label(&mut self, phase: Phase, direction: Direction, label: ChildLabel) {
        self.child_labels[direction.index()].set(phase, label);
    }

    /// Upgrades the label for `direction` at `phase` to `label` if it ranks
    /// above the label already in effect, leaving it untouched otherwise.
    pub fn update_child_label(&mut self, phase: Phase, direction: Direction, label: ChildLabel) {
        let previous = self.child_label(phase, direction);
        if label.rank() > previous.rank() {
            self.set_child_label(phase, direction, label);
        }
    }

    /// Checks whether exactly one direction had been taken from this node as
    /// of `as_of`.
    #[must_use]
    pub fn is_frontier(&self, as_of: Phase) -> bool {
        let left = self.child_label(as_of, Direction::Left) == ChildLabel::NotVisited;
        let right = self.child_label(as_of, Direction::Right) == ChildLabel::NotVisited;
        left != right
    }

    /// Gets the best (lowest) objective value observed at this node as of
    /// `as_of`.
    ///
    /// Nodes always have a value from their discovery phase onwards. Before
    /// that, the value is [`f64::INFINITY`].
    #[must_use]
    pub fn best_value(&self, as_of: Phase) -> f64 {
        self.best_value.floor_or(as_of, f64::INFINITY)
    }

    /// Records an observation of `value` at `phase`, keeping the minimum.
    pub fn update_best_value(&mut self, phase: Phase, value: f64) {
        let previous = self.best_value(phase);
        self.best_value.set(phase, value.min(previous));
    }

    /// Gets the number of times the node has been hit as of `as_of`.
    #[must_use]
    pub fn hit_count(&self, as_of: Phase) -> u32 {
        self.hit_count.floor_or(as_of, 0)
    }

    /// Counts one more hit at `phase`.
    pub fn increment_hit_count(&mut self, phase: Phase) {
        if let Some(count) = self.hit_count.at_mut(phase) {
            *count = count.saturating_add(1);
        } else {
            let seeded = self.hit_count(phase).saturating_add(1);
            self.hit_count.set(phase, seeded);
        }
    }

    /// Gets the input bits known to influence this branch as of `as_of`.
    #[must_use]
    pub fn sensitive_bits(&self, as_of: Phase) -> BTreeSet<u32> {
        self.sensitive_bits.floor_or(as_of, BTreeSet::new())
    }

    /// Replaces the sensitive bits of the node at `phase` with `bits`.
    pub fn set_sensitive_bits(&mut self, phase: Phase, bits: BTreeSet<u32>) {
        self.sensitive_bits.set(phase, bits);
    }

    /// Gets the first phase at which `kind` was applied to this node.
    #[must_use]
    pub fn watermark(&self, kind: AnalysisKind) -> Option<Phase> {
        self.watermarks[kind.slot()]
    }

    /// Checks whether `kind` had been applied to this node as of `as_of`.
    #[must_use]
    pub fn is_applied(&self, kind: AnalysisKind, as_of: Phase) -> bool {
        self.watermark(kind).is_some_and(|phase| phase <= as_of)
    }

    /// Records that `kind` was applied at `phase`.
    ///
    /// Only the earliest phase is retained, so repeating the write at the same
    /// or a later phase has no effect.
    pub fn set_applied(&mut self, kind: AnalysisKind, phase: Phase) {
        let slot = &mut self.watermarks[kind.slot()];
        *slot = Some(slot.map_or(phase, |existing| existing.min(phase)));
    }

    /// Gets the phase at which the node was closed to further analysis.
    #[must_use]
    pub fn closed_at(&self) -> Option<Phase> {
        self.closed
    }

    /// Checks whether the node had been closed as of `as_of`.
    #[must_use]
    pub fn is_closed(&self, as_of: Phase) -> bool {
        self.closed.is_some_and(|phase| phase <= as_of)
    }

    /// Closes the node at `phase`, keeping the earliest closing phase.
    pub fn set_closed(&mut self, phase: Phase) {
        self.closed = Some(self.closed.map_or(phase, |existing| existing.min(phase)));
    }
}
