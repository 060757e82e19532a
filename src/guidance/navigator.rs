//! This module contains the consumption-ratio guidance engine.
//!
//! Where the Monte Carlo engine models each branch direction in isolation, the
//! navigator models the two directions of each location against each other: it
//! learns how the visits to one direction are interleaved with the visits to
//! its sibling, and then uses the sibling's progress along a path to decide
//! when the other direction is due.

use std::collections::{BTreeMap, BTreeSet};

use derivative::Derivative;
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::{
    constant::{DEFAULT_NAVIGATOR_FILTER, DEFAULT_NAVIGATOR_METRIC, DEFICIT_TIE_EPSILON},
    error::guidance::{Error, Result},
    guidance::{
        descent::{descend, Choice, NodeEvaluator, ObservedCounts, Recommendation},
        fit::LinearFit,
        path::{keep_closest_input_use, CandidatePath},
    },
    tree::{
        location::{Direction, LocationId, SignedId},
        node::NodeId,
        ExecutionTree,
        Phase,
    },
};

/// The ascending relative positions at which each signed id occurs on a path.
pub type ConsumptionMap = BTreeMap<SignedId, Vec<f64>>;

/// The ratio used when nothing is known about how two directions interleave.
const EVEN_SPLIT: [f64; 3] = [1.0 / 3.0; 3];

/// The metric used to order the nodes selected by the navigator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NavigatorMetric {
    /// The best objective value seen at the node.
    BestValue,

    /// The number of input bytes at the node.
    InputSize,

    /// The number of the node's ancestors that share its location.
    HitCount,
}

impl NavigatorMetric {
    /// Evaluates the metric for the last node of `path` as of `as_of`.
    #[must_use]
    pub fn evaluate(self, tree: &ExecutionTree, path: &[NodeId], as_of: Phase) -> f64 {
        let Some((terminal, ancestors)) = path.split_last() else {
            return 0.0;
        };
        let node = tree.node(*terminal);

        match self {
            Self::BestValue => node.best_value(as_of),
            Self::InputSize => f64::from(node.input_bytes()),
            Self::HitCount => ancestors
                .iter()
                .filter(|id| tree.node(**id).location() == node.location())
                .count() as f64,
        }
    }
}

/// The sign of an objective value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sign {
    Negative,

    /// Zero counts as positive.
    Positive,
}

impl Sign {
    /// Checks whether `value` has this sign.
    #[must_use]
    pub fn matches(self, value: f64) -> bool {
        match self {
            Self::Negative => value < 0.0,
            Self::Positive => value >= 0.0,
        }
    }
}

/// A filter applied to the nodes selected by the navigator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeFilter {
    /// Every node is kept.
    KeepAll,

    /// Only nodes whose best objective value has the given sign are kept.
    Signed(Sign),

    /// A single node is kept per metric value, preferring nodes whose depth
    /// suggests they made the most use of their input.
    InputUse,
}

impl NodeFilter {
    /// Applies the filter to `paths`.
    #[must_use]
    pub fn apply(self, tree: &ExecutionTree, paths: Vec<CandidatePath>) -> Vec<CandidatePath> {
        match self {
            Self::KeepAll => paths,
            Self::Signed(sign) => {
                paths.into_iter().filter(|path| sign.matches(path.objective)).collect()
            }
            Self::InputUse => keep_closest_input_use(tree, paths),
        }
    }
}

/// The configuration for the navigator.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The metric used to order the selected nodes.
    ///
    /// Defaults to [`DEFAULT_NAVIGATOR_METRIC`].
    pub metric: NavigatorMetric,

    /// The filters applied to the selected nodes, in order.
    ///
    /// Defaults to a single [`DEFAULT_NAVIGATOR_FILTER`].
    pub filters: Vec<NodeFilter>,
}

impl Config {
    /// Sets the `metric` config parameter to `value`.
    #[must_use]
    pub fn with_metric(mut self, value: NavigatorMetric) -> Self {
        self.metric = value;
        self
    }

    /// Sets the `filters` config parameter to `value`.
    #[must_use]
    pub fn with_filters(mut self, value: Vec<NodeFilter>) -> Self {
        self.filters = value;
        self
    }

    /// Appends `value` to the `filters` config parameter.
    #[must_use]
    pub fn with_filter(mut self, value: NodeFilter) -> Self {
        self.filters.push(value);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric:  DEFAULT_NAVIGATOR_METRIC,
            filters: vec![DEFAULT_NAVIGATOR_FILTER],
        }
    }
}

/// What a single path shows about a single location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct IdInfo {
    /// The number of visits to each direction, indexed by
    /// [`Direction::index`].
    pub counts: [usize; 2],

    /// For each direction, the share of the sibling direction's visits that
    /// fall before, within, and after this direction's own span of visits.
    pub ratios: [[f64; 3]; 2],

    /// Whether the ratios were borrowed from other paths because this path
    /// does not visit both directions.
    pub borrowed: bool,
}

impl IdInfo {
    /// Builds the information for a location from the `left` and `right`
    /// positions of its visits on one path.
    ///
    /// If either direction is unvisited, the ratios are an even split and the
    /// entry is marked as borrowed.
    #[must_use]
    pub fn from_positions(left: &[f64], right: &[f64]) -> Self {
        let counts = [left.len(), right.len()];
        if left.is_empty() || right.is_empty() {
            return Self {
                counts,
                ratios: [EVEN_SPLIT; 2],
                borrowed: true,
            };
        }

        Self {
            counts,
            ratios: [span_ratios(left, right), span_ratios(right, left)],
            borrowed: false,
        }
    }
}

/// The fits of a location's statistics against the objective value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct IdExtra {
    /// The fit of the visit count for each direction.
    pub counts: [LinearFit; 2],

    /// The fit of each ratio bucket for each direction.
    pub ratios: [[LinearFit; 3]; 2],
}

impl IdExtra {
    /// Gets the expected number of visits to `direction` on a path with the
    /// objective `value`, clamped to be non-negative.
    #[must_use]
    pub fn expected_count(&self, direction: Direction, value: f64) -> f64 {
        self.counts[direction.index()].at(value).max(0.0)
    }

    /// Gets the expected before, within, and after ratios for `direction` at
    /// the objective `value`.
    ///
    /// The fitted ratios are clamped to be non-negative and renormalised. If
    /// every ratio clamps to zero, the split is even.
    #[must_use]
    pub fn ratios_at(&self, direction: Direction, value: f64) -> [f64; 3] {
        let raw = self.ratios[direction.index()].map(|fit| fit.at(value).max(0.0));
        let sum: f64 = raw.iter().sum();
        if sum > 0.0 {
            raw.map(|ratio| ratio / sum)
        } else {
            EVEN_SPLIT
        }
    }
}

/// The consumption-ratio guidance engine.
///
/// The engine holds no derived state until [`Self::compute`] is called, and
/// can be recomputed whenever the tree changes.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Navigator {
    config: Config,

    /// The frontier id that guidance is being computed for.
    target: SignedId,

    /// The phase as of which the tree was last read, if it has been.
    as_of: Option<Phase>,

    #[derivative(Debug = "ignore")]
    paths: Vec<CandidatePath>,

    #[derivative(Debug = "ignore")]
    consumptions: Vec<ConsumptionMap>,

    #[derivative(Debug = "ignore")]
    infos: Vec<BTreeMap<LocationId, IdInfo>>,

    extras: BTreeMap<LocationId, IdExtra>,
}

impl Navigator {
    /// Constructs a navigator that guides toward the untaken side of
    /// `target`.
    ///
    /// The `target` is a frontier id as returned by
    /// [`ExecutionTree::uncovered_signed_id`], carrying the sign of the
    /// covered direction.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `target` is [`SignedId::NONE`].
    pub fn new(config: Config, target: SignedId) -> Result<Self> {
        if target.is_none() {
            return Err(Error::InvalidTarget { target });
        }

        Ok(Self {
            config,
            target,
            as_of: None,
            paths: Vec::new(),
            consumptions: Vec::new(),
            infos: Vec::new(),
            extras: BTreeMap::new(),
        })
    }

    /// Derives the navigator's statistics from `tree` as of its current
    /// phase, replacing any that were derived before.
    pub fn compute(&mut self, tree: &ExecutionTree) {
        let as_of = tree.current_phase();
        let goal = self.goal();
        self.as_of = Some(as_of);
        self.paths = self.collect_paths(tree, as_of);
        self.consumptions =
            self.paths.iter().map(|path| consumption_map(tree, path, goal)).collect();
        self.infos = self.consumptions.iter().map(location_infos).collect();
        borrow_missing_ratios(&mut self.infos);
        self.extras = fit_extras(&self.paths, &self.infos);

        info!(
            target = %self.target,
            as_of,
            paths = self.paths.len(),
            locations = self.extras.len(),
            "Computed navigator statistics"
        );
    }

    /// Selects the node and direction that a path with the objective `value`
    /// should take next in order to reach the untaken side of the target.
    ///
    /// The tree is read as of the phase of the last [`Self::compute`]. Before
    /// the first computation it is read as of the tree's current phase, and
    /// every expectation is zero.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the tree is empty, or if the descent reaches a node
    /// where no direction is open.
    pub fn run(&self, tree: &ExecutionTree, value: f64) -> Result<Recommendation> {
        let evaluator = RatioEvaluator {
            navigator: self,
            value,
        };
        let as_of = self.as_of.unwrap_or_else(|| tree.current_phase());
        descend(tree, as_of, &evaluator)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn target(&self) -> SignedId {
        self.target
    }

    /// Gets the signed id of the untaken direction that guidance aims for.
    #[must_use]
    pub fn goal(&self) -> SignedId {
        self.target.sibling()
    }

    /// Gets the phase as of which the tree was last read, or [`None`] if it
    /// has not been computed yet.
    #[must_use]
    pub fn as_of(&self) -> Option<Phase> {
        self.as_of
    }

    /// Gets the paths to the selected nodes, in ascending metric order.
    #[must_use]
    pub fn paths(&self) -> &[CandidatePath] {
        &self.paths
    }

    #[must_use]
    pub fn consumptions(&self) -> &[ConsumptionMap] {
        &self.consumptions
    }

    #[must_use]
    pub fn infos(&self) -> &[BTreeMap<LocationId, IdInfo>] {
        &self.infos
    }

    #[must_use]
    pub fn extras(&self) -> &BTreeMap<LocationId, IdExtra> {
        &self.extras
    }

    /// Collects, filters, and orders the paths to every visible node at the
    /// target's location.
    fn collect_paths(&self, tree: &ExecutionTree, as_of: Phase) -> Vec<CandidatePath> {
        let location = self.target.location();
        let candidates: Vec<CandidatePath> = tree
            .depth_first(as_of)
            .into_iter()
            .filter(|id| tree.node(*id).location() == location)
            .map(|id| {
                let nodes = tree.path_to(id);
                let metric = self.config.metric.evaluate(tree, &nodes, as_of);
                let objective = tree.node(id).best_value(as_of);
                CandidatePath {
                    nodes,
                    metric,
                    objective,
                }
            })
            .collect();

        self.config
            .filters
            .iter()
            .fold(candidates, |paths, filter| filter.apply(tree, paths))
            .into_iter()
            .sorted_by(|a, b| {
                let a_index = tree.node(a.terminal()).trace_index();
                let b_index = tree.node(b.terminal()).trace_index();
                a.metric.total_cmp(&b.metric).then(a_index.cmp(&b_index))
            })
            .collect()
    }
}

/// Builds the consumption map of `path`, seeded with the `arrival` direction
/// at its end.
fn consumption_map(tree: &ExecutionTree, path: &CandidatePath, arrival: SignedId) -> ConsumptionMap {
    let denominator = f64::from(tree.node(path.terminal()).trace_index().max(1));
    let mut map = ConsumptionMap::new();

    for (parent, child) in path.nodes.iter().tuple_windows() {
        let node = tree.node(*parent);
        if let Some(direction) = tree.direction_between(*parent, *child) {
            let position = f64::from(node.trace_index()) / denominator;
            map.entry(node.signed_id(direction)).or_default().push(position);
        }
    }
    map.entry(arrival).or_default().push(1.0);

    map
}

/// Builds the per-location information for a single path.
///
/// Locations that only visit one direction are marked as borrowed, with an
/// even split standing in until [`borrow_missing_ratios`] runs.
fn location_infos(consumption: &ConsumptionMap) -> BTreeMap<LocationId, IdInfo> {
    let locations: BTreeSet<LocationId> = consumption.keys().map(|sid| sid.location()).collect();
    locations
        .into_iter()
        .map(|location| {
            let positions = |direction| {
                consumption
                    .get(&location.signed(direction))
                    .map_or(&[][..], Vec::as_slice)
            };
            let info =
                IdInfo::from_positions(positions(Direction::Left), positions(Direction::Right));
            (location, info)
        })
        .collect()
}

/// Replaces the ratios of borrowed entries with the average ratios of the
/// paths that visit both directions of the same location.
fn borrow_missing_ratios(infos: &mut [BTreeMap<LocationId, IdInfo>]) {
    let mut totals: BTreeMap<LocationId, ([[f64; 3]; 2], usize)> = BTreeMap::new();
    for (location, info) in infos.iter().flatten().filter(|(_, info)| !info.borrowed) {
        let (sum, count) = totals.entry(*location).or_default();
        for (direction, ratios) in info.ratios.iter().enumerate() {
            for (bucket, ratio) in ratios.iter().enumerate() {
                sum[direction][bucket] += ratio;
            }
        }
        *count += 1;
    }

    for (location, info) in infos.iter_mut().flatten().filter(|(_, info)| info.borrowed) {
        if let Some((sum, count)) = totals.get(location) {
            let count = *count as f64;
            info.ratios = sum.map(|ratios| ratios.map(|ratio| ratio / count));
        }
    }
}

/// Fits the counts and ratios of every location against the objective value.
///
/// Counts are fitted over every path, with paths that never reach a location
/// counting zero visits. Ratios are fitted over the paths that reach the
/// location.
fn fit_extras(
    paths: &[CandidatePath],
    infos: &[BTreeMap<LocationId, IdInfo>],
) -> BTreeMap<LocationId, IdExtra> {
    let locations: BTreeSet<LocationId> = infos.iter().flat_map(BTreeMap::keys).copied().collect();

    locations
        .into_iter()
        .map(|location| {
            let samples: Vec<(f64, Option<&IdInfo>)> = paths
                .iter()
                .zip(infos)
                .map(|(path, infos)| (path.objective, infos.get(&location)))
                .collect();

            let counts = Direction::ALL.map(|direction| {
                LinearFit::fit(samples.iter().map(|(objective, info)| {
                    let count = info.map_or(0, |info| info.counts[direction.index()]);
                    (*objective, count as f64)
                }))
            });
            let ratios = Direction::ALL.map(|direction| {
                [0usize, 1, 2].map(|bucket| {
                    LinearFit::fit(samples.iter().filter_map(|(objective, info)| {
                        info.map(|info| (*objective, info.ratios[direction.index()][bucket]))
                    }))
                })
            });

            (location, IdExtra { counts, ratios })
        })
        .collect()
}

/// Computes the share of the `sibling` positions that fall before, within,
/// and after the span of the `own` positions.
fn span_ratios(own: &[f64], sibling: &[f64]) -> [f64; 3] {
    let (Some(first), Some(last)) = (own.first(), own.last()) else {
        return EVEN_SPLIT;
    };
    if sibling.is_empty() {
        return EVEN_SPLIT;
    }

    let mut buckets = [0usize; 3];
    for position in sibling {
        let bucket = if position < first {
            0
        } else if position <= last {
            1
        } else {
            2
        };
        buckets[bucket] += 1;
    }

    let total = sibling.len() as f64;
    buckets.map(|count| count as f64 / total)
}

/// Scores directions by how far their visits lag behind what the sibling
/// direction's progress implies.
struct RatioEvaluator<'a> {
    navigator: &'a Navigator,
    value:     f64,
}

impl NodeEvaluator for RatioEvaluator<'_> {
    fn evaluate(
        &self,
        tree: &ExecutionTree,
        node: NodeId,
        direction: Direction,
        observed: &ObservedCounts,
    ) -> Choice {
        let node = tree.node(node);
        let sid = node.signed_id(direction);
        let extra = self.navigator.extras.get(&node.location()).copied().unwrap_or_default();

        let observed_own = observed.get(&sid).copied().unwrap_or_default() as f64;
        let observed_sibling = observed.get(&sid.sibling()).copied().unwrap_or_default() as f64;
        let expected_own = extra.expected_count(direction, self.value);
        let expected_sibling = extra.expected_count(direction.sibling(), self.value);

        let sibling_fraction = if expected_sibling > 0.0 {
            (observed_sibling / expected_sibling).min(1.0)
        } else {
            1.0
        };
        let [before, within, _] = extra.ratios_at(direction, self.value);
        let fraction = if within <= DEFICIT_TIE_EPSILON {
            if sibling_fraction >= before { 1.0 } else { 0.0 }
        } else {
            ((sibling_fraction - before) / within).clamp(0.0, 1.0)
        };

        Choice {
            deficit:   expected_own * fraction - observed_own,
            remaining: expected_own - observed_own,
            forced:    sid == self.navigator.goal() && observed_sibling >= expected_sibling,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        guidance::navigator::{
            span_ratios,
            Config,
            IdInfo,
            Navigator,
            NavigatorMetric,
            NodeFilter,
            Sign,
        },
        tree::{
            location::{LocationId, SignedId},
            trace::{Termination, Trace, TraceRecord},
            ExecutionTree,
        },
    };

    fn two_path_tree(direct_value: f64, indirect_value: f64) -> anyhow::Result<ExecutionTree> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![
                Trace::new(
                    0,
                    vec![
                        TraceRecord::new(1, true, 4, direct_value, 1),
                        TraceRecord::new(3, false, 4, direct_value, 2),
                    ],
                    Termination::Normal,
                ),
                Trace::new(
                    1,
                    vec![
                        TraceRecord::new(1, false, 4, indirect_value, 1),
                        TraceRecord::new(2, true, 4, indirect_value, 3),
                        TraceRecord::new(3, false, 4, indirect_value, 4),
                    ],
                    Termination::Normal,
                ),
            ],
        )?;
        Ok(tree)
    }

    #[test]
    fn ratios_split_sibling_visits_around_the_span() {
        assert_eq!(span_ratios(&[0.0, 0.25, 0.75], &[0.5]), [0.0, 1.0, 0.0]);

        let ratios = span_ratios(&[0.5], &[0.0, 0.25, 0.75]);
        assert!((ratios[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(ratios[1], 0.0);
        assert!((ratios[2] - 1.0 / 3.0).abs() < 1e-12);

        let info = IdInfo::from_positions(&[0.5], &[]);
        assert!(info.borrowed);
        assert_eq!(info.counts, [1, 0]);
    }

    #[test]
    fn loops_produce_interleaved_ratios() -> anyhow::Result<()> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![Trace::new(
                0,
                vec![
                    TraceRecord::new(1, true, 4, 1.0, 1),
                    TraceRecord::new(1, true, 4, 1.0, 2),
                    TraceRecord::new(1, false, 4, 1.0, 3),
                    TraceRecord::new(1, true, 4, 1.0, 4),
                    TraceRecord::new(3, false, 4, 1.0, 5),
                ],
                Termination::Normal,
            )],
        )?;

        let mut navigator = Navigator::new(
            Config::default().with_metric(NavigatorMetric::HitCount),
            SignedId::new(-3),
        )?;
        navigator.compute(&tree);

        assert_eq!(navigator.paths().len(), 1);
        assert_eq!(navigator.paths()[0].metric, 0.0);
        assert_eq!(
            navigator.consumptions()[0][&SignedId::new(1)],
            vec![0.0, 0.25, 0.75]
        );
        assert_eq!(navigator.consumptions()[0][&SignedId::new(3)], vec![1.0]);

        let info = navigator.infos()[0][&LocationId::new(1)];
        assert!(!info.borrowed);
        assert_eq!(info.counts, [1, 3]);
        assert_eq!(info.ratios[1], [0.0, 1.0, 0.0]);

        Ok(())
    }

    #[test]
    fn run_follows_the_path_shape_for_the_value() -> anyhow::Result<()> {
        let tree = two_path_tree(5.0, 2.0)?;
        let mut navigator = Navigator::new(Config::default(), SignedId::new(-3))?;
        navigator.compute(&tree);

        let objectives: Vec<f64> = navigator.paths().iter().map(|p| p.objective).collect();
        assert_eq!(objectives, vec![2.0, 5.0]);

        let low = navigator.run(&tree, 2.0)?;
        assert_eq!(low.guid, 4);
        assert_eq!(low.signed_id, SignedId::new(3));

        let high = navigator.run(&tree, 5.0)?;
        assert_eq!(high.guid, 2);

        Ok(())
    }

    #[test]
    fn uncomputed_navigators_read_the_current_phase() -> anyhow::Result<()> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![Trace::new(
                0,
                vec![TraceRecord::new(1, true, 4, 1.0, 1), TraceRecord::new(3, false, 4, 1.0, 2)],
                Termination::Normal,
            )],
        )?;
        tree.replay(
            1,
            vec![Trace::new(
                0,
                vec![TraceRecord::new(1, false, 4, 1.0, 1), TraceRecord::new(3, false, 4, 1.0, 3)],
                Termination::Normal,
            )],
        )?;

        let navigator = Navigator::new(Config::default(), SignedId::new(-3))?;
        assert_eq!(navigator.as_of(), None);

        // The left child of the root only exists from phase one onward.
        let recommendation = navigator.run(&tree, 1.0)?;
        assert_eq!(recommendation.guid, 3);
        assert_eq!(recommendation.signed_id, SignedId::new(3));

        Ok(())
    }

    #[test]
    fn signed_filters_keep_matching_objectives() -> anyhow::Result<()> {
        let tree = two_path_tree(5.0, -2.0)?;

        let mut negative = Navigator::new(
            Config::default().with_filter(NodeFilter::Signed(Sign::Negative)),
            SignedId::new(-3),
        )?;
        negative.compute(&tree);
        assert_eq!(negative.paths().len(), 1);
        assert_eq!(negative.paths()[0].objective, -2.0);

        let mut positive = Navigator::new(
            Config::default().with_filters(vec![NodeFilter::Signed(Sign::Positive)]),
            SignedId::new(-3),
        )?;
        positive.compute(&tree);
        assert_eq!(positive.paths().len(), 1);
        assert_eq!(positive.paths()[0].objective, 5.0);

        Ok(())
    }

    #[test]
    fn missing_directions_borrow_average_ratios() -> anyhow::Result<()> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![
                Trace::new(
                    0,
                    vec![
                        TraceRecord::new(1, true, 4, 1.0, 1),
                        TraceRecord::new(1, false, 4, 1.0, 2),
                        TraceRecord::new(3, false, 4, 1.0, 3),
                    ],
                    Termination::Normal,
                ),
                Trace::new(
                    1,
                    vec![
                        TraceRecord::new(1, false, 4, 2.0, 1),
                        TraceRecord::new(3, false, 4, 2.0, 4),
                    ],
                    Termination::Normal,
                ),
            ],
        )?;

        let mut navigator = Navigator::new(Config::default(), SignedId::new(-3))?;
        navigator.compute(&tree);
        assert_eq!(navigator.paths().len(), 2);

        let complete = navigator.infos()[0][&LocationId::new(1)];
        let borrowed = navigator.infos()[1][&LocationId::new(1)];
        assert!(!complete.borrowed);
        assert!(borrowed.borrowed);
        assert_eq!(borrowed.ratios, complete.ratios);
        assert_eq!(borrowed.counts, [1, 0]);

        Ok(())
    }
}
