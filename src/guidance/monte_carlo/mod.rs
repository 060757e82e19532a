//! This module contains the Monte Carlo guidance engine, which extrapolates
//! the shape of the paths that reach a frontier node in order to predict the
//! shape of a path that takes the frontier's untaken direction.

pub mod state;
pub mod statistics;

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::info;

use crate::{
    constant::{DEFAULT_MONTE_CARLO_METRIC, DEFAULT_MONTE_CARLO_TRACES_FILTER},
    error::guidance::{Error, Result},
    guidance::{
        descent::{descend, Choice, NodeEvaluator, ObservedCounts, Recommendation},
        monte_carlo::{state::State, statistics::Statistics},
        path::{keep_closest_input_use, CandidatePath},
    },
    tree::{
        location::{Direction, SignedId},
        node::{ChildLabel, NodeId},
        ExecutionTree,
        Phase,
    },
};

/// Creates a new Monte Carlo engine with the provided `config`.
#[must_use]
pub fn new(config: Config) -> MonteCarlo<state::Empty> {
    MonteCarlo {
        config,
        state: state::Empty,
    }
}

/// The Monte Carlo guidance engine.
///
/// # Enforcing Valid State Transitions
///
/// The engine moves from [`state::Empty`] to [`state::Targeted`] once it is
/// given a target, and from there to [`state::Computed`] once it has read the
/// tree. Node selection is only available in the computed state, so it is not
/// possible to select nodes from stale or missing statistics.
#[derive(Debug)]
pub struct MonteCarlo<S: State> {
    /// The configuration of the engine.
    config: Config,

    /// The internal state of the engine.
    state: S,
}

/// The operations available in all states.
impl<S: State> MonteCarlo<S> {
    /// Gets the configuration of the engine.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets an immutable reference to the current state of the engine.
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl MonteCarlo<state::Empty> {
    /// Selects the frontier that the engine should guide toward.
    ///
    /// The `target` is a frontier id as returned by
    /// [`ExecutionTree::uncovered_signed_id`]: it carries the sign of the
    /// covered direction, and the engine guides toward its sibling.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `target` is [`SignedId::NONE`].
    pub fn target(self, target: SignedId) -> Result<MonteCarlo<state::Targeted>> {
        if target.is_none() {
            return Err(Error::InvalidTarget { target });
        }

        Ok(MonteCarlo {
            config: self.config,
            state:  state::Targeted { target },
        })
    }
}

impl MonteCarlo<state::Targeted> {
    /// Gets the target of the engine.
    pub fn target(&self) -> SignedId {
        self.state.target
    }

    /// Derives the engine's statistics from `tree` as of its current phase.
    #[must_use]
    pub fn compute(self, tree: &ExecutionTree) -> MonteCarlo<state::Computed> {
        let target = self.state.target;
        let as_of = tree.current_phase();
        let paths = collect_paths(tree, target, as_of, &self.config);
        let statistics = Statistics::compute(tree, target, as_of, paths);

        info!(
            %target,
            as_of,
            paths = statistics.paths().len(),
            active = statistics.active().len(),
            extrapolated_consumptions = statistics.consumption_fits().len(),
            "Computed Monte Carlo statistics"
        );

        MonteCarlo {
            config: self.config,
            state:  state::Computed { statistics },
        }
    }
}

impl MonteCarlo<state::Computed> {
    /// Gets the target of the engine.
    pub fn target(&self) -> SignedId {
        self.state.statistics.target()
    }

    /// Gets the statistics derived by the last computation.
    pub fn statistics(&self) -> &Statistics {
        &self.state.statistics
    }

    /// Re-derives the statistics for the same target from `tree`, for example
    /// after further phases have been replayed into it.
    #[must_use]
    pub fn compute(self, tree: &ExecutionTree) -> MonteCarlo<state::Computed> {
        let target = self.target();
        self.retarget_unchecked(target).compute(tree)
    }

    /// Discards the computed statistics and selects a new `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `target` is [`SignedId::NONE`].
    pub fn retarget(self, target: SignedId) -> Result<MonteCarlo<state::Targeted>> {
        if target.is_none() {
            return Err(Error::InvalidTarget { target });
        }
        Ok(self.retarget_unchecked(target))
    }

    fn retarget_unchecked(self, target: SignedId) -> MonteCarlo<state::Targeted> {
        MonteCarlo {
            config: self.config,
            state:  state::Targeted { target },
        }
    }

    /// Selects the node and direction that a path with the objective `value`
    /// should take next in order to reach the untaken side of the target.
    ///
    /// The tree is read as of the phase at which the statistics were computed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the tree is empty, or if the descent reaches a node
    /// where no direction is open.
    pub fn select_node_for_value(
        &self,
        tree: &ExecutionTree,
        value: f64,
    ) -> Result<Recommendation> {
        let statistics = self.statistics();
        let expected = statistics
            .active()
            .iter()
            .map(|sid| (*sid, statistics.size_at(*sid, value)))
            .collect();
        let evaluator = DeficitEvaluator {
            statistics,
            value,
            expected,
            total: statistics.total_size_at(value),
        };

        descend(tree, statistics.as_of(), &evaluator)
    }
}

/// The metric used to order the candidate paths.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Metric {
    /// The best objective value seen at the terminal node.
    BestValue,

    /// The number of input bytes at the terminal node.
    InputSize,
}

impl Metric {
    /// Evaluates the metric for `node` as of `as_of`.
    #[must_use]
    pub fn evaluate(self, tree: &ExecutionTree, node: NodeId, as_of: Phase) -> f64 {
        let node = tree.node(node);
        match self {
            Self::BestValue => node.best_value(as_of),
            Self::InputSize => f64::from(node.input_bytes()),
        }
    }
}

/// The filter applied to the candidate paths before they are ordered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TracesFilter {
    /// Every path is kept.
    KeepAll,

    /// A single path is kept per terminal metric value, preferring paths whose
    /// length suggests they made the most use of their input.
    InputUse,
}

impl TracesFilter {
    /// Applies the filter to `paths`.
    #[must_use]
    pub fn apply(self, tree: &ExecutionTree, paths: Vec<CandidatePath>) -> Vec<CandidatePath> {
        match self {
            Self::KeepAll => paths,
            Self::InputUse => keep_closest_input_use(tree, paths),
        }
    }
}

/// The configuration for the Monte Carlo engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// The metric used to order the candidate paths.
    ///
    /// Defaults to [`DEFAULT_MONTE_CARLO_METRIC`].
    pub metric: Metric,

    /// The filter applied to the candidate paths.
    ///
    /// Defaults to [`DEFAULT_MONTE_CARLO_TRACES_FILTER`].
    pub traces_filter: TracesFilter,
}

impl Config {
    /// Sets the `metric` config parameter to `value`.
    #[must_use]
    pub fn with_metric(mut self, value: Metric) -> Self {
        self.metric = value;
        self
    }

    /// Sets the `traces_filter` config parameter to `value`.
    #[must_use]
    pub fn with_traces_filter(mut self, value: TracesFilter) -> Self {
        self.traces_filter = value;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric:        DEFAULT_MONTE_CARLO_METRIC,
            traces_filter: DEFAULT_MONTE_CARLO_TRACES_FILTER,
        }
    }
}

/// Collects the paths to every node at the target's location that has not yet
/// taken the untaken direction of the target, filtered and ordered per the
/// `config`.
fn collect_paths(
    tree: &ExecutionTree,
    target: SignedId,
    as_of: Phase,
    config: &Config,
) -> Vec<CandidatePath> {
    let Some(direction) = target.sibling().direction() else {
        return Vec::new();
    };
    let location = target.location();

    let candidates = tree
        .depth_first(as_of)
        .into_iter()
        .filter(|id| {
            let node = tree.node(*id);
            node.location() == location
                && node.child_label(as_of, direction) == ChildLabel::NotVisited
        })
        .map(|id| {
            let metric = config.metric.evaluate(tree, id, as_of);
            let objective = tree.node(id).best_value(as_of);
            CandidatePath::to(tree, id, metric, objective)
        })
        .collect();

    config
        .traces_filter
        .apply(tree, candidates)
        .into_iter()
        .sorted_by(|a, b| a.metric.total_cmp(&b.metric).then(a.len().cmp(&b.len())))
        .collect()
}

/// Scores directions by how far their occurrences lag behind the extrapolated
/// consumption curve at the node's depth.
struct DeficitEvaluator<'a> {
    statistics: &'a Statistics,
    value:      f64,

    /// The expected number of occurrences of each signed id.
    expected: BTreeMap<SignedId, f64>,

    /// The expected length of the path.
    total: f64,
}

impl NodeEvaluator for DeficitEvaluator<'_> {
    fn evaluate(
        &self,
        tree: &ExecutionTree,
        node: NodeId,
        direction: Direction,
        observed: &ObservedCounts,
    ) -> Choice {
        let node = tree.node(node);
        let sid = node.signed_id(direction);
        let expected = self.expected.get(&sid).copied().unwrap_or_default();
        let observed = observed.get(&sid).copied().unwrap_or_default() as f64;

        let trace_index = f64::from(node.trace_index());
        let position = trace_index.min(self.total) / self.total;
        let consumed = self.statistics.consumption_at(sid, self.value, position);

        Choice {
            deficit:   expected * consumed - observed,
            remaining: expected - observed,
            forced:    sid == self.statistics.goal() && trace_index >= self.total,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::guidance::Error,
        guidance::monte_carlo::{self, Config, Metric, TracesFilter},
        tree::{
            location::SignedId,
            trace::{Termination, Trace, TraceRecord},
            ExecutionTree,
        },
    };

    /// Two traces reach location 3 without taking its right direction, one
    /// directly and one through location 2, so its frontier id is `-3`.
    fn two_path_tree() -> anyhow::Result<ExecutionTree> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![
                Trace::new(
                    0,
                    vec![TraceRecord::new(1, true, 2, 5.0, 1), TraceRecord::new(3, false, 2, 5.0, 2)],
                    Termination::Normal,
                ),
                Trace::new(
                    1,
                    vec![
                        TraceRecord::new(1, false, 4, 2.0, 1),
                        TraceRecord::new(2, true, 4, 2.0, 3),
                        TraceRecord::new(3, false, 4, 2.0, 4),
                    ],
                    Termination::Normal,
                ),
            ],
        )?;
        Ok(tree)
    }

    #[test]
    fn targets_must_be_signed() {
        let result = monte_carlo::new(Config::default()).target(SignedId::NONE);
        assert_eq!(
            result.unwrap_err(),
            Error::InvalidTarget {
                target: SignedId::NONE,
            }
        );
    }

    #[test]
    fn paths_are_ordered_by_metric() -> anyhow::Result<()> {
        let tree = two_path_tree()?;
        assert_eq!(tree.frontier(0), vec![SignedId::new(-3), SignedId::new(2)]);
        let engine = monte_carlo::new(Config::default()).target(SignedId::new(-3))?.compute(&tree);
        let statistics = engine.statistics();
        assert_eq!(statistics.goal(), SignedId::new(3));

        let objectives: Vec<f64> = statistics.paths().iter().map(|p| p.objective).collect();
        assert_eq!(objectives, vec![2.0, 5.0]);
        assert_eq!(statistics.sizes()[&SignedId::new(3)], vec![1, 1]);
        assert_eq!(statistics.sizes()[&SignedId::new(-1)], vec![1, 0]);
        assert_eq!(statistics.sizes()[&SignedId::new(1)], vec![0, 1]);

        // Ordering by input size instead puts the direct path first.
        let engine = monte_carlo::new(Config::default().with_metric(Metric::InputSize))
            .target(SignedId::new(-3))?
            .compute(&tree);
        assert_eq!(engine.statistics().paths()[0].objective, 5.0);
        assert_eq!(engine.statistics().paths()[1].metric, 4.0);

        Ok(())
    }

    #[test]
    fn sizes_extrapolate_against_the_objective() -> anyhow::Result<()> {
        let tree = two_path_tree()?;
        let engine = monte_carlo::new(Config::default()).target(SignedId::new(-3))?.compute(&tree);
        let statistics = engine.statistics();

        assert!((statistics.size_at(SignedId::new(-1), 2.0) - 1.0).abs() < 1e-9);
        assert!((statistics.size_at(SignedId::new(1), 2.0)).abs() < 1e-9);
        assert!((statistics.total_size_at(2.0) - 3.0).abs() < 1e-9);
        assert!((statistics.total_size_at(5.0) - 2.0).abs() < 1e-9);

        let shares: f64 = statistics.frequencies_at(3.0).values().sum();
        assert!((shares - 1.0).abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn repeated_branches_extrapolate_their_consumption() -> anyhow::Result<()> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![
                Trace::new(
                    0,
                    vec![
                        TraceRecord::new(1, true, 4, 1.0, 1),
                        TraceRecord::new(1, true, 4, 1.0, 2),
                        TraceRecord::new(3, false, 4, 1.0, 3),
                    ],
                    Termination::Normal,
                ),
                Trace::new(
                    1,
                    vec![
                        TraceRecord::new(1, false, 4, 3.0, 1),
                        TraceRecord::new(2, true, 4, 3.0, 4),
                        TraceRecord::new(1, true, 4, 3.0, 5),
                        TraceRecord::new(1, true, 4, 3.0, 6),
                        TraceRecord::new(3, false, 4, 3.0, 7),
                    ],
                    Termination::Normal,
                ),
            ],
        )?;

        let engine = monte_carlo::new(Config::default()).target(SignedId::new(-3))?.compute(&tree);
        let statistics = engine.statistics();
        let repeated = SignedId::new(1);

        assert_eq!(statistics.consumptions()[0][&repeated], vec![(0.0, 0.5), (0.5, 1.0)]);
        assert_eq!(statistics.consumptions()[1][&repeated], vec![(0.5, 0.5), (0.75, 1.0)]);

        // Both paths take the branch twice, so it gets its own boundaries.
        let fit = statistics.consumption_fits()[&repeated];
        assert!((fit.start.c0 + 0.25).abs() < 1e-9);
        assert!((fit.start.c1 - 0.25).abs() < 1e-9);
        assert!((fit.end.c0 - 0.375).abs() < 1e-9);
        assert!((fit.end.c1 - 0.125).abs() < 1e-9);
        assert_eq!(statistics.consumption_fits().len(), 1);

        assert!((statistics.consumption_at(repeated, 1.0, 0.25) - 0.5).abs() < 1e-9);
        assert!((statistics.consumption_at(repeated, 3.0, 0.625) - 0.5).abs() < 1e-9);
        assert_eq!(statistics.consumption_at(repeated, 2.0, 0.1), 0.0);
        assert_eq!(statistics.consumption_at(repeated, 2.0, 0.7), 1.0);

        // Every other branch shares the default curve, which starts at the
        // mean first position.
        let default = statistics.consumption_fit(SignedId::new(2));
        assert_eq!(default, statistics.default_consumption());
        assert!((default.start.at(0.0) - 2.75 / 6.0).abs() < 1e-9);
        assert_eq!(default.end.at(0.0), 1.0);

        assert!((statistics.frequency_at(repeated, 1.0) - 2.0 / 3.0).abs() < 1e-9);
        assert!(statistics.frequency_at(SignedId::new(-1), 1.0).abs() < 1e-9);
        assert_eq!(statistics.frequency_at(SignedId::new(9), 1.0), 0.0);

        Ok(())
    }

    #[test]
    fn selection_follows_the_path_shape_for_the_value() -> anyhow::Result<()> {
        let tree = two_path_tree()?;
        let engine = monte_carlo::new(Config::default()).target(SignedId::new(-3))?.compute(&tree);

        let low = engine.select_node_for_value(&tree, 2.0)?;
        assert_eq!(low.guid, 4);
        assert_eq!(low.signed_id, SignedId::new(3));

        let high = engine.select_node_for_value(&tree, 5.0)?;
        assert_eq!(high.guid, 2);
        assert_eq!(high.signed_id, SignedId::new(3));

        Ok(())
    }

    #[test]
    fn input_use_filter_deduplicates_equal_metrics() -> anyhow::Result<()> {
        let mut tree = ExecutionTree::new();
        tree.replay(
            0,
            vec![
                Trace::new(
                    0,
                    vec![TraceRecord::new(1, true, 4, 1.0, 1), TraceRecord::new(3, false, 4, 1.0, 2)],
                    Termination::Normal,
                ),
                Trace::new(
                    1,
                    vec![
                        TraceRecord::new(1, false, 4, 1.0, 1),
                        TraceRecord::new(2, true, 4, 1.0, 3),
                        TraceRecord::new(3, false, 4, 1.0, 4),
                    ],
                    Termination::Normal,
                ),
            ],
        )?;

        let config = Config::default().with_traces_filter(TracesFilter::InputUse);
        let engine = monte_carlo::new(config).target(SignedId::new(-3))?.compute(&tree);

        // Every input is the same size, so the ideal length is two.
        assert_eq!(engine.statistics().paths().len(), 1);
        assert_eq!(engine.statistics().paths()[0].len(), 2);

        Ok(())
    }

    #[test]
    fn retargeting_discards_the_statistics() -> anyhow::Result<()> {
        let tree = two_path_tree()?;
        let engine = monte_carlo::new(Config::default())
            .target(SignedId::new(-3))?
            .compute(&tree)
            .retarget(SignedId::new(2))?
            .compute(&tree);

        assert_eq!(engine.target(), SignedId::new(2));
        assert_eq!(engine.statistics().goal(), SignedId::new(-2));
        assert_eq!(engine.statistics().paths().len(), 1);

        let engine = engine.compute(&tree);
        assert_eq!(engine.statistics().paths().len(), 1);

        Ok(())
    }
}
