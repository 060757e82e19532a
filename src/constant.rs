//! This module contains constants that are needed throughout the codebase.

use crate::guidance::{
    monte_carlo::{Metric, TracesFilter},
    navigator::{NavigatorMetric, NodeFilter},
};

/// The phase at which a freshly-constructed execution tree places its "as of"
/// cursor.
pub const INITIAL_PHASE: u32 = 0;

/// The default metric used to order the candidate paths of the
/// [`crate::guidance::monte_carlo::MonteCarlo`] engine.
pub const DEFAULT_MONTE_CARLO_METRIC: Metric = Metric::BestValue;

/// The default filter applied to the candidate paths of the
/// [`crate::guidance::monte_carlo::MonteCarlo`] engine.
pub const DEFAULT_MONTE_CARLO_TRACES_FILTER: TracesFilter = TracesFilter::KeepAll;

/// The default metric used to order the nodes selected by the
/// [`crate::guidance::navigator::Navigator`].
pub const DEFAULT_NAVIGATOR_METRIC: NavigatorMetric = NavigatorMetric::BestValue;

/// The default filter applied to the nodes selected by the
/// [`crate::guidance::navigator::Navigator`].
pub const DEFAULT_NAVIGATOR_FILTER: NodeFilter = NodeFilter::KeepAll;

/// The minimum number of paths in which a branch must occur at least twice
/// before its consumption curve is extrapolated rather than defaulted.
pub const MIN_MULTI_POINT_CURVES: usize = 2;

/// The position along a trace at which the fallback consumption curve starts
/// when no occurrence data exists at all.
pub const FIXED_CONSUMPTION_START: f64 = 0.0;

/// The position along a trace at which every fallback consumption curve ends.
pub const FIXED_CONSUMPTION_END: f64 = 1.0;

/// Differences in deficit smaller than this are treated as ties by the greedy
/// descent.
pub const DEFICIT_TIE_EPSILON: f64 = 1e-9;
