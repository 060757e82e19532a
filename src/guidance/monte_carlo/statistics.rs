//! This module contains the statistics that the Monte Carlo engine derives from
//! the paths leading to its target, and the extrapolations fitted over them.

use std::collections::{BTreeMap, BTreeSet};

use derivative::Derivative;
use serde::Serialize;

use crate::{
    constant::{FIXED_CONSUMPTION_END, FIXED_CONSUMPTION_START, MIN_MULTI_POINT_CURVES},
    guidance::{
        fit::{LinearFit, SplitFit},
        path::CandidatePath,
    },
    tree::{location::SignedId, ExecutionTree, Phase},
};

/// The extrapolated span of relative positions over which a signed id's
/// occurrences are spread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConsumptionFit {
    /// The fit of the first occurrence's position against objective value.
    pub start: LinearFit,

    /// The fit of the last occurrence's position against objective value.
    pub end: LinearFit,
}

impl ConsumptionFit {
    /// Constructs a consumption fit that ignores the objective value.
    #[must_use]
    pub fn fixed(start: f64, end: f64) -> Self {
        Self {
            start: LinearFit::constant(start),
            end:   LinearFit::constant(end),
        }
    }

    /// Evaluates the fraction of occurrences consumed at relative position `x`
    /// along a path with the objective `value`.
    ///
    /// Both boundaries are clamped to `[0, 1]`. The fraction is zero before
    /// the start, one from the end onward, and linear in between.
    #[must_use]
    pub fn at(&self, value: f64, x: f64) -> f64 {
        let start = self.start.at(value).clamp(0.0, 1.0);
        let end = self.end.at(value).clamp(0.0, 1.0).max(start);

        if x < start {
            0.0
        } else if x >= end {
            1.0
        } else {
            (x - start) / (end - start)
        }
    }
}

/// Everything the Monte Carlo engine knows about the paths to its target.
///
/// The per-path tables are indexed in the same order as [`Self::paths`].
#[derive(Clone, Derivative, Serialize)]
#[derivative(Debug)]
pub struct Statistics {
    /// The frontier id that the statistics were gathered for.
    target: SignedId,

    /// The phase as of which the tree was read.
    as_of: Phase,

    #[derivative(Debug = "ignore")]
    paths: Vec<CandidatePath>,

    /// Every signed id that occurs on at least one path.
    active: BTreeSet<SignedId>,

    /// For each signed id, the relative positions of its occurrences on each
    /// path.
    #[derivative(Debug = "ignore")]
    samples: BTreeMap<SignedId, Vec<Vec<f64>>>,

    /// For each signed id, the number of its occurrences on each path.
    #[derivative(Debug = "ignore")]
    sizes: BTreeMap<SignedId, Vec<usize>>,

    /// For each path, the share of its occurrences taken by each active
    /// signed id.
    #[derivative(Debug = "ignore")]
    frequencies: Vec<BTreeMap<SignedId, f64>>,

    /// For each path, the cumulative consumption curve of each signed id that
    /// occurs on it.
    #[derivative(Debug = "ignore")]
    consumptions: Vec<BTreeMap<SignedId, Vec<(f64, f64)>>>,

    /// Size fits per signed id, with the total path length under
    /// [`SignedId::NONE`].
    size_fits: BTreeMap<SignedId, SplitFit>,

    frequency_fits: BTreeMap<SignedId, LinearFit>,

    /// Consumption fits for the signed ids with enough multi-point curves.
    consumption_fits: BTreeMap<SignedId, ConsumptionFit>,

    /// The consumption fit used by every other signed id.
    default_consumption: ConsumptionFit,
}

impl Statistics {
    /// Derives the statistics for the frontier id `target` from the already
    /// ordered `paths`, each of which arrives at the target's untaken side.
    #[must_use]
    pub fn compute(
        tree: &ExecutionTree,
        target: SignedId,
        as_of: Phase,
        paths: Vec<CandidatePath>,
    ) -> Self {
        let goal = target.sibling();
        let occurrences: Vec<Vec<SignedId>> =
            paths.iter().map(|path| path.occurrences(tree, goal)).collect();
        let active: BTreeSet<SignedId> = occurrences.iter().flatten().copied().collect();

        let mut samples: BTreeMap<SignedId, Vec<Vec<f64>>> = active
            .iter()
            .map(|sid| (*sid, vec![Vec::new(); paths.len()]))
            .collect();
        for (index, (path, sequence)) in paths.iter().zip(&occurrences).enumerate() {
            for (position, sid) in sequence.iter().enumerate() {
                if let Some(per_path) = samples.get_mut(sid) {
                    per_path[index].push(path.relative_position(position));
                }
            }
        }

        let sizes: BTreeMap<SignedId, Vec<usize>> = samples
            .iter()
            .map(|(sid, per_path)| (*sid, per_path.iter().map(Vec::len).collect()))
            .collect();

        let frequencies: Vec<BTreeMap<SignedId, f64>> = occurrences
            .iter()
            .enumerate()
            .map(|(index, sequence)| {
                let total = sequence.len().max(1) as f64;
                sizes
                    .iter()
                    .map(|(sid, counts)| (*sid, counts[index] as f64 / total))
                    .collect()
            })
            .collect();

        let consumptions: Vec<BTreeMap<SignedId, Vec<(f64, f64)>>> = (0..paths.len())
            .map(|index| {
                samples
                    .iter()
                    .filter(|(_, per_path)| !per_path[index].is_empty())
                    .map(|(sid, per_path)| (*sid, consumption_curve(&per_path[index])))
                    .collect()
            })
            .collect();

        let objectives: Vec<f64> = paths.iter().map(|path| path.objective).collect();

        let mut size_fits: BTreeMap<SignedId, SplitFit> = sizes
            .iter()
            .map(|(sid, counts)| {
                let points: Vec<(f64, f64)> = objectives
                    .iter()
                    .zip(counts)
                    .map(|(objective, count)| (*objective, *count as f64))
                    .collect();
                (*sid, SplitFit::fit(&points))
            })
            .collect();
        let total_points: Vec<(f64, f64)> = objectives
            .iter()
            .zip(&occurrences)
            .map(|(objective, sequence)| (*objective, sequence.len() as f64))
            .collect();
        size_fits.insert(SignedId::NONE, SplitFit::fit(&total_points));

        let frequency_fits = active
            .iter()
            .map(|sid| {
                let points = objectives
                    .iter()
                    .zip(&frequencies)
                    .map(|(objective, shares)| (*objective, shares[sid]));
                (*sid, LinearFit::fit(points))
            })
            .collect();

        let consumption_fits = samples
            .iter()
            .filter_map(|(sid, per_path)| {
                let multi_point: Vec<(f64, f64, f64)> = objectives
                    .iter()
                    .zip(per_path)
                    .filter(|(_, positions)| positions.len() >= 2)
                    .filter_map(|(objective, positions)| {
                        Some((*objective, *positions.first()?, *positions.last()?))
                    })
                    .collect();
                (multi_point.len() >= MIN_MULTI_POINT_CURVES).then(|| {
                    let fit = ConsumptionFit {
                        start: LinearFit::fit(multi_point.iter().map(|(v, s, _)| (*v, *s))),
                        end:   LinearFit::fit(multi_point.iter().map(|(v, _, e)| (*v, *e))),
                    };
                    (*sid, fit)
                })
            })
            .collect();

        let first_positions: Vec<f64> = samples
            .values()
            .flatten()
            .filter_map(|positions| positions.first().copied())
            .collect();
        let default_consumption = if first_positions.is_empty() {
            ConsumptionFit::fixed(FIXED_CONSUMPTION_START, FIXED_CONSUMPTION_END)
        } else {
            let mean = first_positions.iter().sum::<f64>() / first_positions.len() as f64;
            ConsumptionFit::fixed(mean, FIXED_CONSUMPTION_END)
        };

        Self {
            target,
            as_of,
            paths,
            active,
            samples,
            sizes,
            frequencies,
            consumptions,
            size_fits,
            frequency_fits,
            consumption_fits,
            default_consumption,
        }
    }

    /// Gets the frontier id that the statistics were gathered for.
    #[must_use]
    pub fn target(&self) -> SignedId {
        self.target
    }

    /// Gets the signed id of the untaken direction that the paths arrive at.
    #[must_use]
    pub fn goal(&self) -> SignedId {
        self.target.sibling()
    }

    /// Gets the phase as of which the tree was read.
    #[must_use]
    pub fn as_of(&self) -> Phase {
        self.as_of
    }

    /// Gets the candidate paths, in ascending metric order.
    #[must_use]
    pub fn paths(&self) -> &[CandidatePath] {
        &self.paths
    }

    /// Gets the signed ids that occur on at least one path.
    #[must_use]
    pub fn active(&self) -> &BTreeSet<SignedId> {
        &self.active
    }

    #[must_use]
    pub fn samples(&self) -> &BTreeMap<SignedId, Vec<Vec<f64>>> {
        &self.samples
    }

    #[must_use]
    pub fn sizes(&self) -> &BTreeMap<SignedId, Vec<usize>> {
        &self.sizes
    }

    #[must_use]
    pub fn frequencies(&self) -> &[BTreeMap<SignedId, f64>] {
        &self.frequencies
    }

    #[must_use]
    pub fn consumptions(&self) -> &[BTreeMap<SignedId, Vec<(f64, f64)>>] {
        &self.consumptions
    }

    #[must_use]
    pub fn size_fits(&self) -> &BTreeMap<SignedId, SplitFit> {
        &self.size_fits
    }

    #[must_use]
    pub fn frequency_fits(&self) -> &BTreeMap<SignedId, LinearFit> {
        &self.frequency_fits
    }

    #[must_use]
    pub fn consumption_fits(&self) -> &BTreeMap<SignedId, ConsumptionFit> {
        &self.consumption_fits
    }

    #[must_use]
    pub fn default_consumption(&self) -> &ConsumptionFit {
        &self.default_consumption
    }

    /// Gets the expected number of occurrences of `sid` on a path with the
    /// objective `value`, clamped to be non-negative.
    ///
    /// Passing [`SignedId::NONE`] gets the expected path length instead.
    #[must_use]
    pub fn size_at(&self, sid: SignedId, value: f64) -> f64 {
        self.size_fits.get(&sid).map_or(0.0, |fit| fit.at(value).max(0.0))
    }

    /// Gets the expected length of a path with the objective `value`, which is
    /// always at least one.
    #[must_use]
    pub fn total_size_at(&self, value: f64) -> f64 {
        self.size_at(SignedId::NONE, value).max(1.0)
    }

    /// Gets the expected share of occurrences for every active signed id at the
    /// objective `value`.
    ///
    /// The fitted shares are clamped to be non-negative and renormalised to sum
    /// to one. If every share clamps to zero, the shares are uniform.
    #[must_use]
    pub fn frequencies_at(&self, value: f64) -> BTreeMap<SignedId, f64> {
        let raw: BTreeMap<SignedId, f64> = self
            .frequency_fits
            .iter()
            .map(|(sid, fit)| (*sid, fit.at(value).max(0.0)))
            .collect();
        let sum: f64 = raw.values().sum();

        if sum > 0.0 {
            raw.into_iter().map(|(sid, share)| (sid, share / sum)).collect()
        } else {
            let uniform = 1.0 / raw.len().max(1) as f64;
            raw.into_keys().map(|sid| (sid, uniform)).collect()
        }
    }

    /// Gets the expected share of occurrences for `sid` at the objective
    /// `value`.
    #[must_use]
    pub fn frequency_at(&self, sid: SignedId, value: f64) -> f64 {
        self.frequencies_at(value).get(&sid).copied().unwrap_or_default()
    }

    /// Gets the consumption fit that applies to `sid`.
    #[must_use]
    pub fn consumption_fit(&self, sid: SignedId) -> &ConsumptionFit {
        self.consumption_fits.get(&sid).unwrap_or(&self.default_consumption)
    }

    /// Gets the expected fraction of the occurrences of `sid` that have been
    /// consumed by relative position `x` along a path with the objective
    /// `value`.
    #[must_use]
    pub fn consumption_at(&self, sid: SignedId, value: f64, x: f64) -> f64 {
        self.consumption_fit(sid).at(value, x)
    }
}

/// Builds the cumulative consumption polyline from the ascending `positions`
/// of a signed id's occurrences on one path.
fn consumption_curve(positions: &[f64]) -> Vec<(f64, f64)> {
    let count = positions.len() as f64;
    positions
        .iter()
        .enumerate()
        .map(|(index, position)| (*position, (index + 1) as f64 / count))
        .collect()
}

#[cfg(test)]
mod test {
    use crate::guidance::monte_carlo::statistics::{consumption_curve, ConsumptionFit};

    #[test]
    fn consumption_is_linear_between_the_boundaries() {
        let fit = ConsumptionFit::fixed(0.25, 0.75);
        assert_eq!(fit.at(0.0, 0.0), 0.0);
        assert_eq!(fit.at(0.0, 0.5), 0.5);
        assert_eq!(fit.at(0.0, 0.75), 1.0);
        assert_eq!(fit.at(0.0, 1.0), 1.0);
    }

    #[test]
    fn inverted_boundaries_collapse_to_a_step() {
        let fit = ConsumptionFit::fixed(0.6, 0.2);
        assert_eq!(fit.at(0.0, 0.59), 0.0);
        assert_eq!(fit.at(0.0, 0.6), 1.0);
    }

    #[test]
    fn curves_accumulate_to_one() {
        let curve = consumption_curve(&[0.0, 0.5, 1.0, 1.0]);
        assert_eq!(curve.len(), 4);
        assert_eq!(curve[0], (0.0, 0.25));
        assert_eq!(curve[3], (1.0, 1.0));
    }
}
